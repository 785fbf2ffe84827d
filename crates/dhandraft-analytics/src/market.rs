//! Simulated market: price history, SMA direction calls, keyword sentiment.

use chrono::{Duration, NaiveDate};
use dhandraft_core::{Candle, Direction, NewsItem, Stock};
use serde::Serialize;

use crate::format::{round_dp, round_int};

const POSITIVE_KEYWORDS: [&str; 11] = [
    "growth", "profit", "surge", "rally", "bullish", "strong", "gain", "rise", "positive",
    "record", "high",
];

const NEGATIVE_KEYWORDS: [&str; 11] = [
    "fall", "crash", "bearish", "loss", "decline", "drop", "weak", "risk", "negative", "sell",
    "low",
];

pub const DEFAULT_HISTORY_DAYS: usize = 90;

/// Deterministic daily walk starting from `base_price`; the last candle is dated yesterday.
pub fn generate_stock_history(base_price: f64, days: usize, today: NaiveDate) -> Vec<Candle> {
    let mut price = base_price;
    (0..days)
        .map(|i| {
            let seed = ((i * 7 + 13) % 100) as i64;
            let change = (seed - 50) as f64 / 500.0;
            price *= 1.0 + change;

            let open = round_dp(price * (1.0 - change.abs() * 0.3), 2);
            let close = round_dp(price, 2);
            let high = round_dp(open.max(close) * 1.012, 2);
            let low = round_dp(open.min(close) * 0.988, 2);
            let date = today - Duration::days((days - i) as i64);

            Candle {
                date: date.format("%Y-%m-%d").to_string(),
                open,
                high,
                low,
                close,
                volume: 1_000_000 + seed as u64 * 50_000,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub direction: Direction,
    pub confidence: u32,
    pub explanation: String,
}

/// SMA5 vs SMA10 crossover confirmed by momentum over the last ten closes.
pub fn predict_direction(history: &[Candle]) -> Prediction {
    if history.len() < 5 {
        return Prediction {
            direction: Direction::Neutral,
            confidence: 50,
            explanation: "Insufficient data for analysis.".to_string(),
        };
    }

    let closes: Vec<f64> = history[history.len().saturating_sub(10)..]
        .iter()
        .map(|c| c.close)
        .collect();
    let sma5 = closes[closes.len() - 5..].iter().sum::<f64>() / 5.0;
    let sma10 = closes.iter().sum::<f64>() / closes.len() as f64;
    let first = closes[0];
    let last = closes[closes.len() - 1];
    let momentum = if first != 0.0 {
        (last - first) / first * 100.0
    } else {
        0.0
    };

    let (direction, confidence) = if sma5 > sma10 && momentum > 0.0 {
        (Direction::Up, (60.0 + momentum.abs() * 5.0).min(92.0))
    } else if sma5 < sma10 && momentum < 0.0 {
        (Direction::Down, (60.0 + momentum.abs() * 5.0).min(92.0))
    } else {
        (Direction::Neutral, 50.0)
    };

    Prediction {
        direction,
        confidence: round_int(confidence) as u32,
        explanation: format!(
            "SMA5 ({sma5:.2}) vs SMA10 ({sma10:.2}). Momentum: {momentum:.2}%."
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SentimentLabel {
    Bullish,
    Bearish,
    Neutral,
}

impl SentimentLabel {
    fn from_score(score: f64) -> Self {
        if score > 0.6 {
            SentimentLabel::Bullish
        } else if score < 0.4 {
            SentimentLabel::Bearish
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Bullish => "Bullish",
            SentimentLabel::Bearish => "Bearish",
            SentimentLabel::Neutral => "Neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sentiment {
    pub score: f64,
    pub label: SentimentLabel,
    pub confidence: u32,
}

/// Counts whitespace tokens containing a positive or negative keyword.
/// A token may count on both sides.
pub fn analyze_sentiment(text: &str) -> Sentiment {
    let lowered = text.to_lowercase();
    let (mut positive, mut negative) = (0u32, 0u32);
    for word in lowered.split_whitespace() {
        if POSITIVE_KEYWORDS.iter().any(|kw| word.contains(kw)) {
            positive += 1;
        }
        if NEGATIVE_KEYWORDS.iter().any(|kw| word.contains(kw)) {
            negative += 1;
        }
    }

    let total = positive + negative;
    if total == 0 {
        return Sentiment {
            score: 0.5,
            label: SentimentLabel::Neutral,
            confidence: 40,
        };
    }

    let score = positive as f64 / total as f64;
    Sentiment {
        score: round_dp(score, 2),
        label: SentimentLabel::from_score(score),
        confidence: (50 + total * 10).min(95),
    }
}

/// 0..=100: distance of sentiment from neutral plus a small boost for longer articles.
pub fn impact_score(content: &str) -> u32 {
    let sentiment = analyze_sentiment(content);
    let polarity = (sentiment.score - 0.5).abs() * 200.0;
    let words = content.split_whitespace().count() as f64;
    let boost = (words / 20.0).min(1.0) * 10.0;
    (round_int(polarity + boost) as u32).min(100)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorSentiment {
    pub sector: String,
    pub score: f64,
    pub label: SentimentLabel,
}

/// Mean article sentiment per sector, in the order sectors first appear.
pub fn sector_sentiment(news: &[NewsItem]) -> Vec<SectorSentiment> {
    let mut sectors: Vec<(String, Vec<f64>)> = Vec::new();
    for item in news {
        let score = analyze_sentiment(&item.content).score;
        match sectors.iter_mut().find(|(name, _)| *name == item.sector) {
            Some((_, scores)) => scores.push(score),
            None => sectors.push((item.sector.clone(), vec![score])),
        }
    }

    sectors
        .into_iter()
        .map(|(sector, scores)| {
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            SectorSentiment {
                sector,
                score: round_dp(mean, 2),
                label: SentimentLabel::from_score(mean),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatStock {
    pub symbol: String,
    pub name: String,
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorHeat {
    pub sector: String,
    pub stocks: Vec<HeatStock>,
    pub avg_change: f64,
}

/// Last day's move of a stock, falling back to the listed change without enough history.
pub fn daily_change(stock: &Stock) -> f64 {
    match stock.historical_data.as_slice() {
        [.., prev, last] if prev.close != 0.0 => (last.close - prev.close) / prev.close * 100.0,
        _ => stock.change,
    }
}

pub fn heatmap(stocks: &[Stock]) -> Vec<SectorHeat> {
    let mut sectors: Vec<SectorHeat> = Vec::new();
    for stock in stocks {
        let entry = HeatStock {
            symbol: stock.symbol.clone(),
            name: stock.name.clone(),
            change: round_dp(daily_change(stock), 2),
        };
        match sectors.iter_mut().find(|s| s.sector == stock.sector) {
            Some(sector) => sector.stocks.push(entry),
            None => sectors.push(SectorHeat {
                sector: stock.sector.clone(),
                stocks: vec![entry],
                avg_change: 0.0,
            }),
        }
    }

    for sector in &mut sectors {
        let sum: f64 = sector.stocks.iter().map(|s| s.change).sum();
        sector.avg_change = round_dp(sum / sector.stocks.len() as f64, 2);
    }
    sectors
}
