use axum::extract::{Path, State};
use chrono::Utc;
use dhandraft_analytics::{
    analyze_sentiment, heatmap, predict_direction, Prediction, SectorHeat, Sentiment,
};
use dhandraft_core::{new_id, Database, NewsItem, PredictionRecord, Stock};
use serde::{Deserialize, Serialize};

use super::{overview::accuracy, Pagination};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiQuery},
    response::ApiResponse,
    state::AppState,
};

/// News items considered by sentiment views and alert generation.
pub(crate) const NEWS_FEED_LIMIT: usize = 50;
const DEFAULT_PREDICTION_PAGE: u64 = 20;

pub(crate) async fn news_feed(db: &Database) -> dhandraft_core::Result<Vec<NewsItem>> {
    let mut news = db.news().all().await?;
    news.truncate(NEWS_FEED_LIMIT);
    Ok(news)
}

async fn find_stock(db: &Database, symbol: &str) -> ApiResult<Stock> {
    let symbol = symbol.to_uppercase();
    db.stocks()
        .find_one(|s| s.symbol == symbol)
        .await?
        .ok_or_else(|| ApiError::NotFound("Stock not found".to_string()))
}

pub async fn list_stocks(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<ApiResponse<Vec<Stock>>> {
    let stocks = state.db.stocks().all().await?;
    Ok(ApiResponse::ok(
        stocks.iter().map(Stock::without_history).collect(),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDetail {
    #[serde(flatten)]
    pub stock: Stock,
    pub ai_prediction: Prediction,
}

pub async fn stock_detail(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(symbol): Path<String>,
) -> ApiResult<ApiResponse<StockDetail>> {
    let stock = find_stock(&state.db, &symbol).await?;
    let ai_prediction = predict_direction(&stock.historical_data);
    Ok(ApiResponse::ok(StockDetail {
        stock,
        ai_prediction,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub stock_symbol: String,
    pub predicted_direction: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionOutcome {
    pub user_prediction: String,
    pub ai_prediction: Prediction,
    #[serde(rename = "match")]
    pub matched: bool,
    pub explanation: String,
}

pub async fn submit_prediction(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<PredictionRequest>,
) -> ApiResult<ApiResponse<PredictionOutcome>> {
    let stock = find_stock(&state.db, &req.stock_symbol).await?;
    let ai = predict_direction(&stock.historical_data);
    let matched = req.predicted_direction == ai.direction.as_str();

    let record = PredictionRecord {
        id: new_id(),
        user_id: user.id().to_string(),
        stock_symbol: stock.symbol.clone(),
        predicted_direction: req.predicted_direction.clone(),
        ai_direction: ai.direction,
        ai_confidence: ai.confidence,
        correct: matched,
        explanation: ai.explanation.clone(),
        timestamp: Utc::now(),
    };
    state.db.predictions().insert(&record).await?;

    Ok(ApiResponse::with_message(
        PredictionOutcome {
            user_prediction: req.predicted_direction,
            explanation: ai.explanation.clone(),
            ai_prediction: ai,
            matched,
        },
        "Prediction recorded",
    ))
}

#[derive(Debug, Serialize)]
pub struct PredictionPage {
    pub predictions: Vec<PredictionRecord>,
    pub accuracy: u32,
    pub total: usize,
    pub correct: usize,
    pub page: u64,
    pub pages: u64,
}

pub async fn list_predictions(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<ApiResponse<PredictionPage>> {
    let (page, limit) = pagination
        .resolve(DEFAULT_PREDICTION_PAGE)
        .map_err(ApiError::Validation)?;

    let uid = user.id();
    let mut predictions = state.db.predictions().find(|p| p.user_id == uid).await?;
    predictions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let total = predictions.len();
    let correct = predictions.iter().filter(|p| p.correct).count();
    let (predictions, pages) = Pagination::window(predictions, page, limit);

    Ok(ApiResponse::ok(PredictionPage {
        predictions,
        accuracy: accuracy(correct, total),
        total,
        correct,
        page,
        pages,
    }))
}

#[derive(Debug, Serialize)]
pub struct NewsSentiment {
    #[serde(flatten)]
    pub news: NewsItem,
    pub sentiment_analysis: Sentiment,
}

pub async fn sentiment(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<ApiResponse<Vec<NewsSentiment>>> {
    let news = news_feed(&state.db).await?;
    Ok(ApiResponse::ok(
        news.into_iter()
            .map(|news| NewsSentiment {
                sentiment_analysis: analyze_sentiment(&news.content),
                news,
            })
            .collect(),
    ))
}

pub async fn market_heatmap(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<ApiResponse<Vec<SectorHeat>>> {
    let stocks = state.db.stocks().all().await?;
    Ok(ApiResponse::ok(heatmap(&stocks)))
}
