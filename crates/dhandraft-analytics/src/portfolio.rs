//! Portfolio aggregation: totals, allocation breakdowns and per-holding gains.

use dhandraft_core::{Asset, AssetKind};
use serde::Serialize;

use crate::format::{round_dp, round_int};

/// Sums market value per key, keeping keys in first-seen order.
pub(crate) fn value_by<K, F>(assets: &[Asset], key: F) -> Vec<(K, f64)>
where
    K: PartialEq,
    F: Fn(&Asset) -> K,
{
    let mut groups: Vec<(K, f64)> = Vec::new();
    for asset in assets {
        let k = key(asset);
        let value = asset.market_value();
        match groups.iter_mut().find(|(existing, _)| *existing == k) {
            Some((_, total)) => *total += value,
            None => groups.push((k, value)),
        }
    }
    groups
}

pub fn total_value(assets: &[Asset]) -> f64 {
    assets.iter().map(Asset::market_value).sum()
}

pub fn total_cost(assets: &[Asset]) -> f64 {
    assets.iter().map(Asset::cost_basis).sum()
}

/// Share of market value held in equity; 0 for an empty or worthless portfolio.
pub fn equity_ratio(assets: &[Asset]) -> f64 {
    let total = total_value(assets);
    if total <= 0.0 {
        return 0.0;
    }
    let equity: f64 = assets
        .iter()
        .filter(|a| a.kind == AssetKind::Equity)
        .map(Asset::market_value)
        .sum();
    equity / total
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSlice {
    pub name: String,
    pub value: i64,
    pub percentage: f64,
}

fn slices(groups: Vec<(String, f64)>, total: f64) -> Vec<AllocationSlice> {
    groups
        .into_iter()
        .map(|(name, value)| AllocationSlice {
            name,
            value: round_int(value),
            percentage: if total > 0.0 {
                round_dp(value / total * 100.0, 1)
            } else {
                0.0
            },
        })
        .collect()
}

/// Value per asset type. Empty when the portfolio has no value.
pub fn allocation_by_type(assets: &[Asset]) -> Vec<AllocationSlice> {
    let total = total_value(assets);
    if total <= 0.0 {
        return Vec::new();
    }
    slices(value_by(assets, |a| a.kind.as_str().to_string()), total)
}

pub fn sector_diversification(assets: &[Asset]) -> Vec<AllocationSlice> {
    let total = total_value(assets);
    slices(value_by(assets, |a| a.sector.clone()), total)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Volatility {
    High,
    Moderate,
    Low,
    #[serde(rename = "N/A")]
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDetail {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub sector: String,
    pub quantity: i64,
    pub buy_price: f64,
    pub current_price: f64,
    pub current_value: i64,
    pub cost_basis: i64,
    pub gain: i64,
    pub gain_pct: f64,
}

impl From<&Asset> for AssetDetail {
    fn from(asset: &Asset) -> Self {
        let current_value = asset.market_value();
        let cost_basis = asset.cost_basis();
        let gain = current_value - cost_basis;
        Self {
            id: asset.id.clone(),
            name: asset.name.clone(),
            symbol: asset.symbol.clone(),
            kind: asset.kind,
            sector: asset.sector.clone(),
            quantity: asset.quantity,
            buy_price: asset.buy_price,
            current_price: asset.current_price,
            current_value: round_int(current_value),
            cost_basis: round_int(cost_basis),
            gain: round_int(gain),
            gain_pct: if cost_basis > 0.0 {
                round_dp(gain / cost_basis * 100.0, 2)
            } else {
                0.0
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_value: i64,
    pub total_cost: i64,
    pub total_gain: i64,
    pub gain_pct: f64,
    pub allocation: Vec<AllocationSlice>,
    pub sector_diversification: Vec<AllocationSlice>,
    pub volatility: Volatility,
    pub assets: Vec<AssetDetail>,
}

pub fn summarize(assets: &[Asset]) -> PortfolioSummary {
    if assets.is_empty() {
        return PortfolioSummary {
            total_value: 0,
            total_cost: 0,
            total_gain: 0,
            gain_pct: 0.0,
            allocation: Vec::new(),
            sector_diversification: Vec::new(),
            volatility: Volatility::NotApplicable,
            assets: Vec::new(),
        };
    }

    let value = total_value(assets);
    let cost = total_cost(assets);
    let gain = value - cost;
    let ratio = equity_ratio(assets);
    let volatility = if ratio > 0.7 {
        Volatility::High
    } else if ratio > 0.4 {
        Volatility::Moderate
    } else {
        Volatility::Low
    };

    PortfolioSummary {
        total_value: round_int(value),
        total_cost: round_int(cost),
        total_gain: round_int(gain),
        gain_pct: if cost > 0.0 {
            round_dp(gain / cost * 100.0, 2)
        } else {
            0.0
        },
        allocation: slices(value_by(assets, |a| a.kind.as_str().to_string()), value),
        sector_diversification: sector_diversification(assets),
        volatility,
        assets: assets.iter().map(AssetDetail::from).collect(),
    }
}

/// Heuristic 65..=100 rewarding FDs, equity and breadth of asset types.
pub fn tax_optimization_score(assets: &[Asset]) -> u32 {
    let mut score = 65;
    if assets.iter().any(|a| a.kind == AssetKind::FixedDeposit) {
        score += 10;
    }
    if assets.iter().any(|a| a.kind == AssetKind::Equity) {
        score += 10;
    }
    let mut kinds: Vec<AssetKind> = assets.iter().map(|a| a.kind).collect();
    kinds.sort_by_key(|k| k.as_str());
    kinds.dedup();
    if kinds.len() >= 3 {
        score += 15;
    }
    score.min(100)
}
