use axum::extract::State;
use dhandraft_analytics::{
    allocation_by_type, financial_health, format::round_int, risk_personality, sector_sentiment,
    tax_optimization_score, total_value, AllocationSlice, HealthScore, RiskProfile,
    SectorSentiment,
};
use serde::Serialize;

use super::markets::news_feed;
use crate::{auth::AuthUser, error::ApiResult, response::ApiResponse, state::AppState};

const SCAM_AWARENESS_SCORE: u32 = 85;
const DEFAULT_INSIGHT: &str =
    "Complete your portfolio setup to receive personalized AI insights.";

#[derive(Debug, Serialize)]
pub struct ScoreCard {
    pub score: u32,
    pub explanation: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewSummary {
    pub financial_health: HealthScore,
    pub risk_personality: RiskProfile,
    pub portfolio_allocation: Vec<AllocationSlice>,
    pub total_value: i64,
    pub prediction_accuracy: u32,
    pub tax_optimization: ScoreCard,
    pub scam_awareness: ScoreCard,
    pub ai_insight: String,
    pub sector_sentiment: Vec<SectorSentiment>,
}

/// Percentage of `correct` out of `total`, 0 when there is nothing to score.
pub(crate) fn accuracy(correct: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        round_int(correct as f64 / total as f64 * 100.0) as u32
    }
}

pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<OverviewSummary>> {
    let uid = user.id();
    let assets = state.db.assets().find(|a| a.user_id == uid).await?;
    let predictions = state.db.predictions().find(|p| p.user_id == uid).await?;
    let correct = predictions.iter().filter(|p| p.correct).count();

    let news = news_feed(&state.db).await?;
    let latest_advice = state
        .db
        .advisor_history()
        .find(|r| r.user_id == uid)
        .await?
        .into_iter()
        .max_by_key(|r| r.timestamp);

    Ok(ApiResponse::ok(OverviewSummary {
        financial_health: financial_health(&assets),
        risk_personality: risk_personality(&assets),
        portfolio_allocation: allocation_by_type(&assets),
        total_value: round_int(total_value(&assets)),
        prediction_accuracy: accuracy(correct, predictions.len()),
        tax_optimization: ScoreCard {
            score: tax_optimization_score(&assets),
            explanation: "Based on asset type diversity and tax-efficient instruments.",
        },
        scam_awareness: ScoreCard {
            score: SCAM_AWARENESS_SCORE,
            explanation: "Stay vigilant against online financial scams.",
        },
        ai_insight: latest_advice
            .map(|record| record.response.strategy)
            .unwrap_or_else(|| DEFAULT_INSIGHT.to_string()),
        sector_sentiment: sector_sentiment(&news),
    }))
}
