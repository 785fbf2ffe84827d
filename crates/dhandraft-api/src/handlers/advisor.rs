use axum::extract::State;
use chrono::Utc;
use dhandraft_analytics::generate_advice;
use dhandraft_core::{new_id, Advice, AdvisorRecord};
use serde::Deserialize;

use crate::{
    auth::AuthUser, error::ApiResult, extract::ApiJson, response::ApiResponse, state::AppState,
};

const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct AdvisorQuery {
    pub query: String,
}

pub async fn analyze(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<AdvisorQuery>,
) -> ApiResult<ApiResponse<Advice>> {
    let uid = user.id();
    let assets = state.db.assets().find(|a| a.user_id == uid).await?;
    let advice = generate_advice(&assets);

    state
        .db
        .advisor_history()
        .insert(&AdvisorRecord {
            id: new_id(),
            user_id: uid.to_string(),
            query: req.query,
            response: advice.clone(),
            timestamp: Utc::now(),
        })
        .await?;

    Ok(ApiResponse::ok(advice))
}

pub async fn history(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<Vec<AdvisorRecord>>> {
    let uid = user.id();
    let mut records = state.db.advisor_history().find(|r| r.user_id == uid).await?;
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records.truncate(HISTORY_LIMIT);
    Ok(ApiResponse::ok(records))
}
