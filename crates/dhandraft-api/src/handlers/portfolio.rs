use axum::extract::State;
use dhandraft_analytics::{
    capital_gains, compare, fd_tax, financial_health, summarize, CapitalGains,
    CapitalGainsInput, FdTax, FdTaxInput, HealthScore, PortfolioSummary, TaxComparison,
    TaxCompareInput,
};
use dhandraft_core::{new_id, Asset, AssetKind};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    extract::ApiJson,
    response::ApiResponse,
    state::AppState,
};

async fn user_assets(state: &AppState, user_id: &str) -> ApiResult<Vec<Asset>> {
    Ok(state.db.assets().find(|a| a.user_id == user_id).await?)
}

pub async fn list_assets(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<Vec<Asset>>> {
    Ok(ApiResponse::ok(user_assets(&state, user.id()).await?))
}

pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<PortfolioSummary>> {
    let assets = user_assets(&state, user.id()).await?;
    Ok(ApiResponse::ok(summarize(&assets)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAssetRequest {
    pub symbol: String,
    pub quantity: i64,
    pub buy_price: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedAsset {
    pub asset: Asset,
    pub updated_health: HealthScore,
}

/// Buys a listed stock into the caller's portfolio and refreshes their health score.
pub async fn add_asset(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<AddAssetRequest>,
) -> ApiResult<ApiResponse<AddedAsset>> {
    let symbol = req.symbol.to_uppercase();
    let stock = state
        .db
        .stocks()
        .find_one(|s| s.symbol == symbol)
        .await?
        .ok_or_else(|| ApiError::NotFound("Stock not found in our dataset".to_string()))?;

    if req.quantity <= 0 {
        return Err(ApiError::BadRequest("Quantity must be positive".to_string()));
    }
    if req.buy_price <= 0.0 {
        return Err(ApiError::BadRequest("Buy price must be positive".to_string()));
    }

    let asset = Asset {
        id: new_id(),
        user_id: user.id().to_string(),
        name: stock.name,
        symbol: stock.symbol,
        kind: AssetKind::Equity,
        sector: stock.sector,
        quantity: req.quantity,
        buy_price: req.buy_price,
        current_price: stock.current_price,
    };
    state.db.assets().insert(&asset).await?;

    let assets = user_assets(&state, user.id()).await?;
    let health = financial_health(&assets);
    let score = health.score;
    state
        .db
        .users()
        .update(user.id(), move |u| u.financial_health_score = score)
        .await?;
    info!(user_id = %user.id(), symbol = %asset.symbol, quantity = asset.quantity, "asset added");

    let message = format!("Added {} shares of {}", asset.quantity, asset.symbol);
    Ok(ApiResponse::with_message(
        AddedAsset {
            asset,
            updated_health: health,
        },
        message,
    ))
}

pub async fn tax_compare(
    _user: AuthUser,
    ApiJson(input): ApiJson<TaxCompareInput>,
) -> ApiResponse<TaxComparison> {
    ApiResponse::ok(compare(&input))
}

pub async fn tax_capital_gains(
    _user: AuthUser,
    ApiJson(input): ApiJson<CapitalGainsInput>,
) -> ApiResponse<CapitalGains> {
    ApiResponse::ok(capital_gains(
        input.buy_price,
        input.sell_price,
        input.quantity,
        input.holding_months,
        &input.asset_type,
    ))
}

pub async fn tax_fd(_user: AuthUser, ApiJson(input): ApiJson<FdTaxInput>) -> ApiResponse<FdTax> {
    ApiResponse::ok(fd_tax(
        input.principal,
        input.rate,
        input.years,
        input.tax_bracket,
    ))
}
