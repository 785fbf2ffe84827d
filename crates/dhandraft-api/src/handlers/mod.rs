pub mod advisor;
pub mod alerts;
pub mod auth;
pub mod community;
pub mod learn;
pub mod markets;
pub mod overview;
pub mod portfolio;
pub mod risk;

use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::state::AppState;

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": format!("DHAN-DRAFT API v{API_VERSION}"),
        "docs": "/docs",
        "health": "/health",
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": API_VERSION,
        "architecture": "modular",
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// `?page=&limit=` with page ≥ 1 and 1 ≤ limit ≤ 100.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl Pagination {
    pub const MAX_LIMIT: u64 = 100;

    /// Resolved `(page, limit)`, or the validation message for out-of-range values.
    pub fn resolve(&self, default_limit: u64) -> Result<(u64, u64), String> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(default_limit);
        if page < 1 {
            return Err("page must be greater than or equal to 1".to_string());
        }
        if !(1..=Self::MAX_LIMIT).contains(&limit) {
            return Err(format!("limit must be between 1 and {}", Self::MAX_LIMIT));
        }
        Ok((page, limit))
    }

    /// The slice of `items` for `page`, plus the total page count.
    pub fn window<T>(items: Vec<T>, page: u64, limit: u64) -> (Vec<T>, u64) {
        let total = items.len() as u64;
        let pages = total.div_ceil(limit);
        let skip = usize::try_from((page - 1).saturating_mul(limit)).unwrap_or(usize::MAX);
        let slice = items.into_iter().skip(skip).take(limit as usize).collect();
        (slice, pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_bounds() {
        let none = Pagination { page: None, limit: None };
        assert_eq!(none.resolve(20).unwrap(), (1, 20));
        assert!(Pagination { page: Some(0), limit: None }.resolve(20).is_err());
        assert!(Pagination { page: None, limit: Some(0) }.resolve(20).is_err());
        assert!(Pagination { page: None, limit: Some(101) }.resolve(20).is_err());
        assert_eq!(
            Pagination { page: Some(3), limit: Some(100) }.resolve(20).unwrap(),
            (3, 100)
        );
    }

    #[test]
    fn window_slices_pages() {
        let (items, pages) = Pagination::window((0..45).collect::<Vec<_>>(), 3, 20);
        assert_eq!(items, (40..45).collect::<Vec<_>>());
        assert_eq!(pages, 3);
        let (items, pages) = Pagination::window(Vec::<u8>::new(), 1, 20);
        assert!(items.is_empty());
        assert_eq!(pages, 0);
        let (items, _) = Pagination::window((0..5).collect::<Vec<_>>(), 9, 20);
        assert!(items.is_empty());
    }
}
