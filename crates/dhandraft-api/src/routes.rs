use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use dhandraft_core::CorsConfig;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{handlers, realtime, AppState};

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.cors);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/me", get(handlers::auth::me))
        // Overview
        .route("/overview/summary", get(handlers::overview::summary))
        // Learn
        .route("/learn/lessons", get(handlers::learn::list_lessons))
        .route("/learn/lessons/{lesson_id}", get(handlers::learn::get_lesson))
        .route("/learn/quiz/submit", post(handlers::learn::submit_quiz))
        .route("/learn/quiz/history", get(handlers::learn::quiz_history))
        .route("/learn/tax-compare", post(handlers::learn::tax_compare))
        .route("/learn/bank-rates", get(handlers::learn::bank_rates))
        // Markets
        .route("/markets/stocks", get(handlers::markets::list_stocks))
        .route("/markets/stocks/{symbol}", get(handlers::markets::stock_detail))
        .route("/markets/predict", post(handlers::markets::submit_prediction))
        .route("/markets/predictions", get(handlers::markets::list_predictions))
        .route("/markets/sentiment", get(handlers::markets::sentiment))
        .route("/markets/heatmap", get(handlers::markets::market_heatmap))
        // Portfolio & tax
        .route("/portfolio/assets", get(handlers::portfolio::list_assets))
        .route("/portfolio/summary", get(handlers::portfolio::summary))
        .route("/portfolio/add-asset", post(handlers::portfolio::add_asset))
        .route("/portfolio/tax/compare", post(handlers::portfolio::tax_compare))
        .route("/portfolio/tax/capital-gains", post(handlers::portfolio::tax_capital_gains))
        .route("/portfolio/tax/fd", post(handlers::portfolio::tax_fd))
        // Risk
        .route("/risk/transaction", post(handlers::risk::check_transaction))
        .route("/risk/fraud", post(handlers::risk::check_fraud))
        // Advisor
        .route("/advisor/analyze", post(handlers::advisor::analyze))
        .route("/advisor/history", get(handlers::advisor::history))
        // Alerts
        .route("/alerts", get(handlers::alerts::list_alerts))
        .route("/alerts/mark-read", post(handlers::alerts::mark_read))
        .route("/alerts/mark-all-read", post(handlers::alerts::mark_all_read))
        .route("/alerts/generate", post(handlers::alerts::generate))
        // Community
        .route("/community/messages", get(handlers::community::messages))
        // WebSockets
        .route("/ws/alerts", get(realtime::alerts_ws))
        .route("/ws/chat", get(realtime::chat_ws))
}

/// `*` allows any origin without credentials; an explicit list allows credentials.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    if config.allows_any() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
