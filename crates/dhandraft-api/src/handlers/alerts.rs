use axum::extract::State;
use chrono::Utc;
use dhandraft_analytics::{analyze_sentiment, impact_score, Sentiment};
use dhandraft_core::{new_id, Alert, AlertsConfig, NewsItem, Severity};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{markets::news_feed, Pagination};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiQuery},
    realtime::{encode, AlertFrame},
    response::ApiResponse,
    state::AppState,
};

const DEFAULT_ALERT_PAGE: u64 = 50;

/// Why a news item deserves an alert.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NewsImpact {
    pub impact: u32,
    pub sentiment: Sentiment,
    pub severity: Severity,
}

/// `None` when the item's impact is below the alert threshold.
pub(crate) fn assess_news(item: &NewsItem, config: &AlertsConfig) -> Option<NewsImpact> {
    let impact = impact_score(&item.content);
    if impact < config.impact_threshold {
        return None;
    }
    Some(NewsImpact {
        impact,
        sentiment: analyze_sentiment(&item.content),
        severity: if impact >= config.high_severity_threshold {
            Severity::High
        } else {
            Severity::Medium
        },
    })
}

impl NewsImpact {
    pub(crate) fn into_alert(self, item: &NewsItem, explanation: String) -> Alert {
        Alert {
            id: new_id(),
            title: item.title.clone(),
            impact_score: self.impact,
            impacted_sectors: vec![item.sector.clone()],
            severity: self.severity,
            explanation,
            created_at: Utc::now(),
            is_read: false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AlertPage {
    pub alerts: Vec<Alert>,
    pub unread_count: usize,
    pub page: u64,
    pub total: usize,
    pub pages: u64,
}

pub async fn list_alerts(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<ApiResponse<AlertPage>> {
    let (page, limit) = pagination
        .resolve(DEFAULT_ALERT_PAGE)
        .map_err(ApiError::Validation)?;

    let mut alerts = state.db.alerts().all().await?;
    alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let total = alerts.len();
    let unread_count = alerts.iter().filter(|a| !a.is_read).count();
    let (alerts, pages) = Pagination::window(alerts, page, limit);

    Ok(ApiResponse::ok(AlertPage {
        alerts,
        unread_count,
        page,
        total,
        pages,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRead {
    pub alert_id: String,
}

pub async fn mark_read(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiJson(req): ApiJson<MarkRead>,
) -> ApiResult<ApiResponse<()>> {
    if state
        .db
        .alerts()
        .update(&req.alert_id, |a| a.is_read = true)
        .await?
        .is_none()
    {
        debug!(alert_id = %req.alert_id, "mark-read for unknown alert");
    }
    Ok(ApiResponse::message("Alert marked as read"))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<ApiResponse<()>> {
    state
        .db
        .alerts()
        .update_where(|a| !a.is_read, |a| a.is_read = true)
        .await?;
    Ok(ApiResponse::message("All alerts marked as read"))
}

#[derive(Debug, Serialize)]
pub struct GeneratedAlerts {
    pub alerts_created: usize,
}

/// Creates an alert for each high-impact news item not yet alerted on, and pushes it to every alert socket.
pub async fn generate(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<ApiResponse<GeneratedAlerts>> {
    let news = news_feed(&state.db).await?;
    let mut created = 0;

    for item in &news {
        let Some(assessment) = assess_news(item, &state.settings.alerts) else {
            continue;
        };
        let exists = state
            .db
            .alerts()
            .find_one(|a| a.title == item.title)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let explanation = format!(
            "{} sentiment detected in {} sector with {}% confidence.",
            assessment.sentiment.label.as_str(),
            item.sector,
            assessment.sentiment.confidence
        );
        let alert = assessment.into_alert(item, explanation);
        state.db.alerts().insert(&alert).await?;

        let delivered = state
            .alert_hub
            .broadcast_all(&encode(&AlertFrame::NewAlert(alert)));
        state.metrics.alerts_generated.inc();
        state.metrics.alert_frames_delivered.inc_by(delivered as u64);
        created += 1;
    }

    info!(created, "alerts generated from news");
    Ok(ApiResponse::with_message(
        GeneratedAlerts {
            alerts_created: created,
        },
        format!("Generated {created} new alerts"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn news(content: &str) -> NewsItem {
        NewsItem {
            id: "n1".into(),
            title: "Headline".into(),
            content: content.into(),
            sector: "Energy".into(),
            date: "2024-01-15".into(),
        }
    }

    #[test]
    fn strongly_positive_news_is_high_severity() {
        let item = news(
            "Reliance Industries energy division shows strong profit growth driven by robust demand and strategic expansion in green energy initiatives.",
        );
        let assessment = assess_news(&item, &AlertsConfig::default()).unwrap();
        assert_eq!(assessment.impact, 100);
        assert_eq!(assessment.severity, Severity::High);

        let alert = assessment.into_alert(&item, "x".into());
        assert_eq!(alert.impacted_sectors, vec!["Energy".to_string()]);
        assert!(!alert.is_read);
    }

    #[test]
    fn neutral_news_is_skipped() {
        assert!(assess_news(&news("Markets were open today."), &AlertsConfig::default()).is_none());
    }
}
