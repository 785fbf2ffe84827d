use axum::extract::State;
use dhandraft_core::{ChatMessage, Database};

use crate::{auth::AuthUser, error::ApiResult, response::ApiResponse, state::AppState};

const FEED_LIMIT: usize = 50;

/// The newest `limit` chat messages, oldest first.
pub async fn recent_chat(db: &Database, limit: usize) -> dhandraft_core::Result<Vec<ChatMessage>> {
    let mut messages = db.community_chat().all().await?;
    messages.sort_by_key(|m| m.timestamp);
    let start = messages.len().saturating_sub(limit);
    Ok(messages.split_off(start))
}

pub async fn messages(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<ApiResponse<Vec<ChatMessage>>> {
    Ok(ApiResponse::ok(recent_chat(&state.db, FEED_LIMIT).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn returns_latest_messages_oldest_first() {
        let db = Database::in_memory();
        let now = Utc::now();
        let messages: Vec<ChatMessage> = (0..5)
            .map(|i| ChatMessage {
                id: format!("m{i}"),
                user_id: "u1".into(),
                username: "Arjun Mehta".into(),
                message: format!("message {i}"),
                timestamp: now - Duration::minutes(10 - i),
            })
            .rev()
            .collect();
        db.community_chat().insert_many(&messages).await.unwrap();

        let recent = recent_chat(&db, 3).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m3", "m4"]);
        assert_eq!(recent_chat(&db, 50).await.unwrap().len(), 5);
    }
}
