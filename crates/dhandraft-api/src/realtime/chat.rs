use std::{collections::HashSet, time::Duration};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        rejection::QueryRejection,
        Query, State,
    },
    response::Response,
};
use chrono::Utc;
use dhandraft_core::{new_id, ChatMessage, Database, User, MAX_DAYS};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, warn};

use super::{authenticate, close_unauthorized, encode, hub::Outbound, ChatFrame, WsAuth};
use crate::{handlers::community::recent_chat, state::AppState};

const INVALID_FORMAT: &str = "Invalid message format.";

#[derive(Debug, Deserialize)]
struct IncomingChat {
    #[serde(default)]
    message: String,
}

/// `GET /api/ws/chat?token=<jwt>`
pub async fn chat_ws(
    ws: WebSocketUpgrade,
    query: Result<Query<WsAuth>, QueryRejection>,
    State(state): State<AppState>,
) -> Response {
    let auth = WsAuth::from_query(query);
    ws.on_upgrade(move |socket| async move {
        match authenticate(&state, &auth).await {
            Some(user) => handle_chat_socket(socket, state, user).await,
            None => close_unauthorized(socket).await,
        }
    })
}

async fn handle_chat_socket(socket: WebSocket, state: AppState, user: User) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Registered before the history scan; live frames queue in `rx` until the
    // history frame is written, and any already in the history are skipped.
    let conn_id = state.chat_hub.connect(tx.clone());
    state.metrics.chat_sockets.inc();
    info!(user_id = %user.id, %conn_id, "chat socket connected");

    let history = match recent_chat(&state.db, state.settings.chat.history_limit).await {
        Ok(history) => history,
        Err(err) => {
            error!(error = %err, "failed to load chat history");
            Vec::new()
        }
    };
    let replayed: HashSet<String> = history
        .iter()
        .map(|msg| encode(&ChatFrame::Message(msg.clone())))
        .collect();
    let history_sent = sender
        .send(Message::Text(encode(&ChatFrame::History(history)).into()))
        .await
        .is_ok();

    while history_sent {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(frame) = outbound else { break };
                if replayed.contains(&frame) {
                    continue;
                }
                if sender.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        handle_incoming(&state, &user, &tx, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!(error = %err, "chat socket read failed");
                        break;
                    }
                }
            }
        }
    }

    state.chat_hub.disconnect(conn_id);
    state.metrics.chat_sockets.dec();
    info!(user_id = %user.id, %conn_id, "chat socket closed");
}

/// Validates, rate limits, persists and broadcasts one inbound chat frame.
/// Errors are reported only to the sending socket.
async fn handle_incoming(state: &AppState, user: &User, reply: &Outbound, raw: &str) {
    let incoming: IncomingChat = match serde_json::from_str(raw) {
        Ok(incoming) => incoming,
        Err(_) => {
            state.metrics.chat_messages_rejected.inc();
            let _ = reply.send(encode(&ChatFrame::Error(INVALID_FORMAT.to_string())));
            return;
        }
    };

    let text = incoming.message.trim();
    if text.is_empty() || text.chars().count() > state.settings.chat.max_message_chars {
        return;
    }

    if !state.chat_limiter.check(&user.id) {
        state.metrics.chat_messages_rate_limited.inc();
        let notice = format!(
            "Rate limited. Wait {} seconds.",
            state.settings.chat.min_interval_secs
        );
        let _ = reply.send(encode(&ChatFrame::Error(notice)));
        return;
    }

    let record = ChatMessage {
        id: new_id(),
        user_id: user.id.clone(),
        username: user.name.clone(),
        message: text.to_string(),
        timestamp: Utc::now(),
    };
    if let Err(err) = state.db.community_chat().insert(&record).await {
        error!(error = %err, user_id = %user.id, "failed to store chat message");
        return;
    }

    state.metrics.chat_messages_accepted.inc();
    let delivered = state.chat_hub.broadcast(&encode(&ChatFrame::Message(record)));
    debug!(user_id = %user.id, delivered, "chat message broadcast");
}

/// Deletes chat messages older than `retention_days`. Non-positive or
/// out-of-range retention removes nothing.
pub async fn sweep_expired_chat(db: &Database, retention_days: i64) -> dhandraft_core::Result<usize> {
    let cutoff = (1..=MAX_DAYS)
        .contains(&retention_days)
        .then(|| Utc::now().checked_sub_signed(chrono::Duration::days(retention_days)))
        .flatten();
    let Some(cutoff) = cutoff else {
        warn!(retention_days, "chat retention out of range; sweep skipped");
        return Ok(0);
    };
    db.community_chat()
        .remove_where(|msg| msg.timestamp < cutoff)
        .await
}

/// Periodic chat retention sweep, which also drops idle rate-limiter state.
pub fn spawn_retention_sweeper(state: AppState) -> JoinHandle<()> {
    let period = Duration::from_secs(state.settings.chat.sweep_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match sweep_expired_chat(&state.db, state.settings.chat.retention_days).await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "expired chat messages swept"),
                Err(err) => warn!(error = %err, "chat retention sweep failed"),
            }
            state.chat_limiter.prune();
            state.api_limiter.prune();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn message(id: &str, age: ChronoDuration) -> ChatMessage {
        ChatMessage {
            id: id.into(),
            user_id: "u1".into(),
            username: "Arjun Mehta".into(),
            message: format!("message {id}"),
            timestamp: Utc::now() - age,
        }
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_messages() {
        let db = Database::in_memory();
        db.community_chat()
            .insert_many(&[
                message("old", ChronoDuration::days(31)),
                message("recent", ChronoDuration::days(29)),
                message("fresh", ChronoDuration::minutes(5)),
            ])
            .await
            .unwrap();

        assert_eq!(sweep_expired_chat(&db, 30).await.unwrap(), 1);
        let remaining: Vec<String> = db
            .community_chat()
            .all()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert!(!remaining.contains(&"old".to_string()));
        assert_eq!(remaining.len(), 2);
    }

    #[tokio::test]
    async fn sweep_ignores_out_of_range_retention() {
        let db = Database::in_memory();
        db.community_chat()
            .insert_many(&[
                message("old", ChronoDuration::days(400)),
                message("fresh", ChronoDuration::seconds(1)),
            ])
            .await
            .unwrap();

        for days in [-1, 0, MAX_DAYS + 1, 1_000_000_000, i64::MAX] {
            assert_eq!(sweep_expired_chat(&db, days).await.unwrap(), 0, "days = {days}");
        }
        assert_eq!(db.community_chat().all().await.unwrap().len(), 2);
    }

    #[test]
    fn incoming_frame_parsing() {
        let parsed: IncomingChat = serde_json::from_str(r#"{"message":"  hi  "}"#).unwrap();
        assert_eq!(parsed.message.trim(), "hi");
        let missing: IncomingChat = serde_json::from_str("{}").unwrap();
        assert!(missing.message.is_empty());
        assert!(serde_json::from_str::<IncomingChat>("not json").is_err());
        assert!(serde_json::from_str::<IncomingChat>(r#"{"message": 5}"#).is_err());
        assert!(serde_json::from_str::<IncomingChat>("[1,2]").is_err());
    }
}
