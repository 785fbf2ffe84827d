//! WebSocket alert fan-out and community chat.
//!
//! Each socket is split into a reader loop and a writer fed by an unbounded
//! channel registered in a hub. Broadcasting only enqueues, so a slow peer never
//! stalls the sender or other peers.

pub mod alerts;
pub mod chat;
pub mod hub;

use axum::extract::{
    rejection::QueryRejection,
    ws::{CloseFrame, Message, WebSocket},
    Query,
};
use dhandraft_core::{Alert, ChatMessage, User};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use alerts::alerts_ws;
pub use chat::{chat_ws, spawn_retention_sweeper, sweep_expired_chat};
pub use hub::{AlertHub, ChatHub};

use crate::{auth::resolve_user, state::AppState};

/// Close code sent when the `token` query parameter is missing or invalid.
pub const UNAUTHORIZED_CLOSE_CODE: u16 = 4001;

#[derive(Debug, Default, Deserialize)]
pub struct WsAuth {
    pub token: Option<String>,
}

impl WsAuth {
    /// An unparseable query string counts as a missing token, so the socket is
    /// still upgraded and then closed with [`UNAUTHORIZED_CLOSE_CODE`].
    pub(crate) fn from_query(query: Result<Query<WsAuth>, QueryRejection>) -> Self {
        match query {
            Ok(Query(auth)) => auth,
            Err(rejection) => {
                debug!(error = %rejection, "malformed websocket query");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum AlertFrame {
    NewAlert(Alert),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ChatFrame {
    History(Vec<ChatMessage>),
    Message(ChatMessage),
    Error(String),
}

/// Serializes a frame for the wire. Frames are plain data, so this cannot fail in practice.
pub(crate) fn encode<T: Serialize>(frame: &T) -> String {
    serde_json::to_string(frame).unwrap_or_default()
}

pub(crate) async fn authenticate(state: &AppState, auth: &WsAuth) -> Option<User> {
    let token = auth.token.as_deref().filter(|t| !t.is_empty())?;
    match resolve_user(state, token).await {
        Ok(user) => Some(user),
        Err(err) => {
            debug!(error = %err, "websocket authentication failed");
            None
        }
    }
}

pub(crate) async fn close_unauthorized(mut socket: WebSocket) {
    let frame = CloseFrame {
        code: UNAUTHORIZED_CLOSE_CODE,
        reason: "Unauthorized".into(),
    };
    let _ = socket.send(Message::Close(Some(frame))).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn frames_use_type_and_data_fields() {
        let error = encode(&ChatFrame::Error("Invalid message format.".into()));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&error).unwrap(),
            json!({"type": "error", "data": "Invalid message format."})
        );

        let history = encode(&ChatFrame::History(Vec::new()));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&history).unwrap(),
            json!({"type": "history", "data": []})
        );

        let message = ChatMessage {
            id: "m1".into(),
            user_id: "u1".into(),
            username: "Arjun Mehta".into(),
            message: "hello".into(),
            timestamp: Utc::now(),
        };
        let value: serde_json::Value =
            serde_json::from_str(&encode(&ChatFrame::Message(message))).unwrap();
        assert_eq!(value["type"], "message");
        assert_eq!(value["data"]["userId"], "u1");
    }
}
