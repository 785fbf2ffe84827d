use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        rejection::QueryRejection,
        Query, State,
    },
    response::Response,
};
use dhandraft_core::User;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{authenticate, close_unauthorized, WsAuth};
use crate::state::AppState;

/// `GET /api/ws/alerts?token=<jwt>`
pub async fn alerts_ws(
    ws: WebSocketUpgrade,
    query: Result<Query<WsAuth>, QueryRejection>,
    State(state): State<AppState>,
) -> Response {
    let auth = WsAuth::from_query(query);
    ws.on_upgrade(move |socket| async move {
        match authenticate(&state, &auth).await {
            Some(user) => handle_alert_socket(socket, state, user).await,
            None => close_unauthorized(socket).await,
        }
    })
}

async fn handle_alert_socket(socket: WebSocket, state: AppState, user: User) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let conn_id = state.alert_hub.connect(&user.id, tx);
    state.metrics.alert_sockets.inc();
    info!(user_id = %user.id, %conn_id, "alert socket connected");

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(frame) = outbound else { break };
                if sender.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!(error = %err, "alert socket read failed");
                        break;
                    }
                }
            }
        }
    }

    state.alert_hub.disconnect(&user.id, conn_id);
    state.metrics.alert_sockets.dec();
    info!(user_id = %user.id, %conn_id, "alert socket closed");
}
