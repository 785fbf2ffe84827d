use std::{net::SocketAddr, time::Duration};

use axum::http::{header, HeaderValue};
use axum_test::TestServer;
use chrono::Utc;
use dhandraft_api::{create_router, seed::seed_demo_data, AppState};
use dhandraft_core::{new_id, Settings, User};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{protocol::frame::coding::CloseCode, Message},
    MaybeTlsStream, WebSocketStream,
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn spawn_app() -> (SocketAddr, AppState) {
    let mut settings = Settings::default();
    settings.seed.demo_data = false;
    let state = AppState::in_memory(settings).unwrap();
    seed_demo_data(&state.db, &state.passwords, &state.settings.alerts)
        .await
        .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = create_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, state)
}

async fn demo_token(state: &AppState) -> String {
    let demo = state
        .db
        .find_user_by_email("demo@dhandraft.com")
        .await
        .unwrap()
        .unwrap();
    state.jwt.issue(&demo.id, &demo.email).unwrap()
}

async fn second_user_token(state: &AppState) -> String {
    let user = User {
        id: new_id(),
        name: "Priya Sharma".into(),
        email: "priya@example.com".into(),
        password: state.passwords.hash("secret").unwrap(),
        risk_personality: "Undetermined".into(),
        financial_health_score: 0,
        created_at: Utc::now(),
    };
    assert!(state.db.create_user(&user).await.unwrap());
    state.jwt.issue(&user.id, &user.email).unwrap()
}

async fn connect(addr: SocketAddr, path: &str) -> Socket {
    let (socket, _) = connect_async(format!("ws://{addr}{path}")).await.unwrap();
    socket
}

async fn next_message(socket: &mut Socket) -> Message {
    timeout(WAIT, socket.next())
        .await
        .expect("timed out waiting for frame")
        .expect("socket ended")
        .expect("socket error")
}

async fn next_frame(socket: &mut Socket) -> Value {
    loop {
        match next_message(socket).await {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn send_text(socket: &mut Socket, text: &str) {
    socket.send(Message::Text(text.to_owned().into())).await.unwrap();
}

async fn assert_closed_unauthorized(socket: &mut Socket) {
    match next_message(socket).await {
        Message::Close(Some(frame)) => {
            assert_eq!(frame.code, CloseCode::from(4001));
            assert_eq!(frame.reason.as_str(), "Unauthorized");
        }
        other => panic!("expected close frame, got {other:?}"),
    }
}

#[tokio::test]
async fn sockets_without_valid_token_are_closed() {
    let (addr, _) = spawn_app().await;

    for path in [
        "/api/ws/chat",
        "/api/ws/chat?token=",
        "/api/ws/chat?token=not-a-jwt",
        "/api/ws/chat?token=a&token=b",
        "/api/ws/alerts?token=a&token=b",
        "/api/ws/alerts?token=not-a-jwt",
    ] {
        let mut socket = connect(addr, path).await;
        assert_closed_unauthorized(&mut socket).await;
    }
}

#[tokio::test]
async fn chat_sends_history_then_validates_and_rate_limits() {
    let (addr, state) = spawn_app().await;
    let token = demo_token(&state).await;
    let mut socket = connect(addr, &format!("/api/ws/chat?token={token}")).await;

    let history = next_frame(&mut socket).await;
    assert_eq!(history["type"], "history");
    let messages = history["data"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["username"], "Arjun Mehta");

    // Blank messages are dropped without a reply.
    send_text(&mut socket, r#"{"message": "   "}"#).await;
    send_text(&mut socket, "not json").await;
    let error = next_frame(&mut socket).await;
    assert_eq!(error, json!({ "type": "error", "data": "Invalid message format." }));

    send_text(&mut socket, r#"{"message": "  Nifty looks strong today  "}"#).await;
    let accepted = next_frame(&mut socket).await;
    assert_eq!(accepted["type"], "message");
    assert_eq!(accepted["data"]["message"], "Nifty looks strong today");
    assert_eq!(accepted["data"]["username"], "Arjun Mehta");

    send_text(&mut socket, r#"{"message": "and again"}"#).await;
    let limited = next_frame(&mut socket).await;
    assert_eq!(
        limited,
        json!({ "type": "error", "data": "Rate limited. Wait 2 seconds." })
    );

    let stored = state.db.community_chat().all().await.unwrap();
    assert_eq!(stored.len(), 5);
    assert_eq!(state.metrics.chat_messages_rate_limited.get(), 1);
    assert_eq!(state.metrics.chat_messages_rejected.get(), 1);
}

#[tokio::test]
async fn chat_messages_reach_every_socket() {
    let (addr, state) = spawn_app().await;
    let demo = demo_token(&state).await;
    let other = second_user_token(&state).await;

    let mut first = connect(addr, &format!("/api/ws/chat?token={demo}")).await;
    let mut second = connect(addr, &format!("/api/ws/chat?token={other}")).await;
    assert_eq!(next_frame(&mut first).await["type"], "history");
    assert_eq!(next_frame(&mut second).await["type"], "history");
    assert_eq!(state.chat_hub.connection_count(), 2);

    send_text(&mut second, r#"{"message": "Buying the dip on INFY"}"#).await;
    for socket in [&mut first, &mut second] {
        let frame = next_frame(socket).await;
        assert_eq!(frame["type"], "message");
        assert_eq!(frame["data"]["username"], "Priya Sharma");
        assert_eq!(frame["data"]["message"], "Buying the dip on INFY");
    }

    first.close(None).await.unwrap();
    drop(first);
    timeout(WAIT, async {
        while state.chat_hub.connection_count() != 1 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("closed socket was not unregistered");
}

#[tokio::test]
async fn overlong_messages_are_dropped_and_limit_is_shared_per_user() {
    let (addr, state) = spawn_app().await;
    let token = demo_token(&state).await;
    let mut first = connect(addr, &format!("/api/ws/chat?token={token}")).await;
    let mut second = connect(addr, &format!("/api/ws/chat?token={token}")).await;
    assert_eq!(next_frame(&mut first).await["type"], "history");
    assert_eq!(next_frame(&mut second).await["type"], "history");

    let too_long = "x".repeat(501);
    let longest = "y".repeat(500);
    send_text(&mut first, &json!({ "message": too_long }).to_string()).await;
    send_text(&mut first, &json!({ "message": longest }).to_string()).await;

    // The 501-char frame produced nothing, so the next frame is the 500-char one.
    for socket in [&mut first, &mut second] {
        let frame = next_frame(socket).await;
        assert_eq!(frame["type"], "message");
        assert_eq!(frame["data"]["message"], longest.as_str());
    }

    send_text(&mut second, r#"{"message": "from my other tab"}"#).await;
    assert_eq!(
        next_frame(&mut second).await,
        json!({ "type": "error", "data": "Rate limited. Wait 2 seconds." })
    );
    assert_eq!(state.db.community_chat().all().await.unwrap().len(), 5);
}

#[tokio::test]
async fn message_sent_while_a_socket_connects_is_seen_once() {
    let (addr, state) = spawn_app().await;
    let demo = demo_token(&state).await;
    let other = second_user_token(&state).await;

    let mut sender = connect(addr, &format!("/api/ws/chat?token={demo}")).await;
    assert_eq!(next_frame(&mut sender).await["type"], "history");

    let mut joining = connect(addr, &format!("/api/ws/chat?token={other}")).await;
    send_text(&mut sender, r#"{"message": "Sensex at a record high"}"#).await;

    let history = next_frame(&mut joining).await;
    assert_eq!(history["type"], "history");
    let mut seen = history["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|m| m["message"] == "Sensex at a record high")
        .count();

    let echoed = next_frame(&mut sender).await;
    assert_eq!(echoed["data"]["message"], "Sensex at a record high");
    send_text(&mut joining, r#"{"message": "end of check"}"#).await;
    loop {
        let frame = next_frame(&mut joining).await;
        assert_eq!(frame["type"], "message");
        match frame["data"]["message"].as_str().unwrap() {
            "Sensex at a record high" => seen += 1,
            "end of check" => break,
            other => panic!("unexpected message {other}"),
        }
    }
    assert_eq!(seen, 1);
}

#[tokio::test]
async fn generated_alerts_are_pushed_to_alert_sockets() {
    let (addr, state) = spawn_app().await;
    let token = demo_token(&state).await;
    state.db.alerts().remove_where(|_| true).await.unwrap();

    let mut socket = connect(addr, &format!("/api/ws/alerts?token={token}")).await;
    timeout(WAIT, async {
        while state.alert_hub.connection_count() == 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("alert socket never registered");

    let api = TestServer::new(create_router(state.clone())).unwrap();
    let response = api
        .post("/api/alerts/generate")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        )
        .await;
    response.assert_status_ok();
    let created = response.json::<Value>()["data"]["alerts_created"]
        .as_u64()
        .unwrap();
    assert!(created > 0);

    let mut titles = Vec::new();
    for _ in 0..created {
        let frame = next_frame(&mut socket).await;
        assert_eq!(frame["type"], "new_alert");
        assert_eq!(frame["data"]["is_read"], false);
        titles.push(frame["data"]["title"].as_str().unwrap().to_string());
    }
    assert!(titles.contains(&"Reliance Energy Division Reports Strong Growth".to_string()));
    assert_eq!(state.metrics.alert_frames_delivered.get(), created);
}
