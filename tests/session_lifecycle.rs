//! End-to-end lifecycle against a mock interview service and a local
//! WebSocket server.

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use interview_session::channel::{ChannelPayload, ChannelState};
use interview_session::{
    HttpSessionService, RealtimeChannel, SessionConfig, SessionController, SessionError, SessionEvent,
    SessionPhase, WebSocketChannel,
};

const WAIT: Duration = Duration::from_secs(5);

/// What the WebSocket server observed for one connection
#[derive(Debug, PartialEq)]
enum ServerSeen {
    Path(String),
    ClientClosed,
}

/// Accepts connections, greets each one, and reports what it saw
async fn spawn_channel_server() -> (String, mpsc::UnboundedReceiver<ServerSeen>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let path_tx = tx.clone();
                let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                    let _ = path_tx.send(ServerSeen::Path(req.uri().path().to_string()));
                    Ok(resp)
                };
                let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback).await.unwrap();
                ws.send(Message::Text("Tell me about yourself.".into())).await.unwrap();
                while let Some(Ok(message)) = ws.next().await {
                    if message.is_close() {
                        let _ = tx.send(ServerSeen::ClientClosed);
                        break;
                    }
                }
            });
        }
    });

    (format!("ws://{}", addr), rx)
}

async fn next_event(events: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("event stream closed")
}

/// Skip phase changes and return the next channel or error event
async fn next_non_phase_event(events: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    loop {
        match next_event(events).await {
            SessionEvent::PhaseChanged { .. } => continue,
            other => return other,
        }
    }
}

fn config() -> SessionConfig {
    SessionConfig::new(
        "agent-1",
        "sk-test",
        "Python developer with one year of experience",
        "Data analyst",
    )
}

#[tokio::test]
async fn test_start_talk_and_cancel() {
    let service_mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/offer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "conversationId": "abc123" })))
        .expect(1)
        .mount(&service_mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/cancel"))
        .and(body_json(serde_json::json!({ "agentId": "agent-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "cancelled" })))
        .expect(1)
        .mount(&service_mock)
        .await;

    let (channel_url, mut server_seen) = spawn_channel_server().await;
    let service = HttpSessionService::new(service_mock.uri(), 5000).unwrap();
    let (channel, channel_events) = WebSocketChannel::new(&channel_url, 5000).unwrap();
    let channel = Arc::new(channel);
    let controller = Arc::new(SessionController::new(Arc::new(service), channel.clone()));
    let _pump = controller.spawn_channel_pump(channel_events);
    let mut events = controller.subscribe();

    controller.start_session(config()).await.unwrap();
    assert_eq!(controller.phase(), SessionPhase::Active);
    assert_eq!(controller.handle().unwrap().conversation_id, "abc123");

    assert_eq!(
        next_non_phase_event(&mut events).await,
        SessionEvent::ChannelOpened {
            conversation_id: "abc123".to_string()
        }
    );
    assert_eq!(
        next_non_phase_event(&mut events).await,
        SessionEvent::ChannelMessage {
            conversation_id: "abc123".to_string(),
            payload: ChannelPayload::Text("Tell me about yourself.".to_string()),
        }
    );
    assert_eq!(
        tokio::time::timeout(WAIT, server_seen.recv()).await.unwrap(),
        Some(ServerSeen::Path("/ws/abc123".to_string()))
    );

    controller.cancel_session().await.unwrap();
    assert_eq!(controller.phase(), SessionPhase::Idle);
    assert!(controller.handle().is_none());
    assert_eq!(channel.state(), ChannelState::Closed);
    assert_eq!(
        tokio::time::timeout(WAIT, server_seen.recv()).await.unwrap(),
        Some(ServerSeen::ClientClosed)
    );

    assert_eq!(
        controller.cancel_session().await,
        Err(SessionError::NoActiveSession)
    );
}

#[tokio::test]
async fn test_rejected_offer_opens_no_channel() {
    let service_mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/offer"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({ "error": "bad agent" })))
        .expect(1)
        .mount(&service_mock)
        .await;

    let (channel_url, mut server_seen) = spawn_channel_server().await;
    let service = HttpSessionService::new(service_mock.uri(), 5000).unwrap();
    let (channel, channel_events) = WebSocketChannel::new(&channel_url, 5000).unwrap();
    let channel = Arc::new(channel);
    let controller = Arc::new(SessionController::new(Arc::new(service), channel.clone()));
    let _pump = controller.spawn_channel_pump(channel_events);

    let result = controller.start_session(config()).await;

    assert_eq!(result, Err(SessionError::start_failed("bad agent")));
    assert_eq!(controller.phase(), SessionPhase::Idle);
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert!(server_seen.try_recv().is_err());
}

#[tokio::test]
async fn test_unreachable_service_fails_start() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let service = HttpSessionService::new(format!("http://{}", addr), 5000).unwrap();
    let (channel, _channel_events) = WebSocketChannel::new(&format!("ws://{}", addr), 5000).unwrap();
    let controller = SessionController::new(Arc::new(service), Arc::new(channel));

    let result = controller.start_session(config()).await;
    assert!(matches!(result, Err(SessionError::StartFailed { .. })));
    assert_eq!(controller.phase(), SessionPhase::Idle);

    // Nothing to cancel after a failed start
    assert_eq!(
        controller.cancel_session().await,
        Err(SessionError::NoActiveSession)
    );
}
