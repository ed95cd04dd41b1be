//! WebSocket Realtime Channel
//!
//! One connection at a time, addressed as `{channel_url}/ws/{key}`. The
//! handshake and the read loop run on a background task; everything the
//! connection does is reported through an unbounded event channel.
//!
//! Each connection gets a fresh [`ConnectionId`]. Once a connection has been
//! disconnected (or superseded) its task can no longer report anything, so a
//! late message from a torn-down session never reaches the consumer.

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use super::error::ChannelError;
use super::state::{ChannelEvent, ChannelEventKind, ChannelPayload, ChannelState, ConnectionId};
use super::transport::RealtimeChannel;

/// Receiving half of a channel's event stream
pub type ChannelEvents = mpsc::UnboundedReceiver<ChannelEvent>;

/// Close code reported when the local side disconnects
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code reported when the connection ended without a close frame
pub const CLOSE_ABNORMAL: u16 = 1006;

/// How long a disconnected connection gets to send its close frame
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// State shared between the adapter and its connection task
#[derive(Default)]
struct ChannelInner {
    state: ChannelState,
    live: Option<LiveConnection>,
}

struct LiveConnection {
    id: ConnectionId,
    key: String,
    /// Close switch - send to make the task close the socket
    close_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

/// tokio-tungstenite backed [`RealtimeChannel`]
pub struct WebSocketChannel {
    /// `ws://` or `wss://` root the `/ws/{key}` path is appended to
    base_url: Url,
    connect_timeout_ms: u64,
    inner: Arc<Mutex<ChannelInner>>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    next_id: AtomicU64,
}

impl WebSocketChannel {
    /// Create a channel and the receiver its events are delivered to
    pub fn new(channel_url: &str, connect_timeout_ms: u64) -> Result<(Self, ChannelEvents), ChannelError> {
        let base_url = Url::parse(channel_url)?;
        if !matches!(base_url.scheme(), "ws" | "wss") {
            return Err(ChannelError::InvalidEndpoint(format!(
                "expected ws:// or wss:// URL, got {}",
                base_url
            )));
        }
        if base_url.cannot_be_a_base() {
            return Err(ChannelError::InvalidEndpoint(base_url.to_string()));
        }

        let (events, rx) = mpsc::unbounded_channel();
        let channel = Self {
            base_url,
            connect_timeout_ms,
            inner: Arc::new(Mutex::new(ChannelInner::default())),
            events,
            next_id: AtomicU64::new(1),
        };
        Ok((channel, rx))
    }

    /// Endpoint for a session key: `{base}/ws/{key}`
    pub fn endpoint_for(&self, key: &str) -> Result<Url, ChannelError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ChannelError::InvalidEndpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .push("ws")
            .push(key);
        Ok(url)
    }

    fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn emit(&self, event: ChannelEvent) {
        if self.events.send(event).is_err() {
            debug!("Channel event receiver dropped");
        }
    }
}

impl RealtimeChannel for WebSocketChannel {
    fn connect(&self, key: &str) -> ConnectionId {
        let id = self.next_connection_id();
        let mut inner = self.inner.lock();

        if let Some(live) = &inner.live {
            if live.key == key {
                debug!("Channel already connected for {}, reusing {}", key, live.id);
                return live.id;
            }
            warn!("Refusing to connect {}: {} is live for {}", key, live.id, live.key);
            let err = ChannelError::AlreadyConnected(live.key.clone());
            self.emit(ChannelEvent::new(id, ChannelEventKind::Error(err.to_string())));
            return id;
        }

        let url = match self.endpoint_for(key) {
            Ok(url) => url,
            Err(e) => {
                error!("Cannot connect channel for {}: {}", key, e);
                self.emit(ChannelEvent::new(id, ChannelEventKind::Error(e.to_string())));
                return id;
            }
        };

        info!("Connecting channel {} to {}", id, url);
        let (close_tx, close_rx) = oneshot::channel();
        let task = tokio::spawn(run_connection(
            ConnectionTask {
                id,
                url,
                connect_timeout_ms: self.connect_timeout_ms,
                inner: self.inner.clone(),
                events: self.events.clone(),
            },
            close_rx,
        ));

        inner.state = ChannelState::Connecting;
        inner.live = Some(LiveConnection {
            id,
            key: key.to_string(),
            close_tx: Some(close_tx),
            task: Some(task),
        });
        id
    }

    fn disconnect(&self) {
        let mut inner = self.inner.lock();
        let Some(mut live) = inner.live.take() else {
            debug!("Disconnect requested with no live channel");
            return;
        };

        info!("Disconnecting channel {} ({})", live.id, live.key);
        if let Some(tx) = live.close_tx.take() {
            let _ = tx.send(());
        }
        if let Some(mut task) = live.task.take() {
            // Give the task a moment to send its close frame, then stop it
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    if tokio::time::timeout(CLOSE_GRACE, &mut task).await.is_err() {
                        task.abort();
                    }
                });
            } else {
                task.abort();
            }
        }

        inner.state = ChannelState::Closed;
        self.emit(ChannelEvent::new(
            live.id,
            ChannelEventKind::Closed {
                code: CLOSE_NORMAL,
                reason: "client disconnect".to_string(),
            },
        ));
    }

    fn state(&self) -> ChannelState {
        self.inner.lock().state
    }

    fn channel_type(&self) -> &'static str {
        "websocket"
    }
}

impl Drop for WebSocketChannel {
    fn drop(&mut self) {
        if let Some(mut live) = self.inner.lock().live.take() {
            if let Some(task) = live.task.take() {
                task.abort();
            }
        }
    }
}

impl std::fmt::Debug for WebSocketChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketChannel")
            .field("base_url", &self.base_url.as_str())
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("state", &self.state())
            .finish()
    }
}

/// Everything a connection task needs to report back
struct ConnectionTask {
    id: ConnectionId,
    url: Url,
    connect_timeout_ms: u64,
    inner: Arc<Mutex<ChannelInner>>,
    events: mpsc::UnboundedSender<ChannelEvent>,
}

impl ConnectionTask {
    /// Report an event if this connection is still the live one.
    ///
    /// Returns false once the connection has been disconnected or replaced.
    fn report(&self, kind: ChannelEventKind) -> bool {
        let mut inner = self.inner.lock();
        if inner.live.as_ref().map(|live| live.id) != Some(self.id) {
            debug!("Suppressing event from superseded channel {}", self.id);
            return false;
        }

        let event = ChannelEvent::new(self.id, kind);
        if let Some(state) = event.resulting_state() {
            inner.state = state;
        }
        if matches!(event.kind, ChannelEventKind::Closed { .. }) {
            inner.live = None;
        }
        let _ = self.events.send(event);
        true
    }

    fn fail(&self, err: ChannelError) {
        warn!("Channel {} failed: {}", self.id, err);
        let reason = err.to_string();
        if self.report(ChannelEventKind::Error(reason.clone())) {
            self.report(ChannelEventKind::Closed {
                code: CLOSE_ABNORMAL,
                reason,
            });
        }
    }
}

async fn run_connection(task: ConnectionTask, mut close_rx: oneshot::Receiver<()>) {
    let handshake = tokio::time::timeout(
        Duration::from_millis(task.connect_timeout_ms),
        connect_async(task.url.as_str()),
    );

    let stream = tokio::select! {
        _ = &mut close_rx => {
            debug!("Channel {} closed before handshake completed", task.id);
            return;
        }
        result = handshake => match result {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(e)) => {
                task.fail(ChannelError::from(e));
                return;
            }
            Err(_) => {
                task.fail(ChannelError::ConnectTimeout(task.connect_timeout_ms));
                return;
            }
        }
    };

    if !task.report(ChannelEventKind::Open) {
        return;
    }
    info!("Channel {} open", task.id);

    let (mut write, mut read) = stream.split();
    let mut close_code = CLOSE_ABNORMAL;
    let mut close_reason = String::new();

    loop {
        tokio::select! {
            _ = &mut close_rx => {
                let frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: "client disconnect".into(),
                };
                if let Err(e) = write.send(Message::Close(Some(frame))).await {
                    debug!("Channel {} close frame not sent: {}", task.id, e);
                }
                return;
            }
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    task.report(ChannelEventKind::Message(ChannelPayload::Text(text.as_str().to_string())));
                }
                Some(Ok(Message::Binary(data))) => {
                    task.report(ChannelEventKind::Message(ChannelPayload::Binary(data.to_vec())));
                }
                Some(Ok(Message::Close(frame))) => {
                    match frame {
                        Some(frame) => {
                            close_code = u16::from(frame.code);
                            close_reason = frame.reason.as_str().to_string();
                        }
                        None => close_code = u16::from(CloseCode::Status),
                    }
                    debug!("Channel {} received close ({})", task.id, close_code);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!("Channel {} transport error: {}", task.id, e);
                    close_reason = e.to_string();
                    task.report(ChannelEventKind::Error(close_reason.clone()));
                    break;
                }
                None => break,
            }
        }
    }

    info!("Channel {} closed ({})", task.id, close_code);
    task.report(ChannelEventKind::Closed {
        code: close_code,
        reason: close_reason,
    });
}
