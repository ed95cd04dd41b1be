//! Session Controller
//!
//! Owns the single interview session: its phase, its identity and the
//! realtime channel attached to it.
//!
//! Phases move strictly `Idle → Starting → {Active | Idle}` and
//! `{Starting | Active} → Canceling → Idle`. State lives behind a mutex that
//! is never held across an `.await`, so every transition is applied as a
//! whole. A generation counter is bumped by each start and cancel; a creation
//! response that comes back under a different generation belongs to a
//! cancelled attempt and is discarded.

use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::config::SessionConfig;
use super::error::{SessionError, SessionResult};
use super::events::{SessionEvent, SessionEventEmitter};
use super::state::{SessionHandle, SessionPhase, SessionSnapshot};
use crate::channel::{ChannelEvent, ChannelEventKind, ChannelEvents, ChannelState, RealtimeChannel};
use crate::config::ClientSettings;
use crate::service::{CancelRequest, SessionService};

/// Controller behaviour knobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Return to `Idle` when the channel closes on its own while `Active`
    pub idle_on_channel_close: bool,
    /// Per-subscriber buffer of presentation events
    pub event_capacity: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            idle_on_channel_close: false,
            event_capacity: 256,
        }
    }
}

impl From<&ClientSettings> for ControllerOptions {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            idle_on_channel_close: settings.idle_on_channel_close,
            event_capacity: settings.event_capacity,
        }
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    phase: SessionPhase,
    generation: u64,
    /// A creation request is outstanding, possibly for a cancelled attempt
    creating: bool,
    /// Agent of the current attempt; cancellation is keyed by it
    agent_id: Option<String>,
    handle: Option<SessionHandle>,
}

/// Lifecycle controller for one interview session at a time
pub struct SessionController {
    service: Arc<dyn SessionService>,
    channel: Arc<dyn RealtimeChannel>,
    state: Mutex<ControllerState>,
    events: SessionEventEmitter,
    options: ControllerOptions,
}

impl SessionController {
    /// Create a controller with default options
    pub fn new(service: Arc<dyn SessionService>, channel: Arc<dyn RealtimeChannel>) -> Self {
        Self::with_options(service, channel, ControllerOptions::default())
    }

    pub fn with_options(
        service: Arc<dyn SessionService>,
        channel: Arc<dyn RealtimeChannel>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            service,
            channel,
            state: Mutex::new(ControllerState::default()),
            events: SessionEventEmitter::new(options.event_capacity),
            options,
        }
    }

    /// Current phase
    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    /// Handle of the live session, if any
    pub fn handle(&self) -> Option<SessionHandle> {
        self.state.lock().handle.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock();
        SessionSnapshot::new(state.phase, state.handle.as_ref())
    }

    /// Subscribe to phase changes, errors and channel traffic
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn set_phase(&self, state: &mut ControllerState, phase: SessionPhase) {
        let old_phase = state.phase;
        if old_phase == phase {
            return;
        }
        state.phase = phase;
        info!("Session phase: {} -> {}", old_phase, phase);
        self.events.emit_phase(old_phase, phase);
    }

    /// Report an error to subscribers and hand it back to the caller
    fn fail<T>(&self, error: SessionError) -> SessionResult<T> {
        match error {
            SessionError::Validation { .. } | SessionError::AlreadyActive | SessionError::NoActiveSession => {
                debug!("Rejected ({}): {}", error.code(), error)
            }
            _ => warn!("Session error ({}): {}", error.code(), error),
        }
        self.events.emit_error(error.clone());
        Err(error)
    }

    /// Create a session and attach its realtime channel.
    ///
    /// Fails with `AlreadyActive` unless the controller is `Idle` with no
    /// creation request outstanding, and with `Validation` if any field is
    /// blank. Neither performs any network action.
    pub async fn start_session(&self, config: SessionConfig) -> SessionResult<()> {
        let (generation, offer) = {
            let mut state = self.state.lock();
            if state.phase != SessionPhase::Idle || state.creating {
                return self.fail(SessionError::AlreadyActive);
            }
            if let Err(e) = config.validate() {
                return self.fail(e);
            }

            state.generation += 1;
            state.creating = true;
            state.agent_id = Some(config.agent_key().to_string());
            self.set_phase(&mut state, SessionPhase::Starting);
            (state.generation, config.to_offer())
        };

        debug!(
            "Creating session for {:?} via {} service",
            config,
            self.service.service_type()
        );
        let outcome = self.service.create_session(&offer).await;

        let mut state = self.state.lock();
        state.creating = false;

        if state.generation != generation || state.phase != SessionPhase::Starting {
            match &outcome {
                Ok(response) => warn!(
                    "Discarding conversation {} created for a cancelled attempt",
                    response.conversation_id
                ),
                Err(e) => debug!("Ignoring creation failure of a cancelled attempt: {}", e),
            }
            // Nothing was connected for this attempt and no newer attempt can
            // have connected while `creating` was set
            self.channel.disconnect();
            return self.fail(SessionError::Cancelled);
        }

        match outcome {
            Ok(response) => {
                let connection = self.channel.connect(&response.conversation_id);
                debug!(
                    "Channel {} requested on {} for {}",
                    connection,
                    self.channel.channel_type(),
                    response.conversation_id
                );
                state.handle = Some(SessionHandle::new(response.conversation_id, connection));
                self.set_phase(&mut state, SessionPhase::Active);
                Ok(())
            }
            Err(e) => {
                state.agent_id = None;
                self.set_phase(&mut state, SessionPhase::Idle);
                self.fail(SessionError::start_failed(e.reason()))
            }
        }
    }

    /// Tear down the channel, ask the service to cancel, and return to `Idle`.
    ///
    /// Local state is cleared whatever the service answers; a failed request
    /// is reported as `CancelFailed` after the controller is already `Idle`.
    pub async fn cancel_session(&self) -> SessionResult<()> {
        let request = {
            let mut state = self.state.lock();
            let agent_id = match state.agent_id.clone() {
                Some(agent_id) if state.phase.is_cancellable() => agent_id,
                _ => return self.fail(SessionError::NoActiveSession),
            };

            state.generation += 1;
            self.set_phase(&mut state, SessionPhase::Canceling);

            // The channel must be gone before the service hears about the cancel
            if let Some(handle) = &state.handle {
                debug!("Disconnecting channel for {}", handle.conversation_id);
                self.channel.disconnect();
            }
            CancelRequest::new(agent_id)
        };

        let outcome = self.service.cancel_session(&request).await;

        {
            let mut state = self.state.lock();
            state.handle = None;
            state.agent_id = None;
            self.set_phase(&mut state, SessionPhase::Idle);
        }

        match outcome {
            Ok(()) => {
                info!("Session for agent {} cancelled", request.agent_id);
                Ok(())
            }
            Err(e) => self.fail(SessionError::cancel_failed(e.reason())),
        }
    }

    /// Cancel whatever is in progress; used on exit
    pub async fn shutdown(&self) {
        if !self.phase().is_cancellable() {
            return;
        }
        info!("Shutting down active session");
        if let Err(e) = self.cancel_session().await {
            warn!("Error during session shutdown: {}", e);
        }
    }

    /// Apply one channel event.
    ///
    /// Events from any connection other than the live handle's are dropped,
    /// as is everything the live connection reports once a cancel has
    /// disconnected it.
    pub fn handle_channel_event(&self, event: ChannelEvent) {
        let mut state = self.state.lock();
        let canceling = state.phase == SessionPhase::Canceling;
        let Some(handle) = state
            .handle
            .as_mut()
            .filter(|handle| handle.connection == event.connection)
        else {
            debug!("Dropping stale channel event from {}", event.connection);
            return;
        };

        if canceling {
            if let ChannelEventKind::Closed { .. } = event.kind {
                handle.channel_state = ChannelState::Closed;
            }
            debug!("Dropping channel event from disconnected {}", event.connection);
            return;
        }

        if let Some(channel_state) = event.resulting_state() {
            handle.channel_state = channel_state;
        }
        let conversation_id = handle.conversation_id.clone();

        match event.kind {
            ChannelEventKind::Open => {
                info!("Channel open for {}", conversation_id);
                self.events.emit(SessionEvent::ChannelOpened { conversation_id });
            }
            ChannelEventKind::Message(payload) => {
                self.events.emit(SessionEvent::ChannelMessage {
                    conversation_id,
                    payload,
                });
            }
            ChannelEventKind::Error(cause) => {
                warn!("Channel error for {}: {}", conversation_id, cause);
                self.events.emit_error(SessionError::channel(cause));
            }
            ChannelEventKind::Closed { code, reason } => {
                info!("Channel closed for {} ({}: {})", conversation_id, code, reason);
                self.events.emit(SessionEvent::ChannelClosed {
                    conversation_id: conversation_id.clone(),
                    code,
                    reason,
                });

                if self.options.idle_on_channel_close && state.phase == SessionPhase::Active {
                    warn!("Channel for {} closed while active, returning to idle", conversation_id);
                    state.generation += 1;
                    state.handle = None;
                    state.agent_id = None;
                    self.set_phase(&mut state, SessionPhase::Idle);
                }
            }
        }
    }

    /// Feed a channel's events into [`Self::handle_channel_event`] on a background task.
    ///
    /// The task stops when the channel is dropped or the controller is gone.
    pub fn spawn_channel_pump(self: &Arc<Self>, mut events: ChannelEvents) -> JoinHandle<()> {
        let controller = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                controller.handle_channel_event(event);
            }
            debug!("Channel event pump stopped");
        })
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &*self.state.lock())
            .field("options", &self.options)
            .finish()
    }
}
