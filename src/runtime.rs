//! Runtime for the phone
//!
//! One task owns the phone state and the message log and applies every event
//! in arrival order. Backend requests, the call timer and the inbound-call
//! poller run as separate tasks that only report back through events.

mod executor;
mod poller;

#[cfg(test)]
pub mod testing;

pub use executor::PhoneRuntime;

use crate::messages::{Message, MessageLog};
use crate::state_machine::{format_duration, CallState, Event, PhoneState};
use crate::telephony::TelephonyClient;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Reference poll period for inbound calls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Call duration resolution
pub const CALL_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    pub poll_interval: Duration,
    pub tick_period: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            tick_period: CALL_TICK,
        }
    }
}

/// What a renderer needs to draw the phone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhoneSnapshot {
    pub dialer: String,
    pub call: CallState,
    pub duration_secs: u64,
    /// `m:ss`
    pub duration_display: String,
    pub ringing: bool,
    pub in_call: bool,
    pub request_in_flight: bool,
    pub compose: String,
}

impl From<&PhoneState> for PhoneSnapshot {
    fn from(state: &PhoneState) -> Self {
        let duration_secs = state.call.duration_secs();
        Self {
            dialer: state.dialer.as_str().to_string(),
            call: state.call.clone(),
            duration_secs,
            duration_display: format_duration(duration_secs),
            ringing: state.call.is_ringing(),
            in_call: state.call.is_in_call(),
            request_in_flight: state.is_request_in_flight(),
            compose: state.compose.clone(),
        }
    }
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init {
        snapshot: PhoneSnapshot,
        messages: Vec<Message>,
    },
    StateChange {
        snapshot: PhoneSnapshot,
    },
    Message {
        message: Message,
    },
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Phone runtime has stopped")]
    Stopped,
}

/// Handle to interact with the running phone
#[derive(Clone)]
pub struct PhoneHandle {
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    snapshot_rx: watch::Receiver<PhoneSnapshot>,
    messages: Arc<RwLock<MessageLog>>,
    shutdown: CancellationToken,
}

impl PhoneHandle {
    /// Queue an event for the runtime
    pub async fn send_event(&self, event: Event) -> Result<(), RuntimeError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| RuntimeError::Stopped)
    }

    pub fn snapshot(&self) -> PhoneSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that observes every published snapshot
    #[cfg(test)]
    pub fn watch(&self) -> watch::Receiver<PhoneSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SseEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Whole log, or one thread when `peer` is given
    pub async fn messages(&self, peer: Option<&str>) -> Vec<Message> {
        let log = self.messages.read().await;
        match peer {
            Some(peer) => log.thread(peer),
            None => log.all().to_vec(),
        }
    }

    /// Stop the runtime, the poller and any call timer
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Start the phone runtime and its inbound-call poller
pub fn spawn_phone<C>(client: C, config: RuntimeConfig) -> (PhoneHandle, JoinHandle<()>)
where
    C: TelephonyClient + 'static,
{
    let client = Arc::new(client);
    let state = PhoneState::new();
    let messages = Arc::new(RwLock::new(MessageLog::new()));
    let shutdown = CancellationToken::new();

    let (event_tx, event_rx) = mpsc::channel(64);
    let (broadcast_tx, _) = broadcast::channel(128);
    let (snapshot_tx, snapshot_rx) = watch::channel(PhoneSnapshot::from(&state));

    tokio::spawn(poller::run_poller(
        client.clone(),
        snapshot_rx.clone(),
        event_tx.clone(),
        config.poll_interval,
        shutdown.child_token(),
    ));

    let runtime = PhoneRuntime::new(
        state,
        client,
        messages.clone(),
        event_rx,
        event_tx.clone(),
        broadcast_tx.clone(),
        snapshot_tx,
        config.tick_period,
        shutdown.clone(),
    );

    let join = tokio::spawn(async move {
        runtime.run().await;
        tracing::info!("Phone runtime finished");
    });

    let handle = PhoneHandle {
        event_tx,
        broadcast_tx,
        snapshot_rx,
        messages,
        shutdown,
    };

    (handle, join)
}
