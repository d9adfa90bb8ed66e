//! Phone state types

use crate::dialer::DialerBuffer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Peer shown for an inbound call when the backend does not name the caller
pub const UNKNOWN_CALLER: &str = "unknown";

/// Identifies one call attempt. Responses and timer ticks carry the id of the
/// session they belong to so leftovers from an abandoned call are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Call session state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallState {
    #[default]
    Idle,

    /// Origination requested, waiting for the backend
    Dialing { session: SessionId, peer: String },

    /// Inbound call waiting to be answered
    Ringing { session: SessionId, peer: String },

    /// Connected; `duration_secs` counts up once per second
    InCall {
        session: SessionId,
        peer: String,
        duration_secs: u64,
    },
}

impl CallState {
    pub fn is_idle(&self) -> bool {
        matches!(self, CallState::Idle)
    }

    pub fn is_ringing(&self) -> bool {
        matches!(self, CallState::Ringing { .. })
    }

    pub fn is_in_call(&self) -> bool {
        matches!(self, CallState::InCall { .. })
    }

    pub fn session(&self) -> Option<SessionId> {
        match self {
            CallState::Idle => None,
            CallState::Dialing { session, .. }
            | CallState::Ringing { session, .. }
            | CallState::InCall { session, .. } => Some(*session),
        }
    }

    #[cfg(test)]
    pub fn peer(&self) -> Option<&str> {
        match self {
            CallState::Idle => None,
            CallState::Dialing { peer, .. }
            | CallState::Ringing { peer, .. }
            | CallState::InCall { peer, .. } => Some(peer),
        }
    }

    /// Always 0 outside `InCall`
    pub fn duration_secs(&self) -> u64 {
        match self {
            CallState::InCall { duration_secs, .. } => *duration_secs,
            _ => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CallState::Idle => "idle",
            CallState::Dialing { .. } => "dialing",
            CallState::Ringing { .. } => "ringing",
            CallState::InCall { .. } => "in_call",
        }
    }
}

/// The three call-affecting backend operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallRequest {
    Originate,
    Answer,
    End,
}

/// The call-affecting request currently awaiting a backend response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub request: CallRequest,
    pub session: SessionId,
}

/// Everything the state machine owns, apart from the message log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneState {
    pub call: CallState,
    pub dialer: DialerBuffer,
    /// Text typed in the message composer
    pub compose: String,
    pub in_flight: Option<PendingRequest>,
    next_session: u64,
    next_send: u64,
}

impl Default for PhoneState {
    fn default() -> Self {
        Self {
            call: CallState::Idle,
            dialer: DialerBuffer::new(),
            compose: String::new(),
            in_flight: None,
            next_session: 1,
            next_send: 1,
        }
    }
}

impl PhoneState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn allocate_session(&mut self) -> SessionId {
        let id = SessionId(self.next_session);
        self.next_session += 1;
        id
    }

    pub(super) fn allocate_send(&mut self) -> u64 {
        let id = self.next_send;
        self.next_send += 1;
        id
    }

    pub fn is_request_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }
}

/// Render a call duration as `m:ss`
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
