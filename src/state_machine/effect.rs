//! Effects produced by state transitions

use super::state::SessionId;
use crate::messages::Direction;
use chrono::{DateTime, Utc};

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the backend to place a call
    OriginateCall { session: SessionId, to: String },

    /// Ask the backend to pick up the ringing call
    AnswerCall { session: SessionId },

    /// Ask the backend to hang up; the outcome does not affect local state
    EndCall { session: SessionId },

    /// Send a text message. `send_id` becomes the logged message's id.
    SendMessage {
        send_id: u64,
        to: String,
        body: String,
    },

    /// Start the once-per-second duration timer for a connected call
    StartCallTimer { session: SessionId },

    /// Cancel the duration timer
    StopCallTimer,

    /// Record a confirmed message in the log, ordered by `id`
    RecordMessage {
        id: u64,
        peer: String,
        content: String,
        direction: Direction,
        created_at: DateTime<Utc>,
    },
}

impl Effect {
    pub fn sent_message(id: u64, peer: String, content: String, created_at: DateTime<Utc>) -> Self {
        Effect::RecordMessage {
            id,
            peer,
            content,
            direction: Direction::Sent,
            created_at,
        }
    }
}
