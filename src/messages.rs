//! Message log
//!
//! Record of text messages in creation order. Messages are never edited
//! or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the conversation a message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Sent,
    /// Inbound delivery is not wired to the backend yet
    #[allow(dead_code)]
    Received,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sequence number, increasing in creation order
    pub id: u64,
    /// Number on the other end of the thread
    pub peer: String,
    pub content: String,
    pub direction: Direction,
    pub created_at: DateTime<Utc>,
}

/// Messages ordered by id. Ids are handed out when a message is created, so
/// a send that completes late still lands in its creation slot.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message and return the stored copy
    pub fn record(
        &mut self,
        id: u64,
        peer: impl Into<String>,
        content: impl Into<String>,
        direction: Direction,
        created_at: DateTime<Utc>,
    ) -> Message {
        let message = Message {
            id,
            peer: peer.into(),
            content: content.into(),
            direction,
            created_at,
        };
        let at = self.messages.partition_point(|m| m.id <= id);
        self.messages.insert(at, message.clone());
        message
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    /// Messages exchanged with one number, oldest first
    pub fn thread(&self, peer: &str) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| m.peer == peer)
            .cloned()
            .collect()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
