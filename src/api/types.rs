//! API request and response types

use crate::messages::Message;
use serde::{Deserialize, Serialize};

/// Keypad press
#[derive(Debug, Deserialize)]
pub struct KeyRequest {
    pub key: String,
}

/// Replace the message composer text
#[derive(Debug, Deserialize)]
pub struct ComposeRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub peer: Option<String>,
}

/// Response for intents; the outcome arrives through the stream
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub queued: bool,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
