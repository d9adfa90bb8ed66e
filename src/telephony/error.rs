//! Telephony transport errors

use thiserror::Error;

/// Any failure talking to the telephony backend
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    pub fn status(code: u16, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("backend returned HTTP {code}")
        } else {
            format!("backend returned HTTP {code}: {body}")
        };
        Self::new(TransportErrorKind::Status(code), message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::InvalidResponse, message)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(e.to_string())
        } else if e.is_decode() {
            Self::invalid_response(e.to_string())
        } else {
            Self::network(e.to_string())
        }
    }
}

/// Classification used for logging only; callers treat every kind alike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, DNS, TLS, reset
    Network,
    /// Request exceeded the configured timeout
    Timeout,
    /// Backend answered with a non-2xx status
    Status(u16),
    /// Response body did not match the expected shape
    InvalidResponse,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Status(_) => "status",
            Self::InvalidResponse => "invalid_response",
        }
    }
}
