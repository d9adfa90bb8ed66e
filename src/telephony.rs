//! Remote telephony backend client
//!
//! A thin request layer: every operation is one independent request with no
//! retry and no local state beyond the backend address and caller identity.

mod error;
mod http;
mod types;

pub use error::{TransportError, TransportErrorKind};
pub use http::HttpTelephonyClient;
pub use types::IncomingCall;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Operations the telephony backend supports
#[async_trait]
pub trait TelephonyClient: Send + Sync {
    /// Ask the backend to place a call to `to` from our caller id
    async fn originate_call(&self, to: &str) -> Result<(), TransportError>;

    /// Pick up the call that is currently ringing
    async fn answer_call(&self) -> Result<(), TransportError>;

    /// Hang up whatever call is active
    async fn end_call(&self) -> Result<(), TransportError>;

    /// Send a text message to `to` from our caller id
    async fn send_message(&self, to: &str, body: &str) -> Result<(), TransportError>;

    /// Ask whether an inbound call is waiting
    async fn poll_incoming(&self) -> Result<IncomingCall, TransportError>;

    fn caller_id(&self) -> &str;
}

#[async_trait]
impl<T: TelephonyClient + ?Sized> TelephonyClient for Arc<T> {
    async fn originate_call(&self, to: &str) -> Result<(), TransportError> {
        (**self).originate_call(to).await
    }

    async fn answer_call(&self) -> Result<(), TransportError> {
        (**self).answer_call().await
    }

    async fn end_call(&self) -> Result<(), TransportError> {
        (**self).end_call().await
    }

    async fn send_message(&self, to: &str, body: &str) -> Result<(), TransportError> {
        (**self).send_message(to, body).await
    }

    async fn poll_incoming(&self) -> Result<IncomingCall, TransportError> {
        (**self).poll_incoming().await
    }

    fn caller_id(&self) -> &str {
        (**self).caller_id()
    }
}

/// Logging wrapper for telephony clients
pub struct LoggingTelephony<T> {
    inner: T,
}

impl<T: TelephonyClient> LoggingTelephony<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    fn log<R>(&self, operation: &'static str, started: Instant, result: &Result<R, TransportError>) {
        let duration = started.elapsed();
        match result {
            Ok(_) => {
                tracing::info!(
                    operation,
                    caller_id = %self.inner.caller_id(),
                    duration_ms = %duration.as_millis(),
                    "Telephony request completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    operation,
                    caller_id = %self.inner.caller_id(),
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Telephony request failed"
                );
            }
        }
    }
}

#[async_trait]
impl<T: TelephonyClient> TelephonyClient for LoggingTelephony<T> {
    async fn originate_call(&self, to: &str) -> Result<(), TransportError> {
        let started = Instant::now();
        let result = self.inner.originate_call(to).await;
        self.log("originate_call", started, &result);
        result
    }

    async fn answer_call(&self) -> Result<(), TransportError> {
        let started = Instant::now();
        let result = self.inner.answer_call().await;
        self.log("answer_call", started, &result);
        result
    }

    async fn end_call(&self) -> Result<(), TransportError> {
        let started = Instant::now();
        let result = self.inner.end_call().await;
        self.log("end_call", started, &result);
        result
    }

    async fn send_message(&self, to: &str, body: &str) -> Result<(), TransportError> {
        let started = Instant::now();
        let result = self.inner.send_message(to, body).await;
        self.log("send_message", started, &result);
        result
    }

    // Polls run every few seconds, so only failures are worth a line
    async fn poll_incoming(&self) -> Result<IncomingCall, TransportError> {
        let result = self.inner.poll_incoming().await;
        match &result {
            Ok(incoming) if incoming.pending => {
                tracing::info!(from = ?incoming.from, "Inbound call pending");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(kind = e.kind.as_str(), error = %e.message, "Inbound poll failed");
            }
        }
        result
    }

    fn caller_id(&self) -> &str {
        self.inner.caller_id()
    }
}
