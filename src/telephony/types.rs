//! Wire types for the telephony backend

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct OriginateRequest<'a> {
    pub to: &'a str,
    pub from: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub to: &'a str,
    pub from: &'a str,
    pub body: &'a str,
}

/// Body of `GET /calls/incoming`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingCallResponse {
    pub incoming_call: bool,
    #[serde(default)]
    pub from: Option<String>,
}

/// Result of one inbound-call poll
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IncomingCall {
    pub pending: bool,
    /// Caller number, when the backend reports one
    pub from: Option<String>,
}

impl From<IncomingCallResponse> for IncomingCall {
    fn from(r: IncomingCallResponse) -> Self {
        Self {
            pending: r.incoming_call,
            from: r.from.filter(|f| !f.trim().is_empty()),
        }
    }
}

impl IncomingCall {
    #[cfg(test)]
    pub fn none() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_caller(from: impl Into<String>) -> Self {
        Self {
            pending: true,
            from: Some(from.into()),
        }
    }
}
