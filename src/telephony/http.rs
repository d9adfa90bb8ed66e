//! HTTP implementation of the telephony client

use super::types::{IncomingCall, IncomingCallResponse, OriginateRequest, SendMessageRequest};
use super::{TelephonyClient, TransportError};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

/// Talks to the telephony backend over JSON/HTTP
pub struct HttpTelephonyClient {
    client: Client,
    base_url: String,
    caller_id: String,
}

impl HttpTelephonyClient {
    pub fn new(
        base_url: &str,
        caller_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            caller_id: caller_id.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_ack<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), TransportError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        ensure_success(response).await.map(|_| ())
    }
}

async fn ensure_success(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::status(status.as_u16(), body.trim()))
}

#[async_trait]
impl TelephonyClient for HttpTelephonyClient {
    async fn originate_call(&self, to: &str) -> Result<(), TransportError> {
        let body = OriginateRequest {
            to,
            from: &self.caller_id,
        };
        self.post_ack("/calls", &body).await
    }

    async fn answer_call(&self) -> Result<(), TransportError> {
        self.post_ack("/calls/answer", &json!({})).await
    }

    async fn end_call(&self) -> Result<(), TransportError> {
        self.post_ack("/calls/end", &json!({})).await
    }

    async fn send_message(&self, to: &str, body: &str) -> Result<(), TransportError> {
        let request = SendMessageRequest {
            to,
            from: &self.caller_id,
            body,
        };
        self.post_ack("/messages", &request).await
    }

    async fn poll_incoming(&self) -> Result<IncomingCall, TransportError> {
        let response = self.client.get(self.url("/calls/incoming")).send().await?;
        let response = ensure_success(response).await?;
        let parsed: IncomingCallResponse = response
            .json()
            .await
            .map_err(|e| TransportError::invalid_response(e.to_string()))?;
        Ok(parsed.into())
    }

    fn caller_id(&self) -> &str {
        &self.caller_id
    }
}
