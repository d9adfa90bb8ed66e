//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ComposeRequest, ErrorResponse, KeyRequest, MessagesQuery, MessagesResponse, QueuedResponse,
};
use super::AppState;
use crate::dialer::DialKey;
use crate::runtime::{PhoneSnapshot, RuntimeError, SseEvent};
use crate::state_machine::Event;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Phone display
        .route("/api/phone", get(get_phone))
        .route("/api/phone/stream", get(stream_phone))
        // Keypad and call controls
        .route("/api/phone/keys", post(press_key))
        .route("/api/phone/backspace", post(backspace))
        .route("/api/phone/call", post(call))
        .route("/api/phone/answer", post(answer))
        .route("/api/phone/hangup", post(hang_up))
        // Messaging
        .route("/api/messages", get(list_messages))
        .route("/api/messages/compose", put(compose))
        .route("/api/messages/send", post(send_message))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Display
// ============================================================

async fn get_phone(State(state): State<AppState>) -> Json<PhoneSnapshot> {
    Json(state.phone.snapshot())
}

async fn stream_phone(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before reading so nothing published in between is lost
    let broadcast_rx = state.phone.subscribe();
    let init_event = SseEvent::Init {
        snapshot: state.phone.snapshot(),
        messages: state.phone.messages(None).await,
    };
    sse_stream(init_event, broadcast_rx)
}

// ============================================================
// Intents
// ============================================================

async fn press_key(
    State(state): State<AppState>,
    Json(req): Json<KeyRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    let key: DialKey = req
        .key
        .parse()
        .map_err(|e| AppError::BadRequest(format!("{e}")))?;
    queue(&state, Event::KeyPress { key }).await
}

async fn backspace(State(state): State<AppState>) -> Result<Json<QueuedResponse>, AppError> {
    queue(&state, Event::Backspace).await
}

async fn call(State(state): State<AppState>) -> Result<Json<QueuedResponse>, AppError> {
    queue(&state, Event::Call).await
}

async fn answer(State(state): State<AppState>) -> Result<Json<QueuedResponse>, AppError> {
    queue(&state, Event::Answer).await
}

async fn hang_up(State(state): State<AppState>) -> Result<Json<QueuedResponse>, AppError> {
    queue(&state, Event::HangUp).await
}

async fn compose(
    State(state): State<AppState>,
    Json(req): Json<ComposeRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    queue(&state, Event::ComposeText { text: req.text }).await
}

async fn send_message(State(state): State<AppState>) -> Result<Json<QueuedResponse>, AppError> {
    queue(&state, Event::SendMessage).await
}

async fn queue(state: &AppState, event: Event) -> Result<Json<QueuedResponse>, AppError> {
    state.phone.send_event(event).await?;
    Ok(Json(QueuedResponse { queued: true }))
}

// ============================================================
// Message log
// ============================================================

async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Json<MessagesResponse> {
    let peer = query.peer.as_deref().map(str::trim).filter(|p| !p.is_empty());
    Json(MessagesResponse {
        messages: state.phone.messages(peer).await,
    })
}

async fn get_version() -> &'static str {
    concat!("phone-sim ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Unavailable(String),
}

impl From<RuntimeError> for AppError {
    fn from(e: RuntimeError) -> Self {
        AppError::Unavailable(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
