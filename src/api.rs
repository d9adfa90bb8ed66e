//! HTTP API for the phone
//!
//! The presentation boundary: renderers read snapshots and the message log,
//! and forward user intents as events.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::runtime::PhoneHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub phone: PhoneHandle,
}

impl AppState {
    pub fn new(phone: PhoneHandle) -> Self {
        Self { phone }
    }
}
