//! Phone simulator
//!
//! A software phone whose calls and messages go through a remote telephony
//! backend. The call and session state machine runs in-process; renderers
//! drive it over a small HTTP API.

mod api;
mod config;
mod dialer;
mod messages;
mod runtime;
mod state_machine;
mod telephony;

use api::{create_router, AppState};
use config::PhoneConfig;
use runtime::spawn_phone;
use std::net::SocketAddr;
use telephony::{HttpTelephonyClient, LoggingTelephony};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "phone_sim=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = PhoneConfig::from_env()?;
    tracing::info!(
        backend = %config.backend_url,
        caller_id = %config.caller_id,
        poll_interval_secs = config.poll_interval.as_secs(),
        "Configuration loaded"
    );

    let client = HttpTelephonyClient::new(
        &config.backend_url,
        &config.caller_id,
        config.request_timeout,
    )?;
    let (phone, runtime_task) = spawn_phone(LoggingTelephony::new(client), config.runtime());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(AppState::new(phone.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Phone simulator listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    tracing::info!("Shutting down phone");
    phone.shutdown();
    runtime_task.await?;

    Ok(())
}
