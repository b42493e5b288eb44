//! Local stand-in for the language backend
//!
//! Serves the same wire contract as the real service so the client can be
//! exercised without it:
//! - POST /message/validate-process-text - Validate and clean up text
//! - POST /message/generate-text - Echo the prompt back as a reply
//! - POST /message/validate-process-audio - Accept a recording and describe it
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use crate::config::StubConfig;

pub use handlers::MAX_TEXT_CHARS;
pub use routes::create_router;
pub use state::{RequestCounters, StubState};

/// Serve the stub until the process is stopped
pub async fn serve(config: &StubConfig) -> Result<()> {
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let state = StubState::with_delay(Duration::from_millis(config.delay_ms));

    info!("Stub backend listening on http://{}", addr);

    axum::serve(listener, create_router(state))
        .await
        .context("Stub backend failed")
}
