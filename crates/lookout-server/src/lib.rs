//! Webhook endpoint for the lookout review bot.
//!
//! Receives GitHub `pull_request` events, verifies their signature and hands
//! reviewable ones to a [`ReviewDispatcher`](dispatch::ReviewDispatcher).

pub mod dispatch;
pub mod payload;
pub mod signature;
pub mod webhook;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use lookout_core::LookoutError;
use tokio::signal;

use crate::webhook::{github_webhook, health, AppState};

/// Build the router with the webhook and health routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook/github", post(github_webhook))
        .route("/webhook/health", get(health))
        .with_state(state)
}

/// Serve on `bind_address` until Ctrl-C.
///
/// # Errors
///
/// Returns [`LookoutError::Io`] if the address cannot be bound or the server
/// fails.
pub async fn serve(bind_address: &str, state: Arc<AppState>) -> Result<(), LookoutError> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    tracing::info!(address = bind_address, "webhook server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("webhook server stopped");
    Ok(())
}

/// Resolves when Ctrl-C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
