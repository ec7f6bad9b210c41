use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use crate::dispatch::ReviewDispatcher;
use crate::payload::{is_reviewable_action, PullRequestEvent};
use crate::signature::SignatureVerifier;

/// `sha256=<hex>` HMAC of the raw body.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
/// Event name, e.g. `pull_request`.
pub const EVENT_HEADER: &str = "x-github-event";
/// Unique delivery id, logged with every request.
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Shared state for the webhook handlers.
pub struct AppState {
    pub verifier: SignatureVerifier,
    pub dispatcher: Arc<dyn ReviewDispatcher>,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// POST /webhook/github
///
/// Verifies the signature over the raw body, filters to reviewable
/// `pull_request` actions and dispatches the review in the background.
/// Replies `202` without waiting for the review.
#[tracing::instrument(
    skip_all,
    fields(delivery = header(&headers, DELIVERY_HEADER).unwrap_or("-"))
)]
pub async fn github_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    if !state
        .verifier
        .verify(&body, header(&headers, SIGNATURE_HEADER))
    {
        tracing::warn!("invalid webhook signature");
        return (StatusCode::UNAUTHORIZED, "Invalid signature");
    }

    let event = header(&headers, EVENT_HEADER).unwrap_or_default();
    if event != "pull_request" {
        tracing::debug!(event, "ignoring event");
        return (StatusCode::OK, "Event ignored");
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, "malformed webhook body");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error processing webhook");
        }
    };

    let action = payload
        .get("action")
        .and_then(|a| a.as_str())
        .unwrap_or_default()
        .to_owned();
    if !is_reviewable_action(&action) {
        tracing::debug!(action = %action, "ignoring pull_request action");
        return (StatusCode::OK, "Action ignored");
    }

    let pr = match serde_json::from_value::<PullRequestEvent>(payload) {
        Ok(event) => event.into_context(),
        Err(e) => {
            tracing::error!(error = %e, "unexpected pull_request payload");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error processing webhook");
        }
    };

    tracing::info!(pr = %pr, action = %action, "dispatching review");
    state.dispatcher.dispatch(pr);
    (StatusCode::ACCEPTED, "Processing started")
}

/// GET /webhook/health
pub async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
