//! Health check endpoint.
//!
//! Returns 200 OK while the server accepts webhooks and 503 once it has begun
//! draining, so a load balancer stops routing deliveries to it.

use axum::extract::State;
use axum::http::StatusCode;

use super::AppState;
use crate::github::GitHubApi;

/// Health check handler.
///
/// # Example
///
/// ```ignore
/// GET /health HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: text/plain
///
/// OK
/// ```
pub async fn health_handler<G: GitHubApi>(
    State(app_state): State<AppState<G>>,
) -> (StatusCode, &'static str) {
    if app_state.shutdown().is_shutting_down() {
        (StatusCode::SERVICE_UNAVAILABLE, "Shutting down")
    } else {
        (StatusCode::OK, "OK")
    }
}
