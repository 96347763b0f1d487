//! Webhook endpoint handler.
//!
//! Hands each delivery to the [`Dispatcher`](crate::webhooks::Dispatcher) and
//! maps its verdict to an HTTP status. Commands execute later, in workers, so
//! a 200 only means the delivery was accepted.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::AppState;
use crate::github::GitHubApi;
use crate::webhooks::{Delivery, DispatchError, SIGNATURE_HEADER};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = match &self {
            DispatchError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::Signature(_) => StatusCode::FORBIDDEN,
            DispatchError::MissingEventType => StatusCode::BAD_REQUEST,
            DispatchError::Parse(_) => StatusCode::BAD_REQUEST,
        };

        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Headers:
///   - `X-GitHub-Event`: Event type (e.g., "issue_comment"), required
///   - `X-Hub-Signature-256`: HMAC-SHA256 signature of the payload, required
///   - `X-GitHub-Delivery`: Delivery ID, optional, used for logging
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 200 OK: Delivery accepted (possibly with nothing to do)
/// - 400 Bad Request: Missing event header or malformed payload
/// - 403 Forbidden: Missing or invalid signature
/// - 503 Service Unavailable: Shutting down
pub async fn webhook_handler<G: GitHubApi>(
    State(app_state): State<AppState<G>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), DispatchError> {
    let delivery = Delivery {
        event_type: get_header(&headers, HEADER_EVENT),
        delivery_id: get_header(&headers, HEADER_DELIVERY),
        signature: get_header(&headers, SIGNATURE_HEADER),
        body: &body,
    };

    let queued = app_state.dispatcher().ingest(delivery)?;
    debug!(queued, "Webhook accepted");
    Ok((StatusCode::OK, "OK"))
}

/// Extracts a header value as a string, if present and valid UTF-8.
fn get_header<'a>(headers: &'a HeaderMap, name: &'static str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
