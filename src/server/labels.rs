//! Administrative endpoint that adds the preset labels to a repository.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use super::AppState;
use crate::github::{GitHubApi, GitHubApiError};
use crate::handlers::add_preset_labels;
use crate::types::RepoId;

/// Query parameters of `POST /labels`.
#[derive(Debug, Default, Deserialize)]
pub struct LabelParams {
    pub owner: Option<String>,
    pub repo: Option<String>,
}

/// Errors that can occur when adding preset labels.
#[derive(Debug, Error)]
pub enum LabelsError {
    #[error("missing or invalid bearer token")]
    Unauthorized,

    #[error("Url Param '{0}' is missing")]
    MissingParam(&'static str),

    #[error("{0}")]
    GitHub(#[from] GitHubApiError),
}

impl IntoResponse for LabelsError {
    fn into_response(self) -> Response {
        let status = match &self {
            LabelsError::Unauthorized => StatusCode::UNAUTHORIZED,
            LabelsError::MissingParam(_) => StatusCode::BAD_REQUEST,
            LabelsError::GitHub(_) => StatusCode::BAD_REQUEST,
        };

        (status, self.to_string()).into_response()
    }
}

/// Preset label handler.
///
/// # Request
///
/// - Method: POST
/// - Query: `owner` and `repo`, both required
/// - `Authorization: Bearer <token>` when an admin token is configured
///
/// # Response
///
/// - 200 OK: Missing presets created (existing labels are untouched)
/// - 400 Bad Request: Missing parameter, or GitHub refused a call
/// - 401 Unauthorized: Admin token missing or wrong
pub async fn labels_handler<G: GitHubApi>(
    State(app_state): State<AppState<G>>,
    headers: HeaderMap,
    Query(params): Query<LabelParams>,
) -> Result<(StatusCode, String), LabelsError> {
    if let Some(expected) = app_state.admin_token() {
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(expected) {
            warn!("Rejected preset label request with bad credentials");
            return Err(LabelsError::Unauthorized);
        }
    }

    let owner = required(params.owner, "owner")?;
    let repo = required(params.repo, "repo")?;
    let repo = RepoId::new(owner, repo);

    let created = add_preset_labels(app_state.github(), &repo)
        .await
        .inspect_err(|e| warn!(repo = %repo, error = %e, "Adding preset labels failed"))?;

    Ok((
        StatusCode::OK,
        format!("created {} preset labels in {}", created.len(), repo),
    ))
}

fn required(value: Option<String>, name: &'static str) -> Result<String, LabelsError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(LabelsError::MissingParam(name))
}
