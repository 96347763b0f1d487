//! HTTP server for the slash command bot.
//!
//! This module implements the HTTP server that:
//! - Accepts webhooks from GitHub and hands them to the dispatcher
//! - Lets an operator add the preset labels to a repository
//! - Provides health checks for liveness probes
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts GitHub webhook deliveries (returns 200 OK)
//! - `POST /labels?owner=..&repo=..` - Creates missing preset labels
//! - `GET /health` - Returns 200 while serving, 503 while draining

use std::sync::Arc;

use tower_http::trace::TraceLayer;

use crate::github::GitHubApi;
use crate::shutdown::ShutdownCoordinator;
use crate::webhooks::Dispatcher;

pub mod health;
pub mod labels;
pub mod lifecycle;
pub mod webhook;

pub use health::health_handler;
pub use labels::labels_handler;
pub use lifecycle::{DrainConfig, ShutdownReport, run_until_shutdown};
pub use webhook::webhook_handler;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
pub struct AppState<G> {
    inner: Arc<AppStateInner<G>>,
}

struct AppStateInner<G> {
    dispatcher: Dispatcher,

    /// Client used by the preset label endpoint.
    github: Arc<G>,

    /// Bearer token guarding `POST /labels`. Open when `None`.
    admin_token: Option<String>,
}

// Manual impl: deriving would require `G: Clone`.
impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G> AppState<G> {
    pub fn new(dispatcher: Dispatcher, github: Arc<G>, admin_token: Option<String>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                dispatcher,
                github,
                admin_token,
            }),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub fn shutdown(&self) -> &ShutdownCoordinator {
        self.inner.dispatcher.shutdown()
    }

    pub fn github(&self) -> &G {
        &self.inner.github
    }

    pub fn admin_token(&self) -> Option<&str> {
        self.inner.admin_token.as_deref()
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<G: GitHubApi + 'static>(app_state: AppState<G>) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler::<G>))
        .route("/labels", post(labels_handler::<G>))
        .route("/health", get(health_handler::<G>))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
