//! Webhook ingestion: from an authenticated delivery to queued commands.
//!
//! The dispatcher never talks to GitHub. It validates the delivery, extracts
//! commands and enqueues them; workers do the rest asynchronously, so webhook
//! latency does not depend on API latency.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::commands::{Command, CommandHandle, parse_comment_body};
use crate::shutdown::ShutdownCoordinator;
use crate::types::DeliveryId;
use crate::worker::RateLimitedQueue;

use super::parser::{ParseError, parse_webhook};
use super::signature::{SignatureError, verify_signature};

/// Why a delivery was rejected.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The process is draining and accepts no new work.
    #[error("shutting down")]
    ShuttingDown,

    #[error("invalid signature: {0}")]
    Signature(#[from] SignatureError),

    #[error("missing required header: X-GitHub-Event")]
    MissingEventType,

    #[error("invalid payload: {0}")]
    Parse(#[from] ParseError),
}

/// One inbound delivery, as raw header values and body.
#[derive(Debug, Clone, Copy)]
pub struct Delivery<'a> {
    /// `X-GitHub-Event`.
    pub event_type: Option<&'a str>,

    /// `X-GitHub-Delivery`.
    pub delivery_id: Option<&'a str>,

    /// `X-Hub-Signature-256`.
    pub signature: Option<&'a str>,

    pub body: &'a [u8],
}

/// Turns webhook deliveries into queued commands.
#[derive(Debug)]
pub struct Dispatcher {
    queue: Arc<RateLimitedQueue<CommandHandle>>,
    shutdown: Arc<ShutdownCoordinator>,
    secret: Vec<u8>,
}

impl Dispatcher {
    pub fn new(
        queue: Arc<RateLimitedQueue<CommandHandle>>,
        shutdown: Arc<ShutdownCoordinator>,
        secret: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            queue,
            shutdown,
            secret: secret.into(),
        }
    }

    pub fn queue(&self) -> &Arc<RateLimitedQueue<CommandHandle>> {
        &self.queue
    }

    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Handles one delivery and returns the number of commands enqueued.
    ///
    /// Steps, each of which can end the request:
    ///
    /// 1. Reject while shutting down
    /// 2. Verify the signature before reading anything else
    /// 3. Parse the payload; irrelevant events enqueue nothing
    /// 4. Parse the comment body and enqueue one command per line, in order
    ///
    /// The request counts as in flight for the whole call.
    pub fn ingest(&self, delivery: Delivery<'_>) -> Result<usize, DispatchError> {
        let _in_flight = self.shutdown.enter();
        if self.shutdown.is_shutting_down() {
            debug!(delivery_id = ?delivery.delivery_id, "Rejecting webhook during shutdown");
            return Err(DispatchError::ShuttingDown);
        }

        if let Err(e) = verify_signature(delivery.body, delivery.signature, &self.secret) {
            warn!(delivery_id = ?delivery.delivery_id, error = %e, "Invalid webhook signature");
            return Err(e.into());
        }

        let event_type = delivery.event_type.ok_or(DispatchError::MissingEventType)?;
        let delivery_id = delivery.delivery_id.map(DeliveryId::new);

        let Some(event) = parse_webhook(event_type, delivery.body)? else {
            debug!(event_type, delivery_id = ?delivery_id, "Ignoring event");
            return Ok(0);
        };

        let parsed = parse_comment_body(&event.body);
        if parsed.is_empty() {
            return Ok(0);
        }

        let context = event.command_context(delivery_id);
        let count = parsed.len();
        for line in parsed {
            let command = Command::new(context.clone(), line);
            debug!(command = %command, "Enqueuing command");
            self.queue.add(CommandHandle::new(command));
        }

        info!(
            repo = %event.repo,
            issue = %event.issue,
            actor = %event.commenter,
            event_type,
            count,
            "Commands enqueued"
        );
        Ok(count)
    }
}
