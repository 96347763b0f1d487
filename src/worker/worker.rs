//! The worker loop: executes queued commands and applies the retry policy.
//!
//! # Per-Item Flow
//!
//! 1. Take the next command from the queue (suspends while it is empty)
//! 2. Look up its handler; unknown commands are forgotten silently
//! 3. Run the handler on its own task, so a panic cannot take the loop down
//! 4. Settle the outcome:
//!    - handled or invalid: forget the command
//!    - transient failure: requeue with backoff, or give up once the
//!      command has been requeued `max_requeues` times
//! 5. Hand the command back to the queue, whatever happened above
//!
//! This is the only place retry policy lives; handlers and the queue only
//! supply outcomes and primitives.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::commands::CommandHandle;
use crate::github::GitHubApi;
use crate::handlers::{HandlerKind, HandlerRegistry, Outcome};

use super::queue::RateLimitedQueue;

/// Default number of requeues before a failing command is abandoned.
pub const DEFAULT_MAX_REQUEUES: u32 = 10;

/// Worker configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Identifies the worker in logs when several share a queue.
    pub id: usize,

    /// Requeues allowed per command before it is abandoned.
    pub max_requeues: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            id: 0,
            max_requeues: DEFAULT_MAX_REQUEUES,
        }
    }
}

/// What happened to one dequeued command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// No handler is registered under the command's name.
    Unrecognized,

    /// The handler finished with a terminal outcome.
    Completed(Outcome),

    /// The handler failed transiently; the command will be redelivered.
    /// `requeues` counts this requeue.
    Requeued { requeues: u32 },

    /// The handler kept failing and the command was dropped.
    Abandoned,
}

/// Returns the item to the queue when dropped, so `done` runs on every path.
struct ProcessingGuard<'a> {
    queue: &'a RateLimitedQueue<CommandHandle>,
    item: &'a CommandHandle,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.queue.done(self.item);
    }
}

/// Pulls commands from a shared queue and executes them.
pub struct Worker<G> {
    config: WorkerConfig,
    queue: Arc<RateLimitedQueue<CommandHandle>>,
    registry: Arc<HandlerRegistry>,
    github: Arc<G>,
}

impl<G: GitHubApi + 'static> Worker<G> {
    pub fn new(
        config: WorkerConfig,
        queue: Arc<RateLimitedQueue<CommandHandle>>,
        registry: Arc<HandlerRegistry>,
        github: Arc<G>,
    ) -> Self {
        Self {
            config,
            queue,
            registry,
            github,
        }
    }

    /// Processes commands until the queue shuts down and runs dry.
    #[instrument(skip(self), fields(worker = self.config.id))]
    pub async fn run(self) {
        info!("Worker started");
        while self.process_next().await.is_some() {}
        info!("Worker stopped");
    }

    /// Processes one command. Returns `None` once the queue has shut down and
    /// holds nothing more.
    pub async fn process_next(&self) -> Option<Disposition> {
        let item = self.queue.get().await?;
        let _done = ProcessingGuard {
            queue: &self.queue,
            item: &item,
        };
        Some(self.process(&item).await)
    }

    #[instrument(
        skip_all,
        fields(
            repo = %item.repo(),
            issue = %item.issue(),
            command = %item.name,
            actor = %item.actor(),
        )
    )]
    async fn process(&self, item: &CommandHandle) -> Disposition {
        let Some(kind) = self.registry.lookup(&item.name) else {
            debug!("Ignoring unrecognized command");
            self.queue.forget(item);
            return Disposition::Unrecognized;
        };

        let outcome = self.execute(kind, item).await;
        match outcome {
            Outcome::Handled | Outcome::Invalid => {
                self.queue.forget(item);
                Disposition::Completed(outcome)
            }
            Outcome::TransientFailure => {
                let attempt = self.queue.num_requeues(item);
                if attempt < self.config.max_requeues {
                    self.queue.add_rate_limited(item.clone());
                    let requeues = attempt + 1;
                    debug!(requeues, "Requeued after transient failure");
                    Disposition::Requeued { requeues }
                } else {
                    error!(command = %item.command(), attempt, "Giving up on command");
                    self.queue.forget(item);
                    Disposition::Abandoned
                }
            }
        }
    }

    /// Runs the handler on a separate task and treats a panic as a transient
    /// failure.
    async fn execute(&self, kind: HandlerKind, item: &CommandHandle) -> Outcome {
        let github = Arc::clone(&self.github);
        let command = item.clone();
        let task = tokio::spawn(async move { kind.run(github.as_ref(), &command).await });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => {
                warn!(error = %e, "Handler panicked");
                Outcome::TransientFailure
            }
            Err(e) => {
                warn!(error = %e, "Handler task was cancelled");
                Outcome::TransientFailure
            }
        }
    }
}
