//! Serving until shutdown, then stopping in order.
//!
//! Shutdown has two triggers that must not be conflated: the
//! [`ShutdownCoordinator`] flag, which makes the dispatcher answer 503, and
//! the HTTP server's own graceful stop, which closes the listener. The
//! listener stays open until in-flight deliveries have drained, so senders
//! see a 503 rather than a refused connection.

use std::future::IntoFuture;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::commands::CommandHandle;
use crate::shutdown::ShutdownCoordinator;
use crate::worker::RateLimitedQueue;

/// Timing of the shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainConfig {
    /// Interval between in-flight checks.
    pub poll: Duration,

    /// How long workers get to finish ready commands before being aborted.
    pub timeout: Duration,
}

/// What happened while shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Delayed retries discarded when the queue shut down.
    pub dropped_retries: usize,

    /// False when workers were aborted at the drain timeout.
    pub workers_finished: bool,
}

/// Serves `router` until shutdown begins, then:
///
/// 1. Keeps serving while in-flight webhook requests drain (new ones get 503)
/// 2. Stops the HTTP server gracefully
/// 3. Shuts the queue down, so workers finish ready commands and exit
/// 4. Waits up to `drain.timeout` for workers, aborting any that remain
pub async fn run_until_shutdown(
    listener: TcpListener,
    router: axum::Router,
    shutdown: Arc<ShutdownCoordinator>,
    queue: Arc<RateLimitedQueue<CommandHandle>>,
    mut workers: JoinSet<()>,
    drain: DrainConfig,
) -> io::Result<ShutdownReport> {
    let stop_http = CancellationToken::new();
    let mut server = tokio::spawn(
        axum::serve(listener, router)
            .with_graceful_shutdown(stop_http.clone().cancelled_owned())
            .into_future(),
    );

    tokio::select! {
        result = &mut server => {
            queue.shut_down();
            workers.shutdown().await;
            result.map_err(io::Error::other)??;
            return Err(io::Error::other("HTTP server stopped before shutdown was requested"));
        }
        _ = shutdown.cancelled() => {}
    }

    info!("Waiting for in-flight webhook requests");
    shutdown.wait_for_drain(drain.poll).await;
    stop_http.cancel();
    server.await.map_err(io::Error::other)??;

    let dropped_retries = queue.pending_retries();
    queue.shut_down();
    info!(queued = queue.len(), dropped_retries, "Draining workers");

    let workers_finished = tokio::time::timeout(drain.timeout, async {
        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Worker task failed");
            }
        }
    })
    .await
    .is_ok();

    if !workers_finished {
        warn!(
            remaining = queue.len(),
            timeout = ?drain.timeout,
            "Workers did not finish in time; aborting"
        );
        workers.shutdown().await;
    }

    info!("Shutdown complete");
    Ok(ShutdownReport {
        dropped_retries,
        workers_finished,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use reqwest::StatusCode;
    use serde_json::json;
    use tokio::task::JoinHandle;

    use crate::handlers::HandlerRegistry;
    use crate::server::{AppState, build_router};
    use crate::test_utils::{MockGitHub, TEST_ORG, TEST_REPO};
    use crate::webhooks::{Dispatcher, compute_signature, format_signature_header};
    use crate::worker::{BackoffConfig, Worker, WorkerConfig};

    const SECRET: &[u8] = b"lifecycle-secret";
    const WAIT: Duration = Duration::from_secs(5);

    struct Running {
        addr: SocketAddr,
        shutdown: Arc<ShutdownCoordinator>,
        queue: Arc<RateLimitedQueue<CommandHandle>>,
        github: Arc<MockGitHub>,
        handle: JoinHandle<io::Result<ShutdownReport>>,
        client: reqwest::Client,
    }

    async fn start(github: MockGitHub, drain_timeout: Duration) -> Running {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Retries stay parked for the whole test.
        let backoff = BackoffConfig::new(Duration::from_secs(60), Duration::from_secs(60), 2.0);
        let queue = Arc::new(RateLimitedQueue::new(backoff));
        let shutdown = Arc::new(ShutdownCoordinator::new());
        let github = Arc::new(github);

        let mut workers = JoinSet::new();
        let worker = Worker::new(
            WorkerConfig::default(),
            Arc::clone(&queue),
            Arc::new(HandlerRegistry::standard()),
            Arc::clone(&github),
        );
        workers.spawn(worker.run());

        let dispatcher = Dispatcher::new(Arc::clone(&queue), Arc::clone(&shutdown), SECRET);
        let router = build_router(AppState::new(dispatcher, Arc::clone(&github), None));
        let handle = tokio::spawn(run_until_shutdown(
            listener,
            router,
            Arc::clone(&shutdown),
            Arc::clone(&queue),
            workers,
            DrainConfig {
                poll: Duration::from_millis(10),
                timeout: drain_timeout,
            },
        ));

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .unwrap();

        Running {
            addr,
            shutdown,
            queue,
            github,
            handle,
            client,
        }
    }

    impl Running {
        async fn post_comment(&self, body: &str) -> reqwest::Result<StatusCode> {
            let payload = serde_json::to_vec(&json!({
                "action": "created",
                "comment": { "body": body, "user": { "login": "bob" } },
                "issue": { "number": 42, "user": { "login": "alice" } },
                "repository": {
                    "name": TEST_REPO,
                    "owner": { "login": TEST_ORG, "type": "Organization" }
                }
            }))
            .unwrap();
            let signature = format_signature_header(&compute_signature(&payload, SECRET));

            let response = self
                .client
                .post(format!("http://{}/webhook", self.addr))
                .header("x-github-event", "issue_comment")
                .header("x-github-delivery", "delivery-1")
                .header("x-hub-signature-256", signature)
                .body(payload)
                .send()
                .await?;
            Ok(response.status())
        }

        async fn health(&self) -> reqwest::Result<StatusCode> {
            let response = self
                .client
                .get(format!("http://{}/health", self.addr))
                .send()
                .await?;
            Ok(response.status())
        }

        async fn finish(self) -> ShutdownReport {
            tokio::time::timeout(WAIT, self.handle)
                .await
                .expect("shutdown should complete")
                .unwrap()
                .unwrap()
        }
    }

    async fn eventually(condition: impl Fn() -> bool) {
        tokio::time::timeout(WAIT, async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition should become true");
    }

    #[tokio::test]
    async fn new_deliveries_get_503_while_draining() {
        let running = start(MockGitHub::new(), WAIT).await;

        assert_eq!(running.post_comment("/hold").await.unwrap(), StatusCode::OK);
        eventually(|| running.github.call_count() == 1).await;

        // A request still being ingested keeps the server draining.
        let in_flight = running.shutdown.enter();
        running.shutdown.begin_shutdown();

        assert_eq!(
            running.post_comment("/wip").await.unwrap(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            running.health().await.unwrap(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert!(!running.handle.is_finished());

        drop(in_flight);
        let addr = running.addr;
        let client = running.client.clone();
        let github = Arc::clone(&running.github);
        let report = running.finish().await;

        assert!(report.workers_finished);
        assert_eq!(github.call_count(), 1, "rejected delivery must not run");
        assert!(
            client
                .get(format!("http://{addr}/health"))
                .send()
                .await
                .is_err(),
            "listener should be closed after shutdown"
        );
    }

    #[tokio::test]
    async fn pending_retries_are_dropped_at_shutdown() {
        let github = MockGitHub::new();
        github.fail_next(1);
        let running = start(github, WAIT).await;

        assert_eq!(running.post_comment("/hold").await.unwrap(), StatusCode::OK);
        eventually(|| running.queue.pending_retries() == 1).await;

        running.shutdown.begin_shutdown();
        let github = Arc::clone(&running.github);
        let report = running.finish().await;

        assert_eq!(report.dropped_retries, 1);
        assert!(report.workers_finished);
        assert_eq!(github.call_count(), 1);
    }

    #[tokio::test]
    async fn stuck_workers_are_aborted_at_the_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let queue = Arc::new(RateLimitedQueue::default());
        let shutdown = Arc::new(ShutdownCoordinator::new());
        let dispatcher = Dispatcher::new(Arc::clone(&queue), Arc::clone(&shutdown), SECRET);
        let router = build_router(AppState::new(
            dispatcher,
            Arc::new(MockGitHub::new()),
            None,
        ));

        let mut workers = JoinSet::new();
        workers.spawn(std::future::pending::<()>());
        shutdown.begin_shutdown();

        let report = tokio::time::timeout(
            WAIT,
            run_until_shutdown(
                listener,
                router,
                shutdown,
                queue,
                workers,
                DrainConfig {
                    poll: Duration::from_millis(10),
                    timeout: Duration::from_millis(50),
                },
            ),
        )
        .await
        .expect("shutdown should not hang")
        .unwrap();

        assert!(!report.workers_finished);
        assert_eq!(report.dropped_retries, 0);
    }
}
