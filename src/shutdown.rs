//! Coordinated graceful shutdown.
//!
//! The coordinator owns the two pieces of state shared by every webhook
//! request: a one-way "shutting down" flag and a count of requests currently
//! being handled. Requests register themselves with [`ShutdownCoordinator::enter`]
//! and are counted until the returned guard drops, on every exit path.
//!
//! Shutdown sequence:
//!
//! 1. [`ShutdownCoordinator::begin_shutdown`] flips the flag; new requests see
//!    it and are rejected
//! 2. [`ShutdownCoordinator::wait_for_drain`] polls until the in-flight count
//!    reaches zero

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, info};

/// Default interval between in-flight checks while draining.
pub const DEFAULT_DRAIN_POLL: Duration = Duration::from_millis(10);

/// Tracks in-flight webhook requests and the shutdown flag.
///
/// Share it behind an `Arc`; independent instances do not interact.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    shutting_down: AtomicBool,
    in_flight: AtomicUsize,
    cancel: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a request as in flight until the returned guard drops.
    ///
    /// Callers check [`ShutdownCoordinator::is_shutting_down`] after entering,
    /// so a request that slips in while the flag flips is still waited for.
    pub fn enter(&self) -> InFlightGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard { coordinator: self }
    }

    /// Number of requests currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Flips the shutdown flag. Returns true for the call that flipped it.
    pub fn begin_shutdown(&self) -> bool {
        let first = !self.shutting_down.swap(true, Ordering::SeqCst);
        if first {
            info!(in_flight = self.in_flight(), "Shutdown requested");
            self.cancel.cancel();
        }
        first
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown has begun.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Waits until no request is in flight, checking every `poll`.
    ///
    /// Returns immediately if nothing is in flight. Only meaningful after
    /// [`ShutdownCoordinator::begin_shutdown`]; before that, new requests can
    /// keep the count above zero indefinitely.
    pub async fn wait_for_drain(&self, poll: Duration) {
        let mut interval = tokio::time::interval(poll);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let in_flight = self.in_flight();
            if in_flight == 0 {
                info!("In-flight requests drained");
                return;
            }
            debug!(in_flight, "Waiting for in-flight requests");
        }
    }
}

/// Keeps one request counted as in flight.
#[derive(Debug)]
#[must_use = "the request stops being counted when the guard drops"]
pub struct InFlightGuard<'a> {
    coordinator: &'a ShutdownCoordinator,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
