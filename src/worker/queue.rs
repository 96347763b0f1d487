//! Rate-limited work queue for commands awaiting execution.
//!
//! The queue hands items to workers one at a time and keeps three promises:
//!
//! - **Coalescing**: an item that is already queued is not queued twice, and an
//!   item added while a worker holds it is delivered again only after the
//!   worker calls [`RateLimitedQueue::done`].
//! - **Delayed redelivery**: [`RateLimitedQueue::add_rate_limited`] parks the
//!   item until its backoff delay has passed. The delay is realized inside
//!   [`RateLimitedQueue::get`], so workers never sleep on behalf of an item.
//! - **Failure bookkeeping**: the queue counts requeues per item but never
//!   decides to give up; that policy belongs to the worker loop.
//!
//! Items are identified by `Eq + Hash`. Commands are queued as
//! [`CommandHandle`](crate::commands::CommandHandle)s, which compare by
//! identity.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use super::backoff::{BackoffConfig, ItemBackoff};

/// An unbounded FIFO queue with coalescing and per-item backoff.
///
/// Share it between producers and workers behind an `Arc`.
#[derive(Debug)]
pub struct RateLimitedQueue<T> {
    state: Mutex<QueueState<T>>,
    notify: Notify,
}

#[derive(Debug)]
struct QueueState<T> {
    /// Items ready for delivery, in order.
    ready: VecDeque<T>,

    /// Items that need processing: everything in `ready`, plus items re-added
    /// while a worker held them.
    dirty: HashSet<T>,

    /// Items currently held by a worker.
    processing: HashSet<T>,

    /// Items parked until a deadline, keyed by (deadline, sequence) so that
    /// equal deadlines keep insertion order.
    waiting: BTreeMap<(Instant, u64), T>,

    /// Reverse index of `waiting`, used to coalesce delayed adds.
    waiting_keys: HashMap<T, (Instant, u64)>,

    next_sequence: u64,

    backoff: ItemBackoff<T>,

    shutting_down: bool,
}

impl<T: Eq + Hash + Clone> QueueState<T> {
    /// Marks the item as needing processing. Returns true if it was appended
    /// to `ready`.
    fn insert(&mut self, item: T) -> bool {
        if self.shutting_down || self.dirty.contains(&item) {
            return false;
        }
        self.dirty.insert(item.clone());
        if self.processing.contains(&item) {
            // Delivered again once the current holder calls done().
            return false;
        }
        self.ready.push_back(item);
        true
    }

    /// Moves every parked item whose deadline has passed into `ready`.
    fn promote_due(&mut self, now: Instant) {
        while let Some(entry) = self.waiting.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let item = entry.remove();
            self.waiting_keys.remove(&item);
            self.insert(item);
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.waiting.keys().next().map(|(deadline, _)| *deadline)
    }

    fn park(&mut self, item: T, deadline: Instant) {
        if let Some(existing) = self.waiting_keys.get(&item).copied() {
            if existing.0 <= deadline {
                return;
            }
            self.waiting.remove(&existing);
        }
        let key = (deadline, self.next_sequence);
        self.next_sequence += 1;
        self.waiting.insert(key, item.clone());
        self.waiting_keys.insert(item, key);
    }
}

impl<T: Eq + Hash + Clone> RateLimitedQueue<T> {
    /// Creates an empty queue using the given backoff for requeued items.
    pub fn new(backoff: BackoffConfig) -> Self {
        RateLimitedQueue {
            state: Mutex::new(QueueState {
                ready: VecDeque::new(),
                dirty: HashSet::new(),
                processing: HashSet::new(),
                waiting: BTreeMap::new(),
                waiting_keys: HashMap::new(),
                next_sequence: 0,
                backoff: ItemBackoff::new(backoff),
                shutting_down: false,
            }),
            notify: Notify::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, QueueState<T>> {
        // The state stays consistent across a panicking holder: every method
        // finishes its mutations before doing anything that can panic.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues an item for immediate processing.
    ///
    /// Adding an item that is already queued, or already re-added while being
    /// processed, has no effect. Ignored once the queue is shutting down.
    pub fn add(&self, item: T) {
        let pushed = self.state().insert(item);
        if pushed {
            self.notify.notify_one();
        }
    }

    /// Queues an item once `delay` has elapsed.
    ///
    /// If the item is already parked, the earlier deadline wins.
    pub fn add_after(&self, item: T, delay: Duration) {
        if delay.is_zero() {
            self.add(item);
            return;
        }
        {
            let mut state = self.state();
            if state.shutting_down {
                return;
            }
            state.park(item, Instant::now() + delay);
        }
        // Wake a sleeping worker so it re-arms its timer for the new deadline.
        self.notify.notify_one();
    }

    /// Queues an item after its current backoff delay and counts one more
    /// requeue against it.
    pub fn add_rate_limited(&self, item: T) {
        let delay = self.state().backoff.when(&item);
        self.add_after(item, delay);
    }

    /// Clears the item's requeue count, so its next failure starts from the
    /// base delay again.
    pub fn forget(&self, item: &T) {
        self.state().backoff.forget(item);
    }

    /// How many times the item has been requeued since it was last forgotten.
    pub fn num_requeues(&self, item: &T) -> u32 {
        self.state().backoff.num_requeues(item)
    }

    /// Waits for the next item and marks it as being processed.
    ///
    /// Returns `None` once the queue is shutting down and holds no ready
    /// items. Every returned item must be handed back through
    /// [`RateLimitedQueue::done`].
    pub async fn get(&self) -> Option<T> {
        loop {
            // Register interest before inspecting the state so that an add()
            // or shut_down() racing with this check still wakes us.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let deadline = {
                let mut state = self.state();
                if !state.shutting_down {
                    state.promote_due(Instant::now());
                }
                if let Some(item) = state.ready.pop_front() {
                    state.dirty.remove(&item);
                    state.processing.insert(item.clone());
                    if !state.ready.is_empty() {
                        self.notify.notify_one();
                    }
                    return Some(item);
                }
                if state.shutting_down {
                    return None;
                }
                state.next_deadline()
            };

            match deadline {
                Some(deadline) => {
                    tokio::select! {
                        _ = &mut notified => {}
                        _ = tokio::time::sleep_until(deadline) => {}
                    }
                }
                None => notified.await,
            }
        }
    }

    /// Hands an item back after processing, whatever the outcome.
    ///
    /// If the item was added again while it was being processed, it is queued
    /// now.
    pub fn done(&self, item: &T) {
        let requeued = {
            let mut state = self.state();
            state.processing.remove(item);
            if state.dirty.contains(item) {
                state.ready.push_back(item.clone());
                true
            } else {
                false
            }
        };
        if requeued {
            self.notify.notify_one();
        }
    }

    /// Stops accepting items.
    ///
    /// Items already ready are still handed out by [`RateLimitedQueue::get`];
    /// parked retries are dropped. Once `ready` is empty, every `get` returns
    /// `None`.
    pub fn shut_down(&self) {
        {
            let mut state = self.state();
            state.shutting_down = true;
            state.waiting.clear();
            state.waiting_keys.clear();
        }
        self.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.state().shutting_down
    }

    /// Number of items ready for delivery.
    pub fn len(&self) -> usize {
        self.state().ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of items parked for delayed redelivery.
    pub fn pending_retries(&self) -> usize {
        self.state().waiting.len()
    }

    /// Number of items currently held by workers.
    pub fn in_progress(&self) -> usize {
        self.state().processing.len()
    }
}

impl<T: Eq + Hash + Clone> Default for RateLimitedQueue<T> {
    fn default() -> Self {
        Self::new(BackoffConfig::DEFAULT)
    }
}
