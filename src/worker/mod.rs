//! Command execution: the rate-limited queue and the workers draining it.
//!
//! # Module Structure
//!
//! - [`backoff`]: per-item exponential backoff
//! - [`queue`]: coalescing work queue with delayed redelivery
//! - [`worker`]: the loop that executes commands and applies retry policy

pub mod backoff;
pub mod queue;
pub mod worker;


pub use backoff::{BackoffConfig, ItemBackoff};
pub use queue::RateLimitedQueue;
pub use worker::{DEFAULT_MAX_REQUEUES, Disposition, Worker, WorkerConfig};
