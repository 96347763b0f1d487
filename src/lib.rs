//! Slash Bot - A GitHub bot that executes slash commands from issue and pull
//! request comments.
//!
//! Webhook deliveries are authenticated and parsed into commands by the
//! [`webhooks::Dispatcher`], queued on a [`worker::RateLimitedQueue`], and
//! executed by [`worker::Worker`]s through the [`handlers::HandlerRegistry`].
//! Transient GitHub failures are retried with exponential backoff.

pub mod commands;
pub mod config;
pub mod github;
pub mod handlers;
pub mod server;
pub mod shutdown;
pub mod types;
pub mod webhooks;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_utils;
