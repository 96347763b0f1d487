//! Startup configuration.
//!
//! Every setting is a command-line flag with an environment fallback, so the
//! bot can be configured either way in a container. Secrets never appear in
//! `Debug` output.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::server::DrainConfig;
use crate::worker::{BackoffConfig, WorkerConfig};

/// GitHub bot that executes slash commands from issue and pull request comments.
#[derive(Parser, Debug)]
#[command(name = "slash-bot", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Start the webhook service.
    Webhook(Config),
}

/// Settings for the webhook service.
#[derive(Args, Clone)]
pub struct Config {
    /// Token used to access the GitHub API.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Secret used to validate GitHub webhook deliveries.
    #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Address to listen on.
    #[arg(long, env = "SLASH_BOT_LISTEN", default_value = "0.0.0.0:11111")]
    pub listen: SocketAddr,

    /// Number of concurrent workers executing commands.
    #[arg(long, env = "SLASH_BOT_WORKERS", default_value_t = 1)]
    pub workers: usize,

    /// Retries allowed per command before it is abandoned.
    #[arg(long, default_value_t = crate::worker::DEFAULT_MAX_REQUEUES)]
    pub max_requeues: u32,

    /// Delay before the first retry, in milliseconds.
    #[arg(long, default_value_t = 100)]
    pub backoff_base_ms: u64,

    /// Upper bound on the retry delay, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    pub backoff_max_ms: u64,

    /// Interval between in-flight checks while draining, in milliseconds.
    #[arg(long, default_value_t = 10)]
    pub drain_poll_ms: u64,

    /// How long workers get to finish queued commands at shutdown, in seconds.
    #[arg(long, default_value_t = 30)]
    pub drain_timeout_secs: u64,

    /// Bearer token required by the preset label endpoint. Open when unset.
    #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: Option<String>,
}

/// A configuration that cannot work.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("GitHub token must not be empty")]
    EmptyToken,

    #[error("webhook secret must not be empty")]
    EmptySecret,

    #[error("at least one worker is required")]
    NoWorkers,

    #[error("backoff base ({base_ms}ms) exceeds backoff cap ({max_ms}ms)")]
    BackoffInverted { base_ms: u64, max_ms: u64 },

    #[error("backoff base must be positive")]
    ZeroBackoff,

    #[error("drain poll interval must be positive")]
    ZeroDrainPoll,
}

impl Config {
    /// Rejects settings that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }
        if self.secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.backoff_base_ms == 0 {
            return Err(ConfigError::ZeroBackoff);
        }
        if self.backoff_base_ms > self.backoff_max_ms {
            return Err(ConfigError::BackoffInverted {
                base_ms: self.backoff_base_ms,
                max_ms: self.backoff_max_ms,
            });
        }
        if self.drain_poll_ms == 0 {
            return Err(ConfigError::ZeroDrainPoll);
        }
        Ok(())
    }

    pub fn backoff(&self) -> BackoffConfig {
        BackoffConfig {
            base_delay: Duration::from_millis(self.backoff_base_ms),
            max_delay: Duration::from_millis(self.backoff_max_ms),
            ..BackoffConfig::DEFAULT
        }
    }

    /// Configuration for the worker with the given index.
    pub fn worker(&self, id: usize) -> WorkerConfig {
        WorkerConfig {
            id,
            max_requeues: self.max_requeues,
        }
    }

    pub fn drain_poll(&self) -> Duration {
        Duration::from_millis(self.drain_poll_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }

    pub fn drain(&self) -> DrainConfig {
        DrainConfig {
            poll: self.drain_poll(),
            timeout: self.drain_timeout(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("secret", &"<redacted>")
            .field("listen", &self.listen)
            .field("workers", &self.workers)
            .field("max_requeues", &self.max_requeues)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("backoff_max_ms", &self.backoff_max_ms)
            .field("drain_poll_ms", &self.drain_poll_ms)
            .field("drain_timeout_secs", &self.drain_timeout_secs)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
