use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slash_bot::config::{Cli, CliCommand, Config};
use slash_bot::github::OctocrabClient;
use slash_bot::handlers::HandlerRegistry;
use slash_bot::server::{AppState, build_router, run_until_shutdown};
use slash_bot::shutdown::ShutdownCoordinator;
use slash_bot::webhooks::Dispatcher;
use slash_bot::worker::{RateLimitedQueue, Worker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slash_bot=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command {
        CliCommand::Webhook(config) => serve(config).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;
    info!(config = ?config, "Starting slash command bot");

    let github = Arc::new(OctocrabClient::from_token(&config.token)?);
    let queue = Arc::new(RateLimitedQueue::new(config.backoff()));
    let shutdown = Arc::new(ShutdownCoordinator::new());
    let registry = Arc::new(HandlerRegistry::standard());

    let mut workers = JoinSet::new();
    for id in 0..config.workers {
        let worker = Worker::new(
            config.worker(id),
            Arc::clone(&queue),
            Arc::clone(&registry),
            Arc::clone(&github),
        );
        workers.spawn(worker.run());
    }

    tokio::spawn(watch_signals(Arc::clone(&shutdown)));

    let dispatcher = Dispatcher::new(
        Arc::clone(&queue),
        Arc::clone(&shutdown),
        config.secret.as_bytes(),
    );
    let app = build_router(AppState::new(
        dispatcher,
        Arc::clone(&github),
        config.admin_token.clone(),
    ));

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!(addr = %config.listen, "Listening");

    let report = run_until_shutdown(listener, app, shutdown, queue, workers, config.drain())
        .await
        .context("HTTP server failed")?;
    if !report.workers_finished {
        warn!("Exited with unfinished commands");
    }
    Ok(())
}

/// Starts graceful shutdown on the first SIGINT or SIGTERM and exits
/// immediately on the second.
async fn watch_signals(shutdown: Arc<ShutdownCoordinator>) {
    if let Err(e) = wait_for_signal().await {
        error!(error = %e, "Failed to install signal handlers");
        return;
    }
    shutdown.begin_shutdown();

    if wait_for_signal().await.is_ok() {
        warn!("Second signal received, exiting immediately");
        std::process::exit(1);
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
