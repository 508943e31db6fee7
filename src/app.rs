//! Command runners.
//!
//! Each subcommand is a plain async function taking the loaded `Config` and a
//! shutdown receiver, so the binary and the integration tests drive them the
//! same way.

use anyhow::{Context, Result};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::cli::Command;
use crate::config::Config;
use crate::poll::{self, PollConfig};
use crate::probe::{HttpProbe, ReadinessProbe};
use crate::server::GreetingServer;

/// Runs `command` to completion.
pub async fn run(command: Command, config: Config, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
    match command {
        Command::Wait { .. } => run_wait(&config, shutdown_rx).await.map(|_| ()),
        Command::Serve { .. } => run_serve(&config, shutdown_rx).await,
        Command::Demo { .. } => run_demo(&config, shutdown_rx).await.map(|_| ()),
    }
}

/// Polls `probe` until it reports ready. Returns how long that took.
///
/// Check errors count as "not ready yet". A shutdown signal ends the wait
/// early with an error.
pub async fn wait_for(
    probe: &dyn ReadinessProbe,
    poll_config: &PollConfig,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<Duration> {
    info!(
        url = probe.target(),
        interval_ms = poll_config.interval.as_millis() as u64,
        timeout_ms = poll_config.timeout.as_millis() as u64,
        "Waiting for readiness"
    );
    let start = Instant::now();
    poll::await_until_cancelled(poll_config, shutdown_rx, || probe.is_ready())
        .await
        .with_context(|| format!("{} did not become ready", probe.target()))?;
    let elapsed = start.elapsed();
    info!(url = probe.target(), elapsed_ms = elapsed.as_millis() as u64, "Ready");
    Ok(elapsed)
}

/// The `wait` command: poll the configured URL.
pub async fn run_wait(config: &Config, shutdown_rx: watch::Receiver<bool>) -> Result<Duration> {
    let probe = HttpProbe::new(&config.probe.url, config.probe.request_timeout())?
        .with_expected_status(config.probe.expected_status()?);
    wait_for(&probe, &config.poll.to_poll_config(), shutdown_rx).await
}

/// The `serve` command: run the greeting server until shutdown.
pub async fn run_serve(config: &Config, mut shutdown_rx: watch::Receiver<bool>) -> Result<()> {
    let server = GreetingServer::bind(config.server.listen_addr()?)
        .await?
        .with_startup_delay(config.server.startup_delay())
        .with_greeting(config.server.greeting.clone());
    let handle = server.spawn();
    info!(url = %handle.url(), "Serving. Press Ctrl-C to stop.");

    // A closed channel also means shutdown.
    let _ = shutdown_rx.changed().await;
    handle.shutdown().await.context("greeting server did not stop cleanly")
}

/// The `demo` command: start a greeting server that takes
/// `server.startup_delay_ms` to become ready on an ephemeral port, then wait
/// for it by polling instead of sleeping. Returns how long the wait took.
pub async fn run_demo(config: &Config, shutdown_rx: watch::Receiver<bool>) -> Result<Duration> {
    let server = GreetingServer::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
        .await?
        .with_startup_delay(config.server.startup_delay())
        .with_greeting(config.server.greeting.clone());
    let handle = server.spawn();

    let probe = HttpProbe::new(&handle.url(), config.probe.request_timeout())?;
    let outcome = wait_for(&probe, &config.poll.to_poll_config(), shutdown_rx).await;

    if let Err(e) = handle.shutdown().await {
        warn!(error = %e, "Greeting server did not stop cleanly");
    }
    let elapsed = outcome?;
    info!(
        startup_delay_ms = config.server.startup_delay_ms,
        waited_ms = elapsed.as_millis() as u64,
        "Demo finished: polling returned as soon as the server was ready"
    );
    Ok(elapsed)
}
