#![allow(dead_code)]
//! Shared fixtures for the integration tests.

use awaitility::server::{GreetingServer, ServerHandle};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Initializes a test-friendly subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("awaitility=debug")
        .with_test_writer()
        .try_init();
}

/// Spawns a greeting server on an ephemeral loopback port.
pub async fn start_server(startup_delay: Duration) -> ServerHandle {
    GreetingServer::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
        .await
        .expect("failed to bind greeting server")
        .with_startup_delay(startup_delay)
        .spawn()
}

/// Milliseconds as a `Duration`.
pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}
