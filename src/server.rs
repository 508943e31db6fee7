//! # Greeting Server
//!
//! A tiny `axum` HTTP server used as the "asynchronous operation" a caller
//! waits for. It answers `GET /` with a greeting once it is ready and with
//! `503 Service Unavailable` before that, so a client polling it sees the same
//! progression as one waiting on a real service that takes a while to start.
//!
//! Each server is an independent value with its own listener and lifecycle:
//! bind it (port 0 for an ephemeral port), optionally give it a startup delay,
//! `spawn` it, and stop it through the returned [`ServerHandle`]. Nothing is
//! global, so any number of servers can run side by side in tests.

use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::future::IntoFuture;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, trace};

pub const DEFAULT_GREETING: &str = "Hello, world!";

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("server stopped with an error")]
    Serve(#[source] io::Error),

    #[error("server task panicked or was aborted")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
struct GreetingState {
    ready: Arc<AtomicBool>,
    greeting: Arc<str>,
}

async fn greet(State(state): State<GreetingState>) -> (StatusCode, String) {
    if state.ready.load(Ordering::SeqCst) {
        (StatusCode::OK, state.greeting.to_string())
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "starting".to_string())
    }
}

/// A bound but not yet running greeting server.
pub struct GreetingServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    startup_delay: Duration,
    greeting: String,
}

impl GreetingServer {
    /// Binds the listener. Connections are accepted as soon as the server is
    /// spawned; readiness is governed separately by the startup delay.
    pub async fn bind(addr: SocketAddr) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self {
            listener,
            local_addr,
            startup_delay: Duration::ZERO,
            greeting: DEFAULT_GREETING.to_string(),
        })
    }

    /// Answer 503 for this long after spawning before switching to 200.
    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts serving on the current tokio runtime.
    pub fn spawn(self) -> ServerHandle {
        let ready = Arc::new(AtomicBool::new(self.startup_delay.is_zero()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = GreetingState {
            ready: ready.clone(),
            greeting: Arc::from(self.greeting),
        };
        let app = Router::new().route("/", get(greet)).with_state(state);

        info!(
            addr = %self.local_addr,
            startup_delay_ms = self.startup_delay.as_millis() as u64,
            "Greeting server starting"
        );
        let task = tokio::spawn(run(
            self.listener,
            app,
            ready.clone(),
            self.startup_delay,
            shutdown_rx,
        ));

        ServerHandle {
            local_addr: self.local_addr,
            ready,
            shutdown_tx,
            task,
        }
    }
}

async fn run(
    listener: TcpListener,
    app: Router,
    ready: Arc<AtomicBool>,
    startup_delay: Duration,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let mut serve_shutdown = shutdown_rx.clone();
    let mut ready_shutdown = shutdown_rx;

    let serve = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            // A dropped handle closes the channel, which also ends the server.
            let _ = serve_shutdown.changed().await;
            trace!("Greeting server received shutdown signal.");
        })
        .into_future();

    let become_ready = async move {
        if ready.load(Ordering::SeqCst) {
            return;
        }
        tokio::select! {
            biased;
            _ = ready_shutdown.changed() => {}
            _ = tokio::time::sleep(startup_delay) => {
                ready.store(true, Ordering::SeqCst);
                info!("Greeting server is ready.");
            }
        }
    };

    let (result, ()) = tokio::join!(serve, become_ready);
    trace!("Greeting server task finished.");
    result.map_err(|e| {
        error!("Greeting server error: {}", e);
        ServerError::Serve(e)
    })
}

/// Handle to a running [`GreetingServer`].
///
/// Dropping the handle without calling [`ServerHandle::shutdown`] also stops
/// the server, but does not wait for it.
pub struct ServerHandle {
    local_addr: SocketAddr,
    ready: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<Result<(), ServerError>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Base URL of the server, e.g. `http://127.0.0.1:41234/`.
    pub fn url(&self) -> String {
        format!("http://{}/", self.local_addr)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Switches the server to ready without waiting for the startup delay.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    /// Signals the server to stop and waits for it to finish.
    pub async fn shutdown(self) -> Result<(), ServerError> {
        let _ = self.shutdown_tx.send(true);
        let result = self.task.await?;
        info!(addr = %self.local_addr, "Greeting server stopped");
        result
    }
}
