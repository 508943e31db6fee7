//! Configuration management for awaitility
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer, from lowest to highest precedence: built-in
//! defaults, an optional TOML file, `AWAITILITY_`-prefixed environment
//! variables (`__` separates nesting levels, e.g.
//! `AWAITILITY_POLL__TIMEOUT_MS=750`), and command-line flags.

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::cli::Cli;
use crate::poll::PollConfig;
use crate::server::DEFAULT_GREETING;

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level, used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Polling interval and timeout budget.
    pub poll: PollSettings,
    /// Settings for the demo greeting server.
    pub server: ServerConfig,
    /// Settings for the HTTP readiness probe.
    pub probe: ProbeConfig,
}

/// Polling interval and timeout budget, in milliseconds.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PollSettings {
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

impl PollSettings {
    pub fn to_poll_config(&self) -> PollConfig {
        PollConfig::new(
            Duration::from_millis(self.interval_ms),
            Duration::from_millis(self.timeout_ms),
        )
    }
}

/// Settings for the demo greeting server.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the `serve` command listens on.
    pub listen_addr: String,
    /// How long the server answers 503 before it becomes ready.
    pub startup_delay_ms: u64,
    /// Body returned once ready.
    pub greeting: String,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .with_context(|| format!("invalid server.listen_addr '{}'", self.listen_addr))
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

/// Settings for the HTTP readiness probe.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProbeConfig {
    /// URL the `wait` command polls.
    pub url: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Status code that counts as ready.
    pub expected_status: u16,
}

impl ProbeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn expected_status(&self) -> Result<StatusCode> {
        StatusCode::from_u16(self.expected_status)
            .with_context(|| format!("invalid probe.expected_status {}", self.expected_status))
    }
}

impl Config {
    /// Loads the configuration by layering defaults, the file named on the
    /// command line (if any), the environment, and the command-line flags.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(path) = &cli.config {
            if !path.exists() {
                bail!("configuration file not found: {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: Config = figment
            .merge(Env::prefixed("AWAITILITY_").split("__"))
            .merge(cli.clone())
            .extract()
            .context("failed to parse configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would only fail later, at first use.
    pub fn validate(&self) -> Result<()> {
        self.server.listen_addr()?;
        if !(100..=599).contains(&self.probe.expected_status) {
            bail!(
                "probe.expected_status must be between 100 and 599, got {}",
                self.probe.expected_status
            );
        }
        if self.probe.request_timeout_ms == 0 {
            bail!("probe.request_timeout_ms must be greater than zero");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            poll: PollSettings {
                interval_ms: 100,
                timeout_ms: 5000,
            },
            server: ServerConfig {
                listen_addr: "127.0.0.1:8080".to_string(),
                startup_delay_ms: 3000,
                greeting: DEFAULT_GREETING.to_string(),
            },
            probe: ProbeConfig {
                url: "http://127.0.0.1:8080/".to_string(),
                request_timeout_ms: 1000,
                expected_status: 200,
            },
        }
    }
}
