//! Readiness probes.
//!
//! A probe answers "is the thing I am waiting for up yet?" and is the usual
//! predicate handed to the polling functions in [`crate::poll`]. The HTTP
//! probes issue a `GET` and compare the response status with an expected
//! code; connection failures are reported as errors so callers can choose
//! between treating them as "not yet" ([`ReadinessProbe::is_ready`]) or as a
//! distinct outcome ([`ReadinessProbe::check`]).

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

use crate::poll::{self, AwaitError, PollConfig, TimeoutError};

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("invalid probe URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("request failed")]
    Request(#[from] reqwest::Error),
}

/// A check that can be evaluated repeatedly until some service is ready.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Performs one check. `Ok(false)` means the service answered but is not
    /// ready; `Err` means the check could not be performed at all.
    async fn check(&self) -> Result<bool, ProbeError>;

    /// A human-readable description of what is being probed.
    fn target(&self) -> &str;

    /// Performs one check, folding any error into "not ready".
    async fn is_ready(&self) -> bool {
        match self.check().await {
            Ok(ready) => ready,
            Err(e) => {
                debug!(url = self.target(), error = %e, "Readiness check failed");
                false
            }
        }
    }
}

/// Polls `probe` until it reports ready, treating check errors as "not yet".
pub async fn wait_until_ready(
    probe: &dyn ReadinessProbe,
    config: &PollConfig,
) -> Result<(), TimeoutError> {
    poll::await_until(config, || probe.is_ready()).await
}

/// Polls `probe` until it reports ready, stopping on the first check error.
pub async fn wait_until_ready_strict(
    probe: &dyn ReadinessProbe,
    config: &PollConfig,
) -> Result<(), AwaitError<ProbeError>> {
    poll::try_await_until(config, || probe.check()).await
}

fn parse_url(url: &str) -> Result<Url, ProbeError> {
    Url::parse(url).map_err(|e| ProbeError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Readiness over HTTP: ready when `GET url` answers with the expected status.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    url: Url,
    expected_status: StatusCode,
}

impl HttpProbe {
    /// Creates a probe for `url`. Each request is abandoned after
    /// `request_timeout` so a hung server cannot stall the polling loop.
    pub fn new(url: &str, request_timeout: Duration) -> Result<Self, ProbeError> {
        let url = parse_url(url)?;
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(ProbeError::Client)?;
        Ok(Self {
            client,
            url,
            expected_status: StatusCode::OK,
        })
    }

    pub fn with_expected_status(mut self, status: StatusCode) -> Self {
        self.expected_status = status;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn expected_status(&self) -> StatusCode {
        self.expected_status
    }
}

#[async_trait]
impl ReadinessProbe for HttpProbe {
    async fn check(&self) -> Result<bool, ProbeError> {
        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        // Dropping the response releases the connection without reading the body.
        drop(response);
        trace!(url = %self.url, %status, "Probe response");
        Ok(status == self.expected_status)
    }

    fn target(&self) -> &str {
        self.url.as_str()
    }
}

/// Thread-blocking HTTP probe, for use with [`crate::poll::blocking`].
///
/// Like `reqwest::blocking` itself, this must not be created or used from
/// within an async runtime.
#[derive(Debug, Clone)]
pub struct BlockingHttpProbe {
    client: reqwest::blocking::Client,
    url: Url,
    expected_status: StatusCode,
}

impl BlockingHttpProbe {
    pub fn new(url: &str, request_timeout: Duration) -> Result<Self, ProbeError> {
        let url = parse_url(url)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(ProbeError::Client)?;
        Ok(Self {
            client,
            url,
            expected_status: StatusCode::OK,
        })
    }

    pub fn with_expected_status(mut self, status: StatusCode) -> Self {
        self.expected_status = status;
        self
    }

    pub fn check(&self) -> Result<bool, ProbeError> {
        let response = self.client.get(self.url.clone()).send()?;
        Ok(response.status() == self.expected_status)
    }

    pub fn is_ready(&self) -> bool {
        match self.check() {
            Ok(ready) => ready,
            Err(e) => {
                debug!(url = %self.url, error = %e, "Readiness check failed");
                false
            }
        }
    }

    /// Blocks until the probe reports ready or the budget runs out.
    pub fn wait_until_ready(&self, config: &PollConfig) -> Result<(), TimeoutError> {
        poll::blocking::await_until(config, || self.is_ready())
    }
}
