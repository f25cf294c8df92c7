use std::time::{Duration, Instant};

use async_trait::async_trait;
use hperf_common::{Failure, HperfError, Outcome, Result, Target};
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Version};

/// Performs one request attempt against a target.
///
/// Implementations never fail: transport problems are reported inside the
/// returned [`Outcome`]. The outcome's `index` is left at 0 for the caller to assign.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn fetch(&self, target: &Target) -> Outcome;
}

/// HTTP executor configuration
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Total deadline for one request; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// `RequestExecutor` backed by a single pooled `reqwest::Client`.
pub struct HttpExecutor {
    pub config: ClientConfig,
    http_client: reqwest::Client,
}

impl HttpExecutor {
    /// Create a new executor with the given configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| HperfError::ClientBuild(e.to_string()))?;
        Ok(Self { config, http_client })
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    /// Issue a GET. Elapsed time covers the request up to the response head;
    /// the body is then drained to measure its length.
    async fn fetch(&self, target: &Target) -> Outcome {
        let start = Instant::now();
        let response = match self.http_client.get(target.as_url().clone()).send().await {
            Ok(r) => r,
            Err(e) => return Outcome::failed(elapsed_ms(start), Failure::from_error(&e)),
        };
        let elapsed = elapsed_ms(start);

        let status = response.status();
        let header_bytes = header_block_len(response.version(), status, response.headers());

        match response.bytes().await {
            Ok(body) => Outcome::response(elapsed, status.as_u16(), header_bytes, body.len() as u64),
            Err(e) => Outcome::response(elapsed, status.as_u16(), header_bytes, 0)
                .with_failure(Failure::from_error(&e)),
        }
    }
}

/// Size in bytes of the response head as it would appear on the wire in HTTP/1.x:
/// status line, one `name: value` line per header, and the terminating blank line.
pub fn header_block_len(version: Version, status: StatusCode, headers: &HeaderMap) -> u64 {
    let version = format!("{version:?}");
    let reason = status.canonical_reason().unwrap_or("");
    // "<version> <code> <reason>\r\n"
    let status_line = version.len() + 1 + 3 + 1 + reason.len() + 2;
    let header_lines: usize = headers
        .iter()
        .map(|(name, value)| name.as_str().len() + 2 + value.as_bytes().len() + 2)
        .sum();
    (status_line + header_lines + 2) as u64
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1_000.0
}
