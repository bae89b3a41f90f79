//! Blocking HTTP fetcher for documentation sources.
//!
//! Every URL is tried once plus `retry_attempts` times with exponential
//! backoff. Only transient failures (timeouts, connection errors, 429 and
//! 5xx) are retried; a URL that still fails is reported in its own
//! `FetchOutcome` and the remaining URLs are fetched regardless.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use quill_contracts::{
    document::ByteStream,
    error::{QuillError, QuillResult},
};
use quill_core::traits::{ContentFetcher, FetchOutcome};

/// Backoff schedule between attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub retry_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_attempts: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let millis = self.base_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let clamped = millis.min(self.max_delay.as_millis() as f64) as u64;
        Duration::from_millis(clamped)
    }
}

/// One failed attempt and whether another is worth making.
struct AttemptError {
    reason: String,
    retryable: bool,
}

pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    policy: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, policy: RetryPolicy) -> QuillResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quill/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| QuillError::ConfigError {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, timeout, policy })
    }

    fn fetch_one(&self, url: &str) -> QuillResult<ByteStream> {
        let mut attempt = 0;
        loop {
            match self.attempt(url) {
                Ok(stream) => return Ok(stream),
                Err(err) if err.retryable && attempt < self.policy.retry_attempts => {
                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!(
                        url,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err.reason,
                        "fetch failed, retrying"
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => {
                    return Err(QuillError::FetchFailure {
                        url: url.to_string(),
                        reason: format!("{} (after {} attempt(s))", err.reason, attempt + 1),
                    });
                }
            }
        }
    }

    fn attempt(&self, url: &str) -> Result<ByteStream, AttemptError> {
        let response = self.client.get(url).send().map_err(|e| AttemptError {
            reason: if e.is_timeout() {
                format!("timed out after {}s", self.timeout.as_secs())
            } else {
                e.to_string()
            },
            retryable: e.is_timeout() || e.is_connect() || e.is_request(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError {
                reason: format!("HTTP {}", status.as_u16()),
                retryable: status.as_u16() == 429 || status.is_server_error(),
            });
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_mime);
        let data = response.bytes().map_err(|e| AttemptError {
            reason: format!("failed to read body: {e}"),
            retryable: true,
        })?;

        debug!(url, bytes = data.len(), mime = ?mime_type, "fetched");
        Ok(ByteStream::new(url, data.to_vec(), mime_type))
    }
}

impl ContentFetcher for HttpFetcher {
    fn fetch(&self, urls: &[String]) -> Vec<FetchOutcome> {
        urls.iter()
            .map(|url| FetchOutcome {
                url: url.clone(),
                result: self.fetch_one(url),
            })
            .collect()
    }
}

/// `text/html; charset=utf-8` → `text/html`.
fn parse_mime(header: &str) -> Option<String> {
    let mime = header.split(';').next()?.trim().to_ascii_lowercase();
    if mime.is_empty() {
        None
    } else {
        Some(mime)
    }
}
