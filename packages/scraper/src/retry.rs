//! HTTP retry helpers for transient errors.
//!
//! Page fetches should go through [`fetch_text`] (or [`send_text`] for a
//! custom request shape) instead of calling
//! `reqwest::RequestBuilder::send()` directly, so every request gets
//! automatic retry with exponential backoff for timeouts, connection
//! resets, server errors and rate limiting.
//!
//! ```ignore
//! let html = retry::fetch_text(&client, &url, RetryPolicy::default()).await?;
//! ```

use std::time::Duration;

use reqwest::StatusCode;

use crate::ScrapeError;

/// Maximum number of retry attempts for transient HTTP errors.
///
/// With the default one-second base the backoff is 2s, 4s, 8s, 16s, 32s.
pub const MAX_RETRIES: u32 = 5;

/// How many times, and how patiently, a request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Backoff unit; attempt `n` waits `base * 2^n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Wait before retry `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// What to do with a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Accept,
    Retry,
    Fail,
}

fn disposition(status: StatusCode) -> Disposition {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Disposition::Retry
    } else if status.is_client_error() {
        Disposition::Fail
    } else {
        Disposition::Accept
    }
}

/// Fetches `url` with a GET request and returns the body as text.
///
/// # Errors
///
/// Returns [`ScrapeError`] if the request fails after all retries or the
/// server answers with a permanent error status.
#[allow(clippy::future_not_send)]
pub async fn fetch_text(
    client: &reqwest::Client,
    url: &str,
    policy: RetryPolicy,
) -> Result<String, ScrapeError> {
    log::debug!("GET {url}");
    send_text(|| client.get(url), policy).await
}

/// Sends the request built by `build_request` and returns the body as text.
///
/// The closure is called on each attempt to construct a fresh
/// [`reqwest::RequestBuilder`], since builders are consumed by `.send()`.
///
/// Retries connection errors, timeouts, HTTP 429 and HTTP 5xx. Does not
/// retry other 4xx statuses. A body that fails to read is re-fetched once
/// per remaining retry.
///
/// # Errors
///
/// Returns [`ScrapeError`] if the request fails after all retries or the
/// server returns a non-retryable status code.
#[allow(clippy::future_not_send)]
pub async fn send_text<F>(build_request: F, policy: RetryPolicy) -> Result<String, ScrapeError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;
    loop {
        let response = send_inner(&build_request, policy).await?;
        let url = response.url().to_string();

        match response.text().await {
            Ok(text) => return Ok(text),
            Err(e) if attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.backoff(attempt);
                log::warn!(
                    "Body read failed for {url} (retry {attempt}/{}), re-fetching in {delay:?}: {e}",
                    policy.max_retries
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                log::error!("Body read failed for {url}, giving up: {e}");
                return Err(ScrapeError::Http(e));
            }
        }
    }
}

/// Core retry loop. Returns the first response with a 2xx or 3xx status.
#[allow(clippy::future_not_send)]
async fn send_inner<F>(
    build_request: &F,
    policy: RetryPolicy,
) -> Result<reqwest::Response, ScrapeError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            let delay = policy.backoff(attempt);
            log::warn!("  retry {attempt}/{} in {delay:?}...", policy.max_retries);
            tokio::time::sleep(delay).await;
        }
        let retries_left = attempt < policy.max_retries;
        attempt += 1;

        let response = match build_request().send().await {
            Ok(response) => response,
            Err(e) if is_transient(&e) && retries_left => {
                log::warn!("  transient error: {e}");
                continue;
            }
            Err(e) => return Err(ScrapeError::Http(e)),
        };

        let status = response.status();
        match disposition(status) {
            Disposition::Accept => return Ok(response),
            Disposition::Retry if retries_left => {
                log::warn!("  HTTP {status} from {}", response.url());
            }
            Disposition::Retry | Disposition::Fail => {
                return Err(ScrapeError::Status {
                    url: response.url().to_string(),
                    status: status.as_u16(),
                });
            }
        }
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}
