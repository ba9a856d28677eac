//! HTTP page fetching with exponential backoff retry logic.
//!
//! Article hosts regularly answer scrapers with rate-limit or block responses,
//! so every request goes through a retry decorator.
//!
//! # Architecture
//!
//! The module uses a trait-based design:
//! - [`PageFetch`]: Core trait for a single GET
//! - [`HttpGet`]: One attempt over a shared `reqwest` client
//! - [`RetryFetch`]: Decorator that adds retry logic to any `PageFetch` implementation
//! - [`BrowserIdentity`]: Builds browser-like request headers with a rotated `User-Agent`
//!
//! # Retry Strategy
//!
//! - Retried: HTTP 429, 403 and 503, and transport failures (DNS, timeout, reset)
//! - Terminal: any other non-2xx status
//! - Delay before retry `n` (0-indexed): `base_delay * 2^n` plus jitter in `[0, max_jitter)`
//! - No sleep after the final attempt

use crate::config::{FetchConfig, RetryPolicy};
use rand::seq::IndexedRandom;
use rand::{Rng, rng};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Status codes that usually mean "slow down" rather than "go away".
const RETRYABLE_STATUSES: [u16; 3] = [429, 403, 503];

/// A fetched page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Failures while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connect, timeout, reset, or a body that could not be read.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("gave up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: usize,
        #[source]
        last: Box<FetchError>,
    },

    #[error("invalid request header {name:?}: {message}")]
    Header { name: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Whether another attempt might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => RETRYABLE_STATUSES.contains(status),
            _ => false,
        }
    }

    /// Whether the failure came from talking to the remote host, as opposed to
    /// our own request setup.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Status { .. } | Self::Exhausted { .. }
        )
    }
}

/// Trait for a single async page GET.
///
/// Implementors fetch `url` once with the given headers. Decorators such as
/// [`RetryFetch`] layer policy on top.
pub trait PageFetch {
    /// Fetch `url`.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL of the page
    /// * `headers` - Request headers, usually from [`BrowserIdentity::rotated`]
    ///
    /// # Returns
    ///
    /// The page on a 2xx response; otherwise a [`FetchError`] that callers can
    /// classify with [`FetchError::is_retryable`] and [`FetchError::is_remote`].
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<Page, FetchError>;
}

/// One HTTP GET per call over a shared client.
#[derive(Debug, Clone)]
pub struct HttpGet {
    client: Client,
}

impl HttpGet {
    /// Build a client with the given per-attempt timeout.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl PageFetch for HttpGet {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<Page, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(transport)?;
        debug!(status = status.as_u16(), bytes = body.len(), %final_url, "Fetched page");
        Ok(Page {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`PageFetch`] implementation.
pub struct RetryFetch<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryFetch<T>
where
    T: PageFetch,
{
    /// Wrap an existing [`PageFetch`] implementation.
    ///
    /// # Arguments
    ///
    /// * `inner` - The fetcher making single attempts
    /// * `policy` - Attempt budget, base delay and jitter bound
    ///
    /// # Example
    ///
    /// ```ignore
    /// let http = HttpGet::new(Duration::from_secs(15))?;
    /// let fetcher = RetryFetch::new(http, RetryPolicy::article());
    /// let page = fetcher.get(url, &identity.rotated()?).await?;
    /// ```
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Total attempts this wrapper will make; at least one.
    pub fn max_attempts(&self) -> usize {
        self.policy.max_retries.max(1)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("policy", &self.policy)
            .finish()
    }
}

impl<T> PageFetch for RetryFetch<T>
where
    T: PageFetch,
{
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<Page, FetchError> {
        let total_t0 = Instant::now();
        let max_attempts = self.max_attempts();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.get(url, headers).await {
                Ok(page) => return Ok(page),
                Err(e) if !e.is_retryable() => {
                    warn!(attempt = attempt + 1, error = %e, "Terminal fetch failure");
                    return Err(e);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt >= max_attempts {
                        error!(
                            attempt,
                            max = max_attempts,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "fetch exhausted retries"
                        );
                        return Err(FetchError::Exhausted {
                            url: url.to_string(),
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }

                    let delay = backoff_delay(&self.policy, attempt - 1) + jitter(&self.policy);
                    warn!(
                        attempt,
                        max = max_attempts,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Deterministic part of the wait before retry `attempt` (0-indexed).
///
/// # Returns
///
/// `base_delay * 2^attempt`, saturating instead of overflowing. Jitter is
/// added separately by the caller.
pub fn backoff_delay(policy: &RetryPolicy, attempt: usize) -> Duration {
    let factor = 1u32.checked_shl(attempt as u32).unwrap_or(u32::MAX);
    policy.base_delay().saturating_mul(factor)
}

fn jitter(policy: &RetryPolicy) -> Duration {
    let max = policy.max_jitter();
    if max.is_zero() {
        return Duration::ZERO;
    }
    max.mul_f64(rng().random_range(0.0..1.0))
}

/// Browser-like request headers.
///
/// Headers come from configuration, so they are validated per request and a
/// bad value fails that request instead of the whole run.
#[derive(Debug, Clone)]
pub struct BrowserIdentity {
    user_agents: Vec<String>,
    headers: Vec<(String, String)>,
}

impl BrowserIdentity {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            user_agents: config.user_agents.clone(),
            headers: config.headers.clone(),
        }
    }

    /// Headers for one request, with a randomly chosen `User-Agent`.
    ///
    /// # Returns
    ///
    /// The configured headers plus `User-Agent`, or [`FetchError::Header`] if a
    /// configured name or value is not a valid HTTP header.
    pub fn rotated(&self) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            headers.insert(header_name(name)?, header_value(name, value)?);
        }
        if let Some(agent) = self.user_agents.choose(&mut rng()) {
            headers.insert(USER_AGENT, header_value("User-Agent", agent)?);
        }
        Ok(headers)
    }
}

fn header_name(name: &str) -> Result<HeaderName, FetchError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| FetchError::Header {
        name: name.to_string(),
        message: e.to_string(),
    })
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value).map_err(|e| FetchError::Header {
        name: name.to_string(),
        message: e.to_string(),
    })
}
