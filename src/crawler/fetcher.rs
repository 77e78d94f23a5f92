//! HTTP fetcher with retry and backoff
//!
//! This module handles all outbound requests for the crawler:
//! - Building the HTTP client with the configured user agent
//! - Escalating per-attempt timeouts
//! - Linear backoff between attempts, with a longer hold-off when the
//!   server signals overload (503)
//! - Converting exhausted retries into a [`FetchError`]
//!
//! A `Fetcher` holds no per-request state and is safe to share across many
//! concurrent callers.

use crate::config::CrawlerConfig;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A fetch that failed after exhausting its retry budget
#[derive(Debug, Clone, Error)]
#[error("Fetch failed for {url} after {attempts} attempts: {message}")]
pub struct FetchError {
    /// The URL that could not be fetched
    pub url: String,

    /// How many attempts were made
    pub attempts: u32,

    /// Description of the last failure
    pub message: String,
}

/// Retry schedule shared by every outbound caller
///
/// Attempt `i` (0-based) runs with a timeout of `initial_timeout +
/// i * timeout_step`. Between attempts the fetcher sleeps
/// `base_backoff * (i + 1)`, or `overload_backoff` when the failure
/// indicates a 503.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_timeout: Duration,
    pub timeout_step: Duration,
    pub base_backoff: Duration,
    pub overload_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_timeout: Duration::from_secs(8),
            timeout_step: Duration::from_secs(5),
            base_backoff: Duration::from_secs(1),
            overload_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Builds a policy from the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_fetch_attempts,
            ..Self::default()
        }
    }

    /// Timeout for the given 0-based attempt number
    pub fn attempt_timeout(&self, attempt: u32) -> Duration {
        self.initial_timeout + self.timeout_step * attempt
    }

    /// Sleep duration after a failed attempt
    pub fn backoff_after(&self, attempt: u32, overloaded: bool) -> Duration {
        if overloaded {
            self.overload_backoff
        } else {
            self.base_backoff * (attempt + 1)
        }
    }
}

/// Issues HTTP requests with the retry policy applied
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

impl Fetcher {
    /// Creates a fetcher with the given policy and user agent
    pub fn new(policy: RetryPolicy, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, policy })
    }

    /// Fetches a URL, returning the response body as text
    ///
    /// Retries up to the policy's attempt budget. Any non-success HTTP
    /// status counts as a transport failure. After the final attempt the
    /// last failure is returned as a [`FetchError`].
    pub async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let mut last_error = String::new();

        for attempt in 0..self.policy.max_attempts {
            let timeout = self.policy.attempt_timeout(attempt);

            match self.try_fetch(url, timeout).await {
                Ok(body) => {
                    tracing::debug!("Fetched {} on attempt {}", url, attempt + 1);
                    return Ok(body);
                }
                Err(message) => {
                    tracing::warn!("Attempt {} failed for {}: {}", attempt + 1, url, message);
                    let overloaded = message.contains("503");
                    last_error = message;

                    if attempt + 1 == self.policy.max_attempts {
                        break;
                    }
                    if overloaded {
                        tracing::warn!("503 detected for {}, holding off before retry", url);
                    }
                    tokio::time::sleep(self.policy.backoff_after(attempt, overloaded)).await;
                }
            }
        }

        Err(FetchError {
            url: url.to_string(),
            attempts: self.policy.max_attempts,
            message: last_error,
        })
    }

    async fn try_fetch(&self, url: &Url, timeout: Duration) -> Result<String, String> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(format!("HTTP status {} for {}", status, url));
        }

        response.text().await.map_err(|e| e.to_string())
    }
}
