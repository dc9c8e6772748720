//! Exponential-backoff retry around fallible async operations.
//!
//! Retryability is decided from the error's display text so that any error
//! type can be retried: a leading HTTP status, a "rate limit" mention, or one
//! of the transient network failure markers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::metrics::PipelineMetrics;

static STATUS_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{3})").expect("valid status regex"));

const TRANSIENT_MARKERS: &[&str] = &[
    "ECONNRESET",
    "ETIMEDOUT",
    "ENOTFOUND",
    "fetch failed",
    "connection reset",
    "connection refused",
    "timed out",
    "dns error",
    "error sending request",
];

pub const DEFAULT_RETRYABLE_STATUS_CODES: &[u16] = &[429, 500, 502, 503, 504];

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub retryable_status_codes: Vec<u16>,
    /// Label used in retry log lines and metrics.
    pub context: &'static str,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            backoff_multiplier: 2.0,
            retryable_status_codes: DEFAULT_RETRYABLE_STATUS_CODES.to_vec(),
            context: "retry",
        }
    }
}

impl RetryConfig {
    pub fn with_context(context: &'static str) -> Self {
        Self {
            context,
            ..Self::default()
        }
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Wait applied before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let mut delay = self.initial_delay;
        for _ in 1..retry {
            delay = self.next_delay(delay);
        }
        delay.min(self.max_delay)
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        delay.mul_f64(self.backoff_multiplier).min(self.max_delay)
    }

    pub fn is_retryable(&self, message: &str) -> bool {
        if let Some(code) = STATUS_CODE
            .captures(message)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u16>().ok())
        {
            if self.retryable_status_codes.contains(&code) {
                return true;
            }
        }

        if message.to_lowercase().contains("rate limit") {
            return true;
        }

        TRANSIENT_MARKERS.iter().any(|marker| message.contains(marker))
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// `max_retries + 1` attempts have been made.
pub async fn execute<T, E, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut delay = config.initial_delay;
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let message = err.to_string();
                if attempt >= config.max_retries || !config.is_retryable(&message) {
                    return Err(err);
                }

                warn!(
                    context = config.context,
                    attempt = attempt + 1,
                    max_attempts = config.max_retries + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Attempt failed: {}. Retrying",
                    message
                );
                PipelineMetrics::record_retry(config.context);

                tokio::time::sleep(delay).await;
                delay = config.next_delay(delay);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_status_codes() {
        let config = RetryConfig::default();
        assert!(config.is_retryable("API error: 429 - Rate limited"));
        assert!(config.is_retryable("HTTP 503: AI service unavailable"));
        assert!(!config.is_retryable("API error: 400 - Bad request"));
        assert!(!config.is_retryable("HTTP 401: AI backend rejected the configured credential"));
    }

    #[test]
    fn classifies_messages_without_status() {
        let config = RetryConfig::default();
        assert!(config.is_retryable("Rate Limit reached for requests"));
        assert!(config.is_retryable("network error: error sending request for url"));
        assert!(config.is_retryable("read ECONNRESET"));
        assert!(!config.is_retryable("Failed to parse AI response: expected value"));
    }

    #[test]
    fn delays_grow_and_cap() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(1), Duration::from_millis(1000));
        assert_eq!(config.delay_for(2), Duration::from_millis(2000));
        assert_eq!(config.delay_for(4), Duration::from_millis(8000));
        assert_eq!(config.delay_for(5), Duration::from_millis(10_000));
        assert_eq!(config.delay_for(9), Duration::from_millis(10_000));
    }
}
