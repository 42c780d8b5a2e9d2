//! Request plumbing shared by the upstream API clients.

use crate::config::UpstreamConfig;
use crate::utils::error::{AppError, Result};
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

pub const API_KEY_HEADER: &str = "x-api-key";
const MAX_BACKOFF_FACTOR: u32 = 8;
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self {
            attempts: config.retry_attempts,
            base_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// `base_delay × 2^n`, capped at 8× the base.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry).min(MAX_BACKOFF_FACTOR);
        self.base_delay.saturating_mul(factor)
    }
}

pub fn build_client(service: &str, config: &UpstreamConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    if let Some(key) = config.resolved_api_key() {
        let mut value = HeaderValue::from_str(key).map_err(|_| AppError::InvalidConfigValueError {
            field: format!("{}.api_key", service),
            value: "<redacted>".to_string(),
            reason: "contains characters not allowed in a header".to_string(),
        })?;
        value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, value);
    } else {
        tracing::warn!("⚠️ No API key configured for {}", service);
    }

    Ok(Client::builder()
        .timeout(config.timeout())
        .user_agent(concat!("txpower/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .build()?)
}

/// Seconds form of `Retry-After`, capped at 30s. HTTP-date values are ignored.
fn retry_after(response: &Response) -> Option<Duration> {
    let seconds: u64 = response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;
    Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER))
}

/// Sends the request built by `make`, retrying 429, 5xx and transport
/// failures. Any other non-success status fails on the first attempt.
pub async fn send_with_retry<F>(service: &str, policy: RetryPolicy, make: F) -> Result<Response>
where
    F: Fn() -> RequestBuilder,
{
    let mut retry = 0;
    loop {
        let (err, delay) = match make().send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status();
                let wait = retry_after(&response);
                let err = AppError::upstream(service, Some(status.as_u16()), format!("HTTP {}", status));
                (err, wait.unwrap_or_else(|| policy.backoff(retry)))
            }
            Err(e) => (AppError::ApiError(e), policy.backoff(retry)),
        };

        if !err.is_retryable() || retry >= policy.attempts {
            tracing::warn!("📡 {} request failed after {} attempt(s): {}", service, retry + 1, err);
            return Err(err);
        }
        retry += 1;
        tracing::debug!(
            "📡 {} retry {}/{} in {:?} ({})",
            service,
            retry,
            policy.attempts,
            delay,
            err
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            attempts: 10,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(3), Duration::from_millis(800));
        assert_eq!(policy.backoff(9), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/plans");
            then.status(503);
        });

        let client = Client::new();
        let url = server.url("/plans");
        let err = send_with_retry("pricing", policy(2), || client.get(&url))
            .await
            .unwrap_err();

        mock.assert_hits(3);
        assert!(matches!(err, AppError::UpstreamError { status: Some(503), .. }));
    }

    #[tokio::test]
    async fn test_client_errors_fail_fast() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/plans");
            then.status(404);
        });

        let client = Client::new();
        let url = server.url("/plans");
        let err = send_with_retry("pricing", policy(3), || client.get(&url))
            .await
            .unwrap_err();

        mock.assert_hits(1);
        assert_eq!(err.code(), "UPSTREAM_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_rate_limited_honours_retry_after() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/plans");
            then.status(429).header("retry-after", "0");
        });

        let client = Client::new();
        let url = server.url("/plans");
        let started = std::time::Instant::now();
        let result = send_with_retry("pricing", policy(1), || client.get(&url)).await;

        mock.assert_hits(2);
        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_api_key_header_is_sent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/ping").header(API_KEY_HEADER, "k-123");
            then.status(200);
        });

        let config = UpstreamConfig {
            api_key: Some("k-123".to_string()),
            ..UpstreamConfig::with_endpoint(server.base_url())
        };
        let client = build_client("pricing", &config).unwrap();
        let url = server.url("/ping");
        send_with_retry("pricing", policy(0), || client.get(&url)).await.unwrap();

        mock.assert();
    }
}
