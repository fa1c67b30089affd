//! Resilience utilities for remote calls
//!
//! Timeout and retry for listing requests. Job submission and job status
//! checks are sent once: a repeated POST starts a second remote job, and a
//! status check already runs inside the executor's fixed-interval loop.

use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use crate::error::AdapterError;

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default max retries for transient failures
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Resilience configuration for remote calls
#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum retry attempts for transient failures
    pub max_retries: u32,
    /// Base delay for exponential backoff (doubles each retry)
    pub retry_base_delay_ms: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: 1000,
        }
    }
}

impl ResilienceConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get retry delay for attempt N (exponential backoff)
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self.retry_base_delay_ms * (1 << attempt.min(6)); // cap at 64x
        Duration::from_millis(delay_ms)
    }
}

/// Determines if an error is worth retrying
pub fn is_retryable(error: &AdapterError) -> bool {
    match error {
        AdapterError::Http(e) => {
            if e.is_timeout() || e.is_connect() {
                return true;
            }
            e.status()
                .is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
        }
        AdapterError::Remote { status, .. } => *status >= 500 || *status == 429,
        AdapterError::RequestTimedOut { .. } => true,
        _ => false,
    }
}

/// Execute a request once, bounded by the configured timeout
pub async fn execute_once<Fut, T>(
    config: &ResilienceConfig,
    operation_name: &str,
    operation: Fut,
) -> Result<T, AdapterError>
where
    Fut: std::future::Future<Output = Result<T, AdapterError>>,
{
    timeout(config.timeout(), operation)
        .await
        .unwrap_or_else(|_| {
            Err(AdapterError::RequestTimedOut {
                operation: operation_name.to_string(),
                timeout_secs: config.timeout_secs,
            })
        })
}

/// Execute a request with timeout and retry logic
///
/// Non-retryable errors are returned immediately; the last transient error
/// is returned once all attempts are used.
pub async fn execute_with_retry<F, Fut, T>(
    config: &ResilienceConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, AdapterError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AdapterError>>,
{
    let mut attempt = 0;
    loop {
        let error = match timeout(config.timeout(), operation()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) if !is_retryable(&e) => return Err(e),
            Ok(Err(e)) => e,
            Err(_) => AdapterError::RequestTimedOut {
                operation: operation_name.to_string(),
                timeout_secs: config.timeout_secs,
            },
        };

        if attempt >= config.max_retries {
            return Err(error);
        }

        let delay = config.retry_delay(attempt);
        debug!(
            operation = operation_name,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "request failed, will retry"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
