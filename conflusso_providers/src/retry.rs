use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::ApiError;

/// Delays between attempts; one attempt more than there are delays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delays: Vec<Duration>,
}

impl RetryPolicy {
    /// Single attempt.
    #[must_use]
    pub const fn none() -> Self {
        Self { delays: Vec::new() }
    }

    #[must_use]
    pub fn from_secs(delays: &[u64]) -> Self {
        Self {
            delays: delays.iter().copied().map(Duration::from_secs).collect(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_secs(&[1, 2])
    }
}

/// Rate limits, server errors, timeouts and dropped connections are worth
/// another attempt; everything else fails fast.
#[must_use]
pub fn is_transient(error: &anyhow::Error) -> bool {
    if let Some(api) = error.downcast_ref::<ApiError>() {
        return api.status.as_u16() == 429 || api.status.is_server_error();
    }
    error
        .downcast_ref::<reqwest::Error>()
        .is_some_and(|e| e.is_timeout() || e.is_connect())
}

/// Narrower test for requests that create something: only failures where the
/// server cannot have applied the request are worth sending again.
#[must_use]
pub fn is_safe_to_resend(error: &anyhow::Error) -> bool {
    if let Some(api) = error.downcast_ref::<ApiError>() {
        return api.status.as_u16() == 429;
    }
    error
        .downcast_ref::<reqwest::Error>()
        .is_some_and(reqwest::Error::is_connect)
}

/// Retry an async operation while `retryable` says the error is transient.
///
/// Returns the first success, the first non-retryable error, or the last error
/// once the policy's delays are used up.
pub async fn retry_with_backoff<F, Fut, T, P>(
    mut operation: F,
    policy: &RetryPolicy,
    retryable: P,
) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
    P: Fn(&anyhow::Error) -> bool,
{
    let attempts = policy.delays.len() + 1;
    let mut delays = policy.delays.iter();
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let Some(delay) = delays.next().filter(|_| retryable(&e)) else {
                    return Err(e);
                };
                warn!(
                    "Request failed (attempt {attempt}/{attempts}): {e:#}. Retrying after {delay:?}..."
                );
                sleep(*delay).await;
                attempt += 1;
            }
        }
    }
}
