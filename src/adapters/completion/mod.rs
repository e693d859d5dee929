//! Completion backend adapters.
//!
//! - `remote`: hosted OpenAI-compatible chat completions, buffered or SSE
//! - `local`: self-hosted chat endpoint, always read incrementally
//! - `mock`: scripted backend for tests and offline runs

pub mod local;
pub mod mock;
pub mod registry;
pub mod remote;
pub mod sse;

pub use local::{LocalBackendConfig, LocalCompletionBackend};
pub use mock::MockCompletionBackend;
pub use registry::BackendRegistry;
pub use remote::{RemoteBackendConfig, RemoteCompletionBackend};
pub use sse::SseAccumulator;

use std::num::NonZeroU32;
use std::time::Duration;

use futures::StreamExt;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, Response};

use crate::domain::errors::{DomainError, DomainResult};
use crate::infrastructure::logging::SecretScrubber;

/// Longest upstream body excerpt carried in an error detail.
const ERROR_BODY_LIMIT: usize = 500;

pub(crate) fn build_http_client(timeout: Duration) -> DomainResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DomainError::ValidationFailed(format!("Failed to create HTTP client: {e}")))
}

pub(crate) fn rate_limiter(requests_per_second: f64) -> DefaultDirectRateLimiter {
    let period = Duration::from_secs_f64(1.0 / requests_per_second.max(0.001));
    let quota = Quota::with_period(period).unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX));
    RateLimiter::direct(quota)
}

fn format_timeout(timeout: Duration) -> String {
    if timeout.subsec_millis() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}

/// Human-readable detail for a reqwest failure.
pub(crate) fn describe_transport_error(
    backend: &str,
    err: &reqwest::Error,
    timeout: Duration,
) -> String {
    if err.is_timeout() {
        format!("{backend} completion request timed out after {}", format_timeout(timeout))
    } else if err.is_connect() {
        format!("could not connect to the {backend} completion endpoint: {err}")
    } else {
        format!("{backend} completion request failed: {err}")
    }
}

/// Detail for a non-2xx response: status code plus a scrubbed body excerpt.
pub(crate) async fn describe_status(backend: &str, response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let excerpt = SecretScrubber::global().scrub_truncated(&body, ERROR_BODY_LIMIT);
    if excerpt.is_empty() {
        format!("{backend} completion endpoint returned HTTP {status}")
    } else {
        format!("{backend} completion endpoint returned HTTP {status}: {excerpt}")
    }
}

/// Drain a response body chunk by chunk through an [`SseAccumulator`].
pub(crate) async fn read_incrementally(
    backend: &str,
    response: Response,
    timeout: Duration,
) -> Result<String, String> {
    let mut accumulator = SseAccumulator::new();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| describe_transport_error(backend, &e, timeout))?;
        accumulator.push(&chunk);
        if accumulator.is_done() {
            break;
        }
    }
    accumulator
        .finish()
        .map_err(|detail| SecretScrubber::global().scrub_truncated(&detail, ERROR_BODY_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timeout() {
        assert_eq!(format_timeout(Duration::from_secs(1800)), "1800s");
        assert_eq!(format_timeout(Duration::from_millis(250)), "250ms");
    }

    #[tokio::test]
    async fn test_rate_limiter_allows_first_request() {
        let limiter = rate_limiter(5.0);
        assert!(limiter.check().is_ok());
    }
}
