use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

use crate::{NomadError, Result};

/// HTTP client for provider APIs: timeout, user agent and retries on
/// transient failures (5xx, 429, connection errors).
pub(crate) fn retrying_client(timeout_seconds: u32, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.into()))
        .user_agent(concat!("NomadAI/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| NomadError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Turns a non-2xx response into an `Api` error naming the provider.
pub(crate) async fn error_for_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match status.as_u16() {
        401 | 403 => format!("{provider} rejected the credentials"),
        429 => format!("{provider} rate limit exceeded"),
        _ => format!("{provider} API error {status}: {body}"),
    };
    tracing::warn!("{}", message);
    Err(NomadError::api(message))
}
