use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::core::error::{AppError, Result};
use crate::features::auth::AuthToken;
use crate::shared::types::{error_message, ApiResponse};

/// HTTP client shared by the upstream API clients
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("report-runner/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(AppError::Http)
}

/// Attach the bearer token when one was obtained this cycle
pub fn with_bearer(request: RequestBuilder, token: Option<&AuthToken>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token.as_str()),
        None => request,
    }
}

/// Fail with the upstream message unless the status is one of `expected`
pub async fn check_status(response: Response, expected: &[StatusCode]) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;

    if !expected.contains(&status) {
        return Err(AppError::Upstream {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    Ok(body)
}

/// Check the status against `expected` and unwrap the envelope's `data`
pub async fn read_data<T: DeserializeOwned>(
    response: Response,
    expected: &[StatusCode],
) -> Result<T> {
    let body = check_status(response, expected).await?;

    let envelope: ApiResponse<T> =
        serde_json::from_str(&body).map_err(|e| AppError::Decode(e.to_string()))?;

    envelope
        .data
        .ok_or_else(|| AppError::Decode("response has no data field".to_string()))
}
