//! Remote access: the shared HTTP client and the version-check endpoint.

mod oracle;

pub use oracle::*;

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use crate::errors::AppError;
use crate::models::CachedResponse;

/// User agent sent with every upstream request.
pub fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Build the HTTP client shared by the synchronizer and the interceptor.
///
/// Time bounds are applied per request, not on the client.
pub fn http_client() -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .user_agent(user_agent())
        .build()
        .map_err(AppError::from)
}

/// GET `url` within `timeout` and buffer the whole response.
///
/// Any HTTP status is returned as-is; only transport failures are errors.
pub async fn fetch_response(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<CachedResponse, AppError> {
    let response = client.get(url).timeout(timeout).send().await?;

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.bytes().await?.to_vec();

    Ok(CachedResponse::new(status, content_type, body))
}

/// Like [`fetch_response`], but a non-success status is a `Network` error.
pub async fn fetch_success(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<CachedResponse, AppError> {
    let response = fetch_response(client, url, timeout).await?;
    if !response.is_success() {
        return Err(AppError::Network(format!(
            "Unexpected status code {} from {}",
            response.status, url
        )));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent() {
        let ua = user_agent();
        assert!(ua.starts_with("aod-offline/"));
    }
}
