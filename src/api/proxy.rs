//! Interception endpoint.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::AppState;

/// Header reporting where the response came from.
pub const CACHE_HEADER: &str = "x-cache";

/// Interception query parameters.
#[derive(Debug, Deserialize)]
pub struct FetchParams {
    /// Absolute URL of the intercepted request.
    pub url: String,
}

/// GET /fetch?url=... - Answer a request through the interceptor.
pub async fn intercept(
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> Result<Response, AppError> {
    if !(params.url.starts_with("http://") || params.url.starts_with("https://")) {
        return Err(AppError::BadRequest(format!(
            "Only absolute http(s) URLs can be fetched, got '{}'",
            params.url
        )));
    }

    let intercepted = state.interceptor.handle(&params.url).await?;
    let response = intercepted.response;

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = Response::builder()
        .status(status)
        .header(CACHE_HEADER, intercepted.outcome.as_str());
    if let Some(content_type) = response
        .content_type
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
    {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }

    builder
        .body(Body::from(response.body))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}
