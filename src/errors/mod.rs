//! Error handling module for the offline mirror.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const STORAGE_MISS: &str = "STORAGE_MISS";
    pub const EXTRACTION_ERROR: &str = "EXTRACTION_ERROR";
    pub const ENGINE_ERROR: &str = "ENGINE_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const DATASET_UNAVAILABLE: &str = "DATASET_UNAVAILABLE";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Request failed, was aborted or returned an unusable response
    Network(String),
    /// Request exceeded its time bound
    Timeout(String),
    /// Expected local key absent
    StorageMiss(String),
    /// Archive malformed, empty or not decodable
    Extraction(String),
    /// Search engine rejected a query
    Engine(String),
    /// Database error
    Database(String),
    /// No dataset could be obtained at all; startup cannot proceed
    DatasetUnavailable(String),
    /// Bad request
    BadRequest(String),
    /// Internal error
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Network(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::StorageMiss(_) => StatusCode::NOT_FOUND,
            AppError::Extraction(_) => StatusCode::BAD_GATEWAY,
            AppError::Engine(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::DatasetUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Network(_) => codes::NETWORK_ERROR,
            AppError::Timeout(_) => codes::TIMEOUT,
            AppError::StorageMiss(_) => codes::STORAGE_MISS,
            AppError::Extraction(_) => codes::EXTRACTION_ERROR,
            AppError::Engine(_) => codes::ENGINE_ERROR,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::DatasetUnavailable(_) => codes::DATASET_UNAVAILABLE,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Network(msg)
            | AppError::Timeout(msg)
            | AppError::StorageMiss(msg)
            | AppError::Extraction(msg)
            | AppError::Engine(msg)
            | AppError::Database(msg)
            | AppError::DatasetUnavailable(msg)
            | AppError::BadRequest(msg)
            | AppError::Internal(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            tracing::debug!("Request timed out: {:?}", err);
            AppError::Timeout(format!("Request timed out: {}", err))
        } else {
            tracing::debug!("Network error: {:?}", err);
            AppError::Network(format!("Network error: {}", err))
        }
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::Extraction(format!("Archive error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!("Background task failed: {:?}", err);
        AppError::Internal(format!("Background task failed: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_errors_map_to_gateway_statuses() {
        assert_eq!(
            AppError::Network("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Timeout("slow".into()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::DatasetUnavailable("none".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let err = AppError::StorageMiss("sync/version".into());
        assert_eq!(err.to_string(), "STORAGE_MISS: sync/version");
    }

    #[test]
    fn test_error_envelope() {
        let body = ErrorResponse::new(&AppError::Extraction("empty".into()));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "EXTRACTION_ERROR");
        assert_eq!(json["error"]["message"], "empty");
    }
}
