//! Error types for the gateway's admin surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contact_store::StoreError;
use phone_normalizer::NormalizeError;
use serde::Serialize;
use thiserror::Error;

/// Gateway error types.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Contact not found")]
    NotFound,

    #[error("Phone number already exists: {0}")]
    PhoneExists(String),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            GatewayError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            GatewayError::PhoneExists(_) => (StatusCode::CONFLICT, "PHONE_EXISTS"),
            GatewayError::InvalidPhone(_) => (StatusCode::BAD_REQUEST, "INVALID_PHONE"),
            GatewayError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for GatewayError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => GatewayError::NotFound,
            StoreError::PhoneExists(phone) => GatewayError::PhoneExists(phone),
            StoreError::Storage(msg) => GatewayError::Storage(msg),
        }
    }
}

impl From<NormalizeError> for GatewayError {
    fn from(e: NormalizeError) -> Self {
        GatewayError::InvalidPhone(e.to_string())
    }
}
