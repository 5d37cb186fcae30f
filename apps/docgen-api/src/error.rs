//! Error types for the document generator API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docgen_core::{DocgenError, SchemaError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request fields: {0}")]
    InvalidFields(#[from] SchemaError),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error(transparent)]
    Generation(#[from] DocgenError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::InvalidFields(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_FIELDS",
                err.to_string(),
            ),
            ApiError::InvalidFilename(_) => (
                StatusCode::BAD_REQUEST,
                "INVALID_FILENAME",
                "Filename must be a plain file name".to_string(),
            ),
            ApiError::FileNotFound(_) => (
                StatusCode::NOT_FOUND,
                "FILE_NOT_FOUND",
                "File not found".to_string(),
            ),
            ApiError::Generation(DocgenError::TemplateNotFound(name)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "TEMPLATE_NOT_FOUND",
                format!("Template file not found: {}", name),
            ),
            ApiError::Generation(err) if err.is_template_error() => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "TEMPLATE_ERROR",
                "Template could not be read".to_string(),
            ),
            ApiError::Generation(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "GENERATION_FAILED",
                "Document generation failed".to_string(),
            ),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        };

        // details stay in the log, the client only sees the sanitized message
        if status.is_server_error() {
            error!(code, "{}", self);
        }

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
