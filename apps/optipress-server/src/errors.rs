//! HTTP error mapping
//!
//! Every failure leaves the server as `{ "error": "<message>" }`. Client
//! errors carry a descriptive message; server errors carry a generic one and
//! the detail only goes to the log.

use axum::{
    extract::multipart::MultipartError,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use optipress_domain::optimization::OptimizationError;
use thiserror::Error;

use crate::dto::optimization::ErrorResponse;

/// Message returned for every 5xx response
pub const GENERIC_SERVER_ERROR: &str = "Internal server error while processing the image";

#[derive(Error, Debug)]
pub enum ApiError {
    /// Validation or encoding failure from the domain
    #[error(transparent)]
    Optimization(#[from] OptimizationError),

    /// The multipart body could not be read
    #[error("Failed to read multipart body: {0}")]
    Multipart(#[from] MultipartError),

    /// The client exhausted its request budget
    #[error("Too many requests, retry in {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },
}

impl ApiError {
    /// Caller mistakes, including oversize bodies, are 400; everything else is 500
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Optimization(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Optimization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Multipart(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Message safe to send to the caller
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Multipart(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                "Request body exceeds the maximum allowed size".to_string()
            }
            _ if self.status_code().is_server_error() => GENERIC_SERVER_ERROR.to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Failed to process upload");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Rejected upload");
        }

        let body = Json(ErrorResponse {
            error: self.user_message(),
        });

        match self {
            ApiError::RateLimited { retry_after_secs } => (
                status,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                body,
            )
                .into_response(),
            _ => (status, body).into_response(),
        }
    }
}
