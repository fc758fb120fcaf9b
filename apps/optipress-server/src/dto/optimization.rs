//! DTOs for optimization endpoints

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Multipart form accepted by the upload endpoint
///
/// Only used to describe the request in the OpenAPI document; the handler
/// reads the multipart stream field by field.
#[allow(dead_code)]
#[derive(Debug, ToSchema)]
pub struct UploadForm {
    /// JPEG, PNG or WebP image, at most 10 MiB
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
    /// JPEG quality between 10 and 100 (default: 80)
    #[schema(example = 80, minimum = 10, maximum = 100)]
    pub quality: Option<u8>,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error description
    #[schema(example = "Quality must be an integer between 10 and 100 (got '5')")]
    pub error: String,
}
