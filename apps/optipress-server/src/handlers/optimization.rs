//! Upload handler

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use bytes::BytesMut;
use chrono::Utc;
use optipress_domain::optimization::{
    ImageFormat, OptimizationError, OptimizedImage, Quality, UploadRequest,
};
use tracing::{debug, info};

use crate::{
    dto::optimization::{ErrorResponse, UploadForm},
    errors::ApiError,
    AppState,
};

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";
/// Multipart field carrying the optional quality
pub const QUALITY_FIELD: &str = "quality";

/// Re-encode an uploaded image as a progressive JPEG
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Optimized JPEG", content_type = "image/jpeg", body = Vec<u8>),
        (status = 400, description = "Bad request - missing file, disallowed type, file too large or invalid quality", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "optimization"
)]
pub async fn upload_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let max_size = state.optimization_service.config().max_upload_size;
    let request = read_upload(multipart, max_size).await?;

    info!(
        upload_id = %request.id(),
        size = request.size(),
        mime = request.content_type().unwrap_or_default(),
        quality = ?request.quality().map(|q| q.value()),
        received_at = %request.received_at(),
        "Received upload"
    );

    let received_at = *request.received_at();
    let optimized = state.optimization_service.optimize(request).await?;

    info!(
        upload_id = %optimized.upload_id(),
        original_size = optimized.original_size(),
        optimized_size = optimized.optimized_size(),
        reduction = optimized.reduction_percent(),
        elapsed_ms = (Utc::now() - received_at).num_milliseconds(),
        "Successfully optimized image"
    );

    Ok(jpeg_response(optimized))
}

/// Collect the multipart stream into an `UploadRequest`
///
/// The image is buffered chunk by chunk and abandoned as soon as it passes
/// `max_size`. A declared type outside the allow-list is rejected before any
/// of its bytes are read.
async fn read_upload(mut multipart: Multipart, max_size: usize) -> Result<UploadRequest, ApiError> {
    let mut image: Option<(BytesMut, Option<String>, Option<String>)> = None;
    let mut quality: Option<Quality> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            IMAGE_FIELD => {
                if image.is_some() {
                    return Err(OptimizationError::invalid_upload(
                        "only one image may be uploaded per request",
                    )
                    .into());
                }

                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);

                let declared = content_type.as_deref().unwrap_or_default();
                if ImageFormat::from_mime(declared).is_none() {
                    return Err(OptimizationError::unsupported_type(declared).into());
                }

                let mut data = BytesMut::new();
                while let Some(chunk) = field.chunk().await? {
                    let total = data.len() + chunk.len();
                    if total > max_size {
                        return Err(OptimizationError::file_too_large(total, max_size).into());
                    }
                    data.extend_from_slice(&chunk);
                }

                image = Some((data, content_type, file_name));
            }
            QUALITY_FIELD => {
                let raw = field.text().await?;
                quality = Quality::parse_field(&raw)?;
            }
            other => {
                debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let (data, content_type, file_name) = image.ok_or(OptimizationError::MissingFile)?;

    let mut request = UploadRequest::new(data.freeze()).with_quality(quality);
    if let Some(content_type) = content_type {
        request = request.with_content_type(content_type);
    }
    if let Some(file_name) = file_name {
        request = request.with_file_name(file_name);
    }

    Ok(request)
}

fn jpeg_response(optimized: OptimizedImage) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", optimized.file_name());
    let original_size = optimized.original_size();
    let optimized_size = optimized.optimized_size();

    let mut response = Response::new(Body::from(optimized.into_data()));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
    headers.insert("x-original-size", HeaderValue::from(original_size));
    headers.insert("x-optimized-size", HeaderValue::from(optimized_size));

    response
}
