//! Optimization routes

use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::{handlers::optimization::upload_handler, AppState};

/// Room left for multipart boundaries and the quality field
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create optimization routes
///
/// The request body limit sits slightly above `max_upload_size` so the
/// handler, which reads the image chunk by chunk, is the one reporting an
/// oversize file.
pub fn routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_handler))
        .layer(DefaultBodyLimit::max(body_limit(max_upload_size)))
}

fn body_limit(max_upload_size: usize) -> usize {
    max_upload_size.saturating_add(MULTIPART_OVERHEAD)
}
