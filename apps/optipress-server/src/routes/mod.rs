//! API routes

pub mod optimization;

use axum::{
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use std::path::Path;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::ServerConfig,
    dto::optimization::{ErrorResponse, UploadForm},
    handlers,
    middleware::{rate_limit, with_security_headers},
    AppState,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::optimization::upload_handler,
        health_handler
    ),
    components(
        schemas(UploadForm, ErrorResponse)
    ),
    tags(
        (name = "optimization", description = "Image optimization endpoints"),
        (name = "health", description = "Health check endpoints")
    ),
    info(
        title = "Optipress API",
        version = "0.1.0",
        description = "Re-encodes uploaded JPEG, PNG and WebP images as compressed progressive JPEG",
        contact(
            name = "Optipress Contributors"
        )
    )
)]
pub struct ApiDoc;

/// Create the main application router
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(optimization::routes(config.max_upload_bytes))
        .route("/health", get(health_handler));

    if let Some(dir) = &config.static_dir {
        router = router.fallback_service(static_files(dir));
    }

    let router = router
        .layer(axum::middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit,
        ))
        .with_state(state);

    with_security_headers(router).layer(TraceLayer::new_for_http())
}

fn static_files(dir: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=3600"),
        ))
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    ),
    tag = "health"
)]
async fn health_handler() -> &'static str {
    "OK"
}
