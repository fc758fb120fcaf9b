//! Optipress server
//!
//! HTTP service that accepts an image upload and answers with a compressed,
//! progressive JPEG. Nothing is persisted: every upload lives only for the
//! duration of its request.

mod config;
mod dto;
mod errors;
mod handlers;
mod middleware;
mod routes;

use anyhow::{Context, Result};
use optipress_codec::JpegReencoder;
use optipress_domain::optimization::{OptimizationConfig, OptimizationService};
use std::{net::SocketAddr, sync::Arc, time::Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{LogFormat, ServerConfig},
    middleware::RateLimiter,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub optimization_service: Arc<OptimizationService<JpegReencoder>>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Self {
        let service = OptimizationService::new(
            JpegReencoder::default(),
            OptimizationConfig {
                max_upload_size: config.max_upload_bytes,
                default_quality: config.default_quality,
            },
        );

        Self {
            optimization_service: Arc::new(service),
            rate_limiter: Arc::new(RateLimiter::new(
                config.rate_limit_max,
                config.rate_limit_window,
            )),
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    init_tracing(config.log_format);

    info!(
        max_upload_bytes = config.max_upload_bytes,
        default_quality = config.default_quality.value(),
        rate_limit_max = config.rate_limit_max,
        rate_limit_window_secs = config.rate_limit_window.as_secs(),
        static_dir = ?config.static_dir,
        "Starting Optipress server"
    );

    let state = AppState::from_config(&config);

    // Expired rate limit windows are dropped once per window
    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(limiter.window());
        loop {
            interval.tick().await;
            limiter.prune(Instant::now());
        }
    });

    let app = routes::create_router(state, &config);

    let addr = config.bind_addr();
    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
