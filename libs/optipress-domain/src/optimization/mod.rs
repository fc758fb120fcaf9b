//! Optimization domain module
//!
//! This module contains the core business logic and entities for re-encoding
//! uploaded images. It defines what an upload is, which uploads are acceptable,
//! and how a validated upload flows to the encoder port.

mod entity;
mod error;
mod format;
mod ids;
mod quality;
mod service;

pub use entity::{reduction_percent, OptimizedImage, UploadRequest, ValidatedUpload};
pub use error::{OptimizationError, Result};
pub use format::ImageFormat;
pub use ids::UploadId;
pub use quality::Quality;
pub use service::{OptimizationConfig, OptimizationService, DEFAULT_MAX_UPLOAD_SIZE};
