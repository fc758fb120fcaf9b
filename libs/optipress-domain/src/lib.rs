//! # Optipress Domain Layer
//!
//! This crate contains the pure business logic and domain models for the
//! Optipress image optimizer. It follows hexagonal architecture principles:
//!
//! - **Entities**: Core domain models (UploadRequest, ValidatedUpload, OptimizedImage)
//! - **Ports**: Trait definitions for external dependencies (ImageEncoder)
//! - **Services**: Business logic orchestration (OptimizationService)
//! - **Uploader**: The client-side state machine that drives one upload
//!
//! ## Architecture
//!
//! This layer has NO dependencies on infrastructure concerns (codecs, HTTP, etc.).
//! All external dependencies are expressed as traits (ports) that will be implemented
//! by adapter layers.
//!
//! ## Example
//!
//! ```rust
//! use optipress_domain::optimization::{OptimizationService, UploadRequest};
//! use optipress_domain::ports::ImageEncoder;
//!
//! // The service is generic over any ImageEncoder implementation
//! async fn example<E: ImageEncoder>(service: OptimizationService<E>) {
//!     let upload = UploadRequest::new(vec![0xFFu8, 0xD8].into()).with_content_type("image/jpeg");
//!     let optimized = service.optimize(upload).await.unwrap();
//!     println!("Reduced by {}%", optimized.reduction_percent());
//! }
//! ```

pub mod naming;
pub mod optimization;
pub mod ports;
pub mod uploader;

// Re-export commonly used types
pub use optimization::{
    ImageFormat, OptimizationError, OptimizationService, OptimizedImage, Quality, UploadRequest,
};
pub use ports::ImageEncoder;
pub use uploader::Uploader;
