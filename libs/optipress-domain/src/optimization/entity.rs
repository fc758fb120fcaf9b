//! Domain entities for image optimization
//!
//! A request moves through three shapes, one per processing stage:
//!
//! - [`UploadRequest`]: what arrived over the wire, unchecked
//! - [`ValidatedUpload`]: passed every business rule, ready for the encoder
//! - [`OptimizedImage`]: the encoder's output plus display metadata
//!
//! Only a `ValidatedUpload` can be handed to an
//! [`ImageEncoder`](crate::ports::ImageEncoder), so an unchecked upload can
//! never reach the codec.

use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::{format::ImageFormat, ids::UploadId, quality::Quality};
use crate::naming::download_file_name;

/// An upload as received, before any validation
///
/// # Example
///
/// ```rust
/// use optipress_domain::optimization::UploadRequest;
///
/// let upload = UploadRequest::new(vec![0xFF, 0xD8, 0xFF].into())
///     .with_content_type("image/jpeg")
///     .with_file_name("photo.jpg");
/// assert_eq!(upload.size(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct UploadRequest {
    id: UploadId,
    data: Bytes,
    content_type: Option<String>,
    file_name: Option<String>,
    quality: Option<Quality>,
    received_at: DateTime<Utc>,
}

impl UploadRequest {
    /// Wrap raw bytes received from a client
    pub fn new(data: Bytes) -> Self {
        Self {
            id: UploadId::new(),
            data,
            content_type: None,
            file_name: None,
            quality: None,
            received_at: Utc::now(),
        }
    }

    /// Set the declared MIME type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the client-side file name
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Set the requested quality
    pub fn with_quality(mut self, quality: Option<Quality>) -> Self {
        self.quality = quality;
        self
    }

    pub fn id(&self) -> &UploadId {
        &self.id
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Size of the payload in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn quality(&self) -> Option<Quality> {
        self.quality
    }

    /// When the upload finished arriving
    pub fn received_at(&self) -> &DateTime<Utc> {
        &self.received_at
    }
}

/// An upload that satisfied every business rule
///
/// Constructed only by
/// [`OptimizationService::validate`](super::OptimizationService::validate).
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    id: UploadId,
    data: Bytes,
    format: ImageFormat,
    quality: Quality,
    file_name: Option<String>,
}

impl ValidatedUpload {
    pub(crate) fn new(
        request: UploadRequest,
        format: ImageFormat,
        quality: Quality,
    ) -> Self {
        Self {
            id: request.id,
            data: request.data,
            format,
            quality,
            file_name: request.file_name,
        }
    }

    pub fn id(&self) -> &UploadId {
        &self.id
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Declared source format
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Resolved quality (default applied when the request had none)
    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}

/// Result of a successful re-encode
#[derive(Debug, Clone)]
pub struct OptimizedImage {
    upload_id: UploadId,
    data: Bytes,
    original_size: usize,
    quality: Quality,
    file_name: String,
}

impl OptimizedImage {
    /// Build the result for `upload` from the encoder output
    pub fn new(upload: &ValidatedUpload, data: Bytes) -> Self {
        Self {
            upload_id: upload.id,
            data,
            original_size: upload.size(),
            quality: upload.quality,
            file_name: download_file_name(upload.file_name()),
        }
    }

    pub fn upload_id(&self) -> &UploadId {
        &self.upload_id
    }

    /// Encoded JPEG bytes
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Consume the result, returning the encoded bytes
    pub fn into_data(self) -> Bytes {
        self.data
    }

    pub fn original_size(&self) -> usize {
        self.original_size
    }

    pub fn optimized_size(&self) -> usize {
        self.data.len()
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Name for the `Content-Disposition` header
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Size reduction in percent, negative when the output grew
    pub fn reduction_percent(&self) -> i64 {
        reduction_percent(self.original_size, self.optimized_size())
    }
}

/// `round((1 - optimized / original) * 100)`
///
/// An empty original yields `0` rather than dividing by zero.
pub fn reduction_percent(original_size: usize, optimized_size: usize) -> i64 {
    if original_size == 0 {
        return 0;
    }

    let ratio = optimized_size as f64 / original_size as f64;
    ((1.0 - ratio) * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validated(data: Vec<u8>, file_name: Option<&str>) -> ValidatedUpload {
        let mut request = UploadRequest::new(Bytes::from(data)).with_content_type("image/png");
        if let Some(name) = file_name {
            request = request.with_file_name(name);
        }
        ValidatedUpload::new(request, ImageFormat::Png, Quality::DEFAULT)
    }

    #[test]
    fn test_upload_id_generation() {
        let first = UploadRequest::new(Bytes::from_static(b"a"));
        let second = UploadRequest::new(Bytes::from_static(b"a"));

        assert_ne!(first.id(), second.id(), "Each upload should get its own id");
        assert_eq!(first.id().to_string().len(), 36);
    }

    #[test]
    fn test_received_at_is_stamped_on_arrival() {
        let before = Utc::now();
        let request = UploadRequest::new(Bytes::from_static(b"a"));
        let after = Utc::now();

        assert!(*request.received_at() >= before);
        assert!(*request.received_at() <= after);
    }

    #[test]
    fn test_upload_request_builders() {
        let request = UploadRequest::new(Bytes::from_static(&[1, 2, 3]))
            .with_content_type("image/webp")
            .with_file_name("a.webp")
            .with_quality(Some(Quality::new(55).unwrap()));

        assert_eq!(request.size(), 3);
        assert_eq!(request.content_type(), Some("image/webp"));
        assert_eq!(request.file_name(), Some("a.webp"));
        assert_eq!(request.quality().map(|q| q.value()), Some(55));
    }

    #[test]
    fn test_validated_upload_keeps_identity() {
        let request = UploadRequest::new(Bytes::from_static(&[9; 4]));
        let id = *request.id();
        let upload = ValidatedUpload::new(request, ImageFormat::Jpeg, Quality::DEFAULT);

        assert_eq!(upload.id(), &id);
        assert_eq!(upload.size(), 4);
        assert_eq!(upload.format(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_optimized_image_metadata() {
        let upload = validated(vec![0; 1000], Some("beach.png"));
        let optimized = OptimizedImage::new(&upload, Bytes::from(vec![0; 250]));

        assert_eq!(optimized.original_size(), 1000);
        assert_eq!(optimized.optimized_size(), 250);
        assert_eq!(optimized.reduction_percent(), 75);
        assert_eq!(optimized.file_name(), "beach_optimized.jpg");
        assert_eq!(optimized.upload_id(), upload.id());
    }

    #[test]
    fn test_reduction_percent_rounding() {
        assert_eq!(reduction_percent(2_000_000, 1_234_567), 38);
        assert_eq!(reduction_percent(3, 2), 33);
        assert_eq!(reduction_percent(8, 3), 63);
        assert_eq!(reduction_percent(100, 100), 0);
    }

    #[test]
    fn test_reduction_percent_growth_is_negative() {
        assert_eq!(reduction_percent(100, 150), -50);
    }

    #[test]
    fn test_reduction_percent_empty_original() {
        assert_eq!(reduction_percent(0, 10), 0);
    }
}
