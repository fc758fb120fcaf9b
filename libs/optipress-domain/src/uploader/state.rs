//! Uploader state machine
//!
//! ```text
//!            select              submit               complete
//!   Idle ───────────▶ Previewing ───────▶ Submitting ──────────▶ Completed
//!                          ▲                 │   ▲
//!                          │ select     fail │   │ submit (retry)
//!                          │                 ▼   │
//!                          └─────────────── Failed
//! ```
//!
//! `reset` returns to `Idle` from anywhere. Selecting a new file is allowed
//! from every state except `Submitting`, so only one request is ever in
//! flight. Time is passed in explicitly so expiry is deterministic.

use bytes::Bytes;
use std::time::{Duration, Instant};

use super::display::format_file_size;
use super::validation::{validate_file, SelectedFile, UploaderConfig, UploaderError};
use crate::naming::optimized_file_name;
use crate::optimization::{reduction_percent, ImageFormat, Quality};

/// Transient, self-dismissing message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    message: String,
    expires_at: Instant,
}

impl Notice {
    fn new(message: impl Into<String>, now: Instant, ttl: Duration) -> Self {
        Self {
            message: message.into(),
            expires_at: now + ttl,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// A validated file awaiting confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    file: SelectedFile,
    format: ImageFormat,
}

impl Preview {
    pub fn file(&self) -> &SelectedFile {
        &self.file
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Size rendered for display
    pub fn display_size(&self) -> String {
        format_file_size(self.file.size() as u64)
    }
}

/// Everything needed to send one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub file: SelectedFile,
    pub quality: Quality,
}

/// Outcome of a successful optimization
///
/// The payload is dropped once `expires_at` passes, whether or not it was
/// saved; the size figures survive for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedResult {
    original_size: usize,
    optimized_size: usize,
    download_name: String,
    data: Option<Bytes>,
    expires_at: Instant,
}

impl OptimizedResult {
    pub fn original_size(&self) -> usize {
        self.original_size
    }

    pub fn optimized_size(&self) -> usize {
        self.optimized_size
    }

    /// `round((1 - optimized / original) * 100)`
    pub fn reduction_percent(&self) -> i64 {
        reduction_percent(self.original_size, self.optimized_size)
    }

    /// Suggested name for saving the result
    pub fn download_name(&self) -> &str {
        &self.download_name
    }

    /// Optimized bytes, `None` once released
    pub fn data(&self) -> Option<&Bytes> {
        self.data.as_ref()
    }

    pub fn is_released(&self) -> bool {
        self.data.is_none()
    }

    fn release_if_expired(&mut self, now: Instant) {
        if now >= self.expires_at {
            self.data = None;
        }
    }
}

/// Where the uploader currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploaderState {
    Idle,
    Previewing(Preview),
    Submitting(Preview),
    Completed(OptimizedResult),
    Failed(Preview),
}

impl UploaderState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Previewing(_) => "previewing",
            Self::Submitting(_) => "submitting",
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
        }
    }
}

/// Explicit uploader state, owned by whoever drives the UI
#[derive(Debug)]
pub struct Uploader {
    config: UploaderConfig,
    state: UploaderState,
    quality: Quality,
    notice: Option<Notice>,
}

impl Uploader {
    pub fn new(config: UploaderConfig) -> Self {
        let quality = config.default_quality;
        Self {
            config,
            state: UploaderState::Idle,
            quality,
            notice: None,
        }
    }

    pub fn state(&self) -> &UploaderState {
        &self.state
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// The file being previewed, if that is the current state
    pub fn preview(&self) -> Option<&Preview> {
        match &self.state {
            UploaderState::Previewing(preview) => Some(preview),
            _ => None,
        }
    }

    /// The finished result, if that is the current state
    pub fn result(&self) -> Option<&OptimizedResult> {
        match &self.state {
            UploaderState::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    /// Validate a file and move to `Previewing`
    ///
    /// On a validation failure a notice is raised and the state is left as
    /// it was.
    pub fn select(&mut self, file: SelectedFile, now: Instant) -> Result<&Preview, UploaderError> {
        if matches!(self.state, UploaderState::Submitting(_)) {
            return Err(UploaderError::Busy);
        }

        let format = match validate_file(&file, &self.config) {
            Ok(format) => format,
            Err(err) => {
                self.raise(err.to_string(), now);
                return Err(err);
            }
        };

        self.state = UploaderState::Previewing(Preview { file, format });
        self.preview().ok_or(UploaderError::NothingSelected)
    }

    pub fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
    }

    /// Confirm the previewed file and move to `Submitting`
    ///
    /// Also valid from `Failed`, which retries the same file.
    pub fn submit(&mut self, now: Instant) -> Result<Submission, UploaderError> {
        let state = std::mem::replace(&mut self.state, UploaderState::Idle);

        match state {
            UploaderState::Previewing(preview) | UploaderState::Failed(preview) => {
                let submission = Submission {
                    file: preview.file.clone(),
                    quality: self.quality,
                };
                self.state = UploaderState::Submitting(preview);
                Ok(submission)
            }
            UploaderState::Submitting(preview) => {
                self.state = UploaderState::Submitting(preview);
                Err(UploaderError::Busy)
            }
            other => {
                self.state = other;
                let err = UploaderError::NothingSelected;
                self.raise(err.to_string(), now);
                Err(err)
            }
        }
    }

    /// Record the server's optimized bytes and move to `Completed`
    pub fn complete(&mut self, data: Bytes, now: Instant) -> Result<&OptimizedResult, UploaderError> {
        let preview = match &self.state {
            UploaderState::Submitting(preview) => preview,
            _ => return Err(UploaderError::NotSubmitting),
        };

        let result = OptimizedResult {
            original_size: preview.file.size(),
            optimized_size: data.len(),
            download_name: optimized_file_name(preview.file.name()),
            data: Some(data),
            expires_at: now + self.config.result_ttl,
        };

        self.state = UploaderState::Completed(result);
        self.result().ok_or(UploaderError::NotSubmitting)
    }

    /// Record a failed request and move to `Failed`, keeping the file for a retry
    pub fn fail(&mut self, message: impl Into<String>, now: Instant) -> Result<(), UploaderError> {
        let state = std::mem::replace(&mut self.state, UploaderState::Idle);

        match state {
            UploaderState::Submitting(preview) => {
                self.state = UploaderState::Failed(preview);
                self.raise(message, now);
                Ok(())
            }
            other => {
                self.state = other;
                Err(UploaderError::NotSubmitting)
            }
        }
    }

    /// Back to `Idle` with the default quality
    pub fn reset(&mut self) {
        self.state = UploaderState::Idle;
        self.quality = self.config.default_quality;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Expire the notice and release the result payload when their time is up
    pub fn tick(&mut self, now: Instant) {
        if self.notice.as_ref().is_some_and(|notice| notice.is_expired(now)) {
            self.notice = None;
        }

        if let UploaderState::Completed(result) = &mut self.state {
            result.release_if_expired(now);
        }
    }

    fn raise(&mut self, message: impl Into<String>, now: Instant) {
        self.notice = Some(Notice::new(message, now, self.config.notice_ttl));
    }
}

impl Default for Uploader {
    fn default() -> Self {
        Self::new(UploaderConfig::default())
    }
}
