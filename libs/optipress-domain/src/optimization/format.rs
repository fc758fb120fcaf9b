//! Accepted source image formats
//!
//! Only JPEG, PNG and WebP sources are accepted. Both the server and the
//! client uploader check declared MIME types against this allow-list.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Image formats accepted as optimization input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    /// Every accepted format, in display order
    pub const ALL: [ImageFormat; 3] = [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Webp];

    /// Resolve a declared MIME type against the allow-list
    ///
    /// Matching is case-insensitive and tolerates MIME parameters
    /// (`image/png; charset=binary`). The non-standard `image/jpg` alias is
    /// accepted because some browsers and tools still send it.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();

        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Canonical MIME type for this format
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    /// Short human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Webp => "WebP",
        }
    }

    /// Comma-separated list of accepted formats, for error messages
    pub fn allowed_list() -> String {
        Self::ALL
            .iter()
            .map(|format| format.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}
