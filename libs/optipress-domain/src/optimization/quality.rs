//! JPEG quality parameter

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::OptimizationError;

/// JPEG encoder quality, always within `[Quality::MIN, Quality::MAX]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 10;
    pub const MAX: u8 = 100;
    pub const DEFAULT: Quality = Quality(80);

    /// Build a quality value, rejecting anything outside `[MIN, MAX]`
    pub fn new(value: i64) -> Result<Self, OptimizationError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(OptimizationError::quality_out_of_range(value.to_string()))
        }
    }

    /// Parse a quality form field
    ///
    /// Blank input means "not supplied" and yields `Ok(None)`. Anything that
    /// is not an integer (`high`, `7.5`, `80abc`) is reported the same way as
    /// an out-of-range value and is never replaced by
    /// [`Quality::DEFAULT`].
    pub fn parse_field(raw: &str) -> Result<Option<Self>, OptimizationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let value = trimmed
            .parse::<i64>()
            .map_err(|_| OptimizationError::quality_out_of_range(trimmed))?;

        Self::new(value).map(Some)
    }

    /// Raw value as passed to the encoder
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Quality {
    type Error = OptimizationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}
