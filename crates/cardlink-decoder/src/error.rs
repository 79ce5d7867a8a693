//! Decode failure taxonomy.

use serde_json::error::Category;

/// Result type alias for decode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors that can occur while turning a reader frame into a profile.
///
/// Missing fields *inside* the positional array are never errors; they
/// decode to placeholders. These variants cover frames whose envelope cannot
/// be trusted at all.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Frame body is not valid JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Frame is JSON but does not have the card message shape.
    #[error("Malformed card message: {0}")]
    Malformed(#[source] serde_json::Error),

    /// A mandatory part of the envelope is absent.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

impl DecodeError {
    /// Classify a `serde_json` failure.
    ///
    /// Type mismatches become [`DecodeError::Malformed`]; syntax and
    /// truncation errors become [`DecodeError::InvalidJson`].
    pub fn from_json(error: serde_json::Error) -> Self {
        match error.classify() {
            Category::Data => Self::Malformed(error),
            Category::Syntax | Category::Eof | Category::Io => Self::InvalidJson(error),
        }
    }

    /// Create a new missing field error.
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField(field)
    }
}
