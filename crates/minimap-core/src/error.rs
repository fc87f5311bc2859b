//! Error types shared across the crate.

use thiserror::Error;

/// Errors produced while parsing a hex color string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    /// The string does not start with `#`.
    #[error("color must start with '#'")]
    MissingHash,
    /// The hex body is neither 6 nor 8 digits long.
    #[error("expected 6 or 8 hex digits, got {0}")]
    BadLength(usize),
    /// The hex body contains a non-hex character.
    #[error("invalid hex digit in color")]
    BadDigit,
}

/// Errors produced by the settings model and its stores.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or writing the settings file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The settings could not be encoded or decoded as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A value of the wrong type was applied to a setting.
    #[error("setting '{key}' expects a {expected} value")]
    TypeMismatch {
        /// Persisted key of the setting.
        key: &'static str,
        /// Expected value kind (`"bool"`, `"number"`, `"color"`).
        expected: &'static str,
    },
    /// A NaN or infinite number was applied to a numeric setting.
    #[error("setting '{key}' rejects non-finite numbers")]
    NonFinite {
        /// Persisted key of the setting.
        key: &'static str,
    },
    /// A header color was addressed with a level outside `1..=6`.
    #[error("header level {0} is outside 1..=6")]
    InvalidHeaderLevel(u8),
}

/// Errors reported by a host while preloading an embedded image.
///
/// Preload failures never reach the user; the engine records the image as
/// unavailable and keeps painting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreloadError {
    /// The host has no image loading facility.
    #[error("image preloading is not supported by this host")]
    Unsupported,
    /// The referenced image does not exist.
    #[error("image not found: {0}")]
    NotFound(String),
    /// Loading started but failed.
    #[error("failed to load image '{reference}': {message}")]
    Failed {
        /// The image reference as written in the document.
        reference: String,
        /// Host-provided failure description.
        message: String,
    },
}
