//! Error taxonomy for the localization runtime.
//!
//! Only a few of these ever reach a caller. Missing translation keys are not
//! errors at all (they resolve through the fallback policy), and load or
//! storage failures degrade to default content after being logged.

use thiserror::Error;

/// Errors produced by the localization runtime.
#[derive(Debug, Error)]
pub enum I18nError {
    /// The requested language code is not present in the registry.
    #[error("Language '{0}' was not found in the registry")]
    MissingLanguage(String),

    /// A dataset loader failed.
    #[error("Failed to load language '{code}': {message}")]
    LoadFailure { code: String, message: String },

    /// A schema node has an unsupported shape (number, bool or null leaf,
    /// or a non-object root).
    #[error("Invalid schema at '{path}': {reason}")]
    InvalidSchema { path: String, reason: String },

    /// The preference store could not be read or written.
    #[error("Preference storage unavailable: {0}")]
    Storage(String),

    /// The language manifest is malformed.
    #[error("Invalid manifest: {0}")]
    Manifest(String),
}

impl I18nError {
    pub(crate) fn invalid_schema(path: &str, reason: impl Into<String>) -> Self {
        I18nError::InvalidSchema {
            path: if path.is_empty() {
                "<root>".to_string()
            } else {
                path.to_string()
            },
            reason: reason.into(),
        }
    }
}
