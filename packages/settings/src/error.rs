//! Error types for the settings layer.
//!
//! Errors at this level are storage-focused. Nothing here knows about slots
//! or layers - those belong in higher layers.

use crate::key::KeyError;

/// Errors raised by a settings backend.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// I/O failure in the backing medium.
    #[error("settings i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted document could not be (de)serialized.
    #[error("settings document error: {0}")]
    Json(#[from] serde_json::Error),

    /// A persisted key or payload failed validation.
    #[error("corrupt settings entry '{key}': {message}")]
    Corrupt { key: String, message: String },

    /// Key validation error.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// The operation is not supported by this backend.
    #[error("operation not supported")]
    NotSupported,

    /// Resource limit exceeded (memory, flash sectors, handles).
    #[error("resource exhausted")]
    ResourceExhausted,

    /// Generic error with message.
    #[error("{message}")]
    Other { message: String },
}
