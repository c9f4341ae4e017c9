use crate::writer::WriteError;

/// Status codes reported to the shell, errno style. Errors are negated.
pub mod codes {
    pub const OK: i32 = 0;
    pub const NOT_INITIALIZED: i32 = 1;
    pub const ENOENT: i32 = 2;
    pub const EIO: i32 = 5;
    pub const EEXIST: i32 = 17;
    pub const EINVAL: i32 = 22;
    pub const ENOTSUP: i32 = 134;
}

/// Errors from slot store operations.
///
/// Slot indices are stored 0-based and displayed 1-based.
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("slot store not initialized; run \"keymap init\" or \"keymap status\" first")]
    NotInitialized,

    #[error("invalid slot {}, must be between 1 and {capacity}", .index + 1)]
    InvalidSlot { index: usize, capacity: usize },

    #[error("no slot named '{name}'")]
    SlotNotFound { name: String },

    #[error("slot {} is empty", .index + 1)]
    SlotEmpty { index: usize },

    #[error("slot {} is occupied; use overwrite to replace it", .index + 1)]
    SlotOccupied { index: usize },

    #[error("keymap is empty, nothing to save")]
    SystemEmpty,

    #[error("slot name must not be empty")]
    EmptyName,

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl SlotError {
    /// Numeric status for this error, always negative.
    pub fn code(&self) -> i32 {
        let code = match self {
            SlotError::NotInitialized => codes::NOT_INITIALIZED,
            SlotError::InvalidSlot { .. } | SlotError::EmptyName => codes::EINVAL,
            SlotError::SlotNotFound { .. } | SlotError::SlotEmpty { .. } => codes::ENOENT,
            SlotError::SlotOccupied { .. } => codes::EEXIST,
            SlotError::SystemEmpty => codes::ENOTSUP,
            SlotError::Write(_) => codes::EIO,
        };
        -code
    }
}
