//! Build-time sizing of the slot store.

use serde::Serialize;

/// Layer count used when none is configured.
pub const DEFAULT_LAYERS: usize = 8;

/// Slot capacity used when none is configured.
pub const DEFAULT_SLOTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("layer count must be at least 1")]
    NoLayers,
    #[error("slot capacity must be at least 1")]
    NoSlots,
}

/// Layer count and slot capacity, fixed for the lifetime of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotConfig {
    layers: usize,
    slots: usize,
}

impl SlotConfig {
    pub fn new(layers: usize, slots: usize) -> Result<Self, ConfigError> {
        if layers == 0 {
            return Err(ConfigError::NoLayers);
        }
        if slots == 0 {
            return Err(ConfigError::NoSlots);
        }
        Ok(Self { layers, slots })
    }

    /// Number of keymap layers (`L`).
    pub fn layers(&self) -> usize {
        self.layers
    }

    /// Number of stored slots (`N`).
    pub fn slots(&self) -> usize {
        self.slots
    }
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            layers: DEFAULT_LAYERS,
            slots: DEFAULT_SLOTS,
        }
    }
}
