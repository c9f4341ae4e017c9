//! Keymap Slots: Stored Keymap Snapshots
//!
//! A device keeps its live keymap under the `keymap` settings namespace. This
//! crate adds a fixed number of named slots under `slots/<n>` and moves
//! complete configurations between them:
//!
//! - [`codec`]: key layout of one configuration inside a namespace
//! - [`SlotRecord`]: in-memory snapshot (layer order, layer names, bindings)
//! - [`loader`]: stream a namespace out of the settings store into a record
//! - [`writer`]: replace a namespace with the contents of a record
//! - [`equality`]: decide whether a slot matches the live keymap
//! - [`SlotStore`]: the slot table plus the live record, with lifecycle
//!
//! # Example
//!
//! ```rust
//! use keymap_settings::{key, Bytes, MemorySettings, SettingsWriter};
//! use keymap_slots::{SaveMode, SlotConfig, SlotStore};
//!
//! let mut settings = MemorySettings::new();
//! settings.save_one(&key!("keymap/layer_order"), Bytes::from_static(&[0, 1])).unwrap();
//! settings.save_one(&key!("keymap/l/0/5"), Bytes::from_static(&[0xAA, 0x01])).unwrap();
//!
//! let mut store = SlotStore::new(settings, SlotConfig::default());
//! store.init();
//! store.save(0, "base", SaveMode::Save).unwrap();
//!
//! assert_eq!(store.active_slot(), Some(0));
//! ```

pub mod codec;
pub mod config;
pub mod consumer;
pub mod equality;
mod error;
pub mod loader;
pub mod record;
pub mod store;
pub mod writer;

pub use codec::{DecodeError, Field, Namespace};
pub use config::{ConfigError, SlotConfig};
pub use consumer::{KeymapConsumer, NoopConsumer};
pub use equality::{is_active, records_equal, Mismatch};
pub use error::{codes, SlotError};
pub use loader::{LoadError, LoadSummary};
pub use record::{Binding, LayerBindings, RecordError, SlotRecord};
pub use store::{
    InitOutcome, LoadFailure, RecordLoad, SaveMode, SharedSlotStore, SlotStatus, SlotStore,
    StatusReport,
};
pub use writer::{WriteError, WriteSummary};
