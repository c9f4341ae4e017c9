//! Keymap Settings: Hierarchical Key-Value Store
//!
//! This is the narrow waist below the slot store. Everything at this level is
//! keys and opaque bytes - no knowledge of layers, bindings or slots.
//!
//! A settings backend offers four primitives:
//! - enumerate a key subtree, handing out lazily-read payloads
//! - write one key
//! - delete one key or a whole subtree
//! - commit pending changes
//!
//! # Example
//!
//! ```rust
//! use keymap_settings::{key, Bytes, MemorySettings, SettingsReader, SettingsWriter};
//!
//! let mut settings = MemorySettings::new();
//! settings.save_one(&key!("keymap/layer_order"), Bytes::from_static(&[0, 1])).unwrap();
//! settings.commit().unwrap();
//!
//! let mut seen = Vec::new();
//! settings
//!     .load_subtree(&key!("keymap"), &mut |suffix, source| {
//!         seen.push((suffix.to_string(), source.len()));
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(seen, vec![("layer_order".to_string(), 2)]);
//! ```

pub use bytes::Bytes;

mod error;
mod file;
mod key;
mod memory;
mod traits;

pub use error::SettingsError;
pub use file::FileSettings;
pub use key::{Key, KeyError};
pub use memory::MemorySettings;
pub use traits::{ByteSource, SettingsReader, SettingsStore, SettingsWriter, SliceSource, Visitor};
