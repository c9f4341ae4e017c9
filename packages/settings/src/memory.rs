//! In-memory settings backend.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::{Key, SettingsError, SettingsReader, SettingsWriter, SliceSource, Visitor};

/// An ordered in-memory settings store.
///
/// Writes are visible immediately; `commit` only counts calls so tests can
/// assert how often a caller flushed.
///
/// # Example
///
/// ```rust
/// use keymap_settings::{key, Bytes, MemorySettings, SettingsWriter};
///
/// let mut settings = MemorySettings::new();
/// settings.save_one(&key!("slots/0/_name"), Bytes::from_static(b"gaming")).unwrap();
/// assert_eq!(settings.get(&key!("slots/0/_name")).unwrap().as_ref(), b"gaming");
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemorySettings {
    entries: BTreeMap<Key, Bytes>,
    commits: usize,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Key) -> Option<&Bytes> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All stored keys at or below `prefix`, in order.
    pub fn keys_under(&self, prefix: &Key) -> Vec<Key> {
        self.entries
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.has_prefix(prefix))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// How many times `commit` was called.
    pub fn commit_count(&self) -> usize {
        self.commits
    }
}

impl SettingsReader for MemorySettings {
    fn load_subtree(
        &mut self,
        prefix: &Key,
        visitor: &mut Visitor<'_>,
    ) -> Result<(), SettingsError> {
        for (key, data) in self
            .entries
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.has_prefix(prefix))
        {
            let suffix = key.strip_prefix(prefix).unwrap_or_default();
            visitor(&suffix, &mut SliceSource::new(data))?;
        }
        Ok(())
    }
}

impl SettingsWriter for MemorySettings {
    fn save_one(&mut self, key: &Key, data: Bytes) -> Result<(), SettingsError> {
        self.entries.insert(key.clone(), data);
        Ok(())
    }

    fn delete(&mut self, key: &Key) -> Result<(), SettingsError> {
        self.entries.remove(key);
        Ok(())
    }

    fn delete_subtree(&mut self, prefix: &Key) -> Result<(), SettingsError> {
        self.entries.retain(|k, _| !k.has_prefix(prefix));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SettingsError> {
        self.commits += 1;
        Ok(())
    }
}
