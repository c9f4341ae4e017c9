//! File-backed settings backend.
//!
//! The whole store lives in one JSON document mapping key strings to base64
//! payloads. Every mutation rewrites the document through a temporary file and
//! a rename, so a crash never leaves a half-written document behind. Like a
//! flash settings partition, each write is durable on its own: there is no
//! rollback across several writes.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{Key, SettingsError, SettingsReader, SettingsWriter, SliceSource, Visitor};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// Settings persisted as a single JSON document on disk.
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    entries: BTreeMap<Key, Bytes>,
}

impl FileSettings {
    /// Open the document at `path`. A missing file is an empty store; the file
    /// (and its parent directories) are created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let entries = if path.exists() {
            tracing::debug!(path = %path.display(), "reading settings document");
            Self::read_document(&path)?
        } else {
            tracing::debug!(path = %path.display(), "settings document absent, starting empty");
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn read_document(path: &Path) -> Result<BTreeMap<Key, Bytes>, SettingsError> {
        let text = fs::read_to_string(path)?;
        let document: Document = serde_json::from_str(&text)?;

        let mut entries = BTreeMap::new();
        for (raw_key, encoded) in document.entries {
            let key = Key::parse(&raw_key).map_err(|e| SettingsError::Corrupt {
                key: raw_key.clone(),
                message: e.to_string(),
            })?;
            let data = STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| SettingsError::Corrupt {
                    key: raw_key.clone(),
                    message: format!("payload is not base64: {}", e),
                })?;
            entries.insert(key, Bytes::from(data));
        }
        Ok(entries)
    }

    fn persist(&self) -> Result<(), SettingsError> {
        let document = Document {
            entries: self
                .entries
                .iter()
                .map(|(k, v)| (k.to_string(), STANDARD.encode(v)))
                .collect(),
        };
        let text = serde_json::to_string_pretty(&document)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.path.with_extension("tmp");
        {
            let mut f = fs::File::create(&tmp_path)?;
            f.write_all(text.as_bytes())?;
        }
        fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(path = %self.path.display(), keys = self.entries.len(), "settings document written");
        Ok(())
    }
}

impl SettingsReader for FileSettings {
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

impl SettingsWriter for FileSettings {
    fn save_one(&mut self, key: &Key, data: Bytes) -> Result<(), SettingsError> {
        let previous = self.entries.insert(key.clone(), data);
        if let Err(e) = self.persist() {
            match previous {
                Some(old) => self.entries.insert(key.clone(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn delete(&mut self, key: &Key) -> Result<(), SettingsError> {
        if let Some(old) = self.entries.remove(key) {
            if let Err(e) = self.persist() {
                self.entries.insert(key.clone(), old);
                return Err(e);
            }
        }
        Ok(())
    }

    fn delete_subtree(&mut self, prefix: &Key) -> Result<(), SettingsError> {
        let removed: Vec<Key> = self
            .entries
            .keys()
            .filter(|k| k.has_prefix(prefix))
            .cloned()
            .collect();
        if removed.is_empty() {
            return Ok(());
        }

        let snapshot = self.entries.clone();
        self.entries.retain(|k, _| !k.has_prefix(prefix));
        if let Err(e) = self.persist() {
            self.entries = snapshot;
            return Err(e);
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SettingsError> {
        if self.path.exists() {
            fs::File::open(&self.path)?.sync_all()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{key, ByteSource};

    fn read(settings: &mut FileSettings, k: &Key) -> Option<Vec<u8>> {
        let mut found = None;
        settings
            .load_subtree(k, &mut |suffix, source| {
                if suffix.is_empty() {
                    let mut buf = vec![0u8; source.len()];
                    source.read_into(&mut buf);
                    found = Some(buf);
                }
                Ok(())
            })
            .unwrap();
        found
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let settings = FileSettings::open(dir.path().join("settings.json")).unwrap();
        assert!(settings.is_empty());
    }

    #[test]
    fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        {
            let mut settings = FileSettings::open(&path).unwrap();
            settings
                .save_one(&key!("keymap/l/0/5"), Bytes::from_static(&[0xAA, 0x01]))
                .unwrap();
            settings
                .save_one(&key!("slots/0/_name"), Bytes::from_static(b"base"))
                .unwrap();
            settings.commit().unwrap();
        }

        let mut reopened = FileSettings::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(
            read(&mut reopened, &key!("keymap/l/0/5")),
            Some(vec![0xAA, 0x01])
        );
    }

    #[test]
    fn delete_subtree_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = FileSettings::open(&path).unwrap();
        settings
            .save_one(&key!("slots/1/_name"), Bytes::from_static(b"x"))
            .unwrap();
        settings
            .save_one(&key!("slots/1/layer_order"), Bytes::from_static(b"\x00"))
            .unwrap();
        settings
            .save_one(&key!("slots/2/_name"), Bytes::from_static(b"y"))
            .unwrap();
        settings.delete_subtree(&key!("slots/1")).unwrap();

        let reopened = FileSettings::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn corrupt_payload_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"entries": {"keymap/layer_order": "%%%"}}"#).unwrap();

        let err = FileSettings::open(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Corrupt { .. }));
    }

    #[test]
    fn corrupt_key_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"entries": {"keymap/bad key": "AA=="}}"#).unwrap();

        let err = FileSettings::open(&path).unwrap_err();
        assert!(err.to_string().contains("keymap/bad key"));
    }
}
