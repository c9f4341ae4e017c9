//! Replace a namespace with the contents of a [`SlotRecord`].
//!
//! Writing clears and commits the namespace, writes every field, and commits
//! once more at the end. There is no rollback: a failure part way through
//! leaves the destination holding only the fields written so far, and the
//! error says so.

use keymap_settings::{SettingsError, SettingsWriter};
use serde::Serialize;

use crate::codec::{Field, Namespace};
use crate::record::SlotRecord;

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to clear '{namespace}': {source}")]
    Clear {
        namespace: Namespace,
        #[source]
        source: SettingsError,
    },

    #[error("failed to write {field} to '{namespace}'; destination is not guaranteed consistent: {source}")]
    Field {
        namespace: Namespace,
        field: Field,
        #[source]
        source: SettingsError,
    },

    #[error("failed to commit '{namespace}': {source}")]
    Commit {
        namespace: Namespace,
        #[source]
        source: SettingsError,
    },
}

impl WriteError {
    pub fn namespace(&self) -> Namespace {
        match self {
            WriteError::Clear { namespace, .. }
            | WriteError::Field { namespace, .. }
            | WriteError::Commit { namespace, .. } => *namespace,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub keys_written: usize,
    pub bytes_written: usize,
}

/// Delete every key under `namespace` and commit.
pub fn clear_namespace<W>(settings: &mut W, namespace: Namespace) -> Result<(), WriteError>
where
    W: SettingsWriter + ?Sized,
{
    settings
        .delete_subtree(&namespace.root())
        .map_err(|source| WriteError::Clear { namespace, source })?;
    settings
        .commit()
        .map_err(|source| WriteError::Commit { namespace, source })?;
    tracing::debug!(%namespace, "namespace cleared");
    Ok(())
}

/// Clear `namespace`, then write every populated field of `record` into it.
///
/// The clear is committed on its own. Field order: the slot name (slot
/// namespaces only), the layer order and every layer name when non-empty, then
/// every layer's bindings. A single commit follows the last field.
pub fn write_record<W>(
    settings: &mut W,
    record: &SlotRecord,
    namespace: Namespace,
) -> Result<WriteSummary, WriteError>
where
    W: SettingsWriter + ?Sized,
{
    clear_namespace(settings, namespace)?;

    let mut summary = WriteSummary::default();
    let mut put = |field: Field, data: bytes::Bytes| -> Result<(), WriteError> {
        let len = data.len();
        settings
            .save_one(&namespace.key(field), data)
            .map_err(|source| {
                tracing::error!(%namespace, %field, error = %source, "write failed part way");
                WriteError::Field {
                    namespace,
                    field,
                    source,
                }
            })?;
        summary.keys_written += 1;
        summary.bytes_written += len;
        Ok(())
    };

    if namespace.has_name() {
        if let Some(name) = record.name() {
            put(Field::Name, bytes::Bytes::copy_from_slice(name.as_bytes()))?;
        }
    }

    if let Some(order) = record.layer_order() {
        if !order.is_empty() {
            put(Field::LayerOrder, order.clone())?;
        }
    }

    for layer in 0..record.layer_count() {
        if let Some(name) = record.layer_name(layer).filter(|n| !n.is_empty()) {
            put(Field::LayerName(layer), name.clone())?;
        }
    }

    for layer in 0..record.layer_count() {
        for binding in record.bindings(layer) {
            let field = Field::Binding {
                layer,
                position: binding.position,
            };
            put(field, binding.payload.clone())?;
        }
    }

    settings
        .commit()
        .map_err(|source| WriteError::Commit { namespace, source })?;

    tracing::debug!(
        %namespace,
        keys = summary.keys_written,
        bytes = summary.bytes_written,
        "record written"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use keymap_settings::{key, Key, MemorySettings};

    /// Fails every `save_one` after `allowed` successful ones.
    struct FailAfter {
        inner: MemorySettings,
        allowed: usize,
    }

    impl SettingsWriter for FailAfter {
        fn save_one(&mut self, key: &Key, data: Bytes) -> Result<(), SettingsError> {
            if self.allowed == 0 {
                return Err(SettingsError::Other {
                    message: "flash full".to_string(),
                });
            }
            self.allowed -= 1;
            self.inner.save_one(key, data)
        }

        fn delete(&mut self, key: &Key) -> Result<(), SettingsError> {
            self.inner.delete(key)
        }

        fn delete_subtree(&mut self, prefix: &Key) -> Result<(), SettingsError> {
            self.inner.delete_subtree(prefix)
        }

        fn commit(&mut self) -> Result<(), SettingsError> {
            self.inner.commit()
        }
    }

    fn sample() -> SlotRecord {
        SlotRecord::new(2)
            .with_name("base")
            .with_layer_order(vec![0u8, 1])
            .with_layer_name(1, &b"nav"[..])
            .unwrap()
            .with_binding(0, 5, vec![0xAA, 0x01])
            .unwrap()
            .with_binding(1, 2, vec![0x03])
            .unwrap()
    }

    #[test]
    fn writes_all_fields_to_slot() {
        let mut settings = MemorySettings::new();
        let summary = write_record(&mut settings, &sample(), Namespace::Slot(0)).unwrap();

        assert_eq!(summary.keys_written, 5);
        assert_eq!(summary.bytes_written, 4 + 2 + 3 + 2 + 1);
        assert_eq!(settings.get(&key!("slots/0/_name")).unwrap().as_ref(), b"base");
        assert_eq!(
            settings.get(&key!("slots/0/l/0/5")).unwrap().as_ref(),
            &[0xAA, 0x01]
        );
        assert!(settings.contains(&key!("slots/0/l_n/1")));
        assert!(!settings.contains(&key!("slots/0/l_n/0")));
        assert_eq!(settings.commit_count(), 2);
    }

    #[test]
    fn system_namespace_never_gets_a_name() {
        let mut settings = MemorySettings::new();
        write_record(&mut settings, &sample(), Namespace::System).unwrap();

        assert!(!settings.contains(&key!("keymap/_name")));
        assert!(settings.contains(&key!("keymap/layer_order")));
    }

    #[test]
    fn stale_keys_are_cleared() {
        let mut settings = MemorySettings::new();
        settings
            .save_one(&key!("slots/1/l/3/9"), Bytes::from_static(&[1]))
            .unwrap();
        settings
            .save_one(&key!("slots/2/_name"), Bytes::from_static(b"keep"))
            .unwrap();

        write_record(&mut settings, &sample(), Namespace::Slot(1)).unwrap();

        assert!(!settings.contains(&key!("slots/1/l/3/9")));
        assert!(settings.contains(&key!("slots/2/_name")));
    }

    #[test]
    fn empty_layer_order_is_not_written() {
        let record = SlotRecord::new(1)
            .with_layer_order(Bytes::new())
            .with_binding(0, 1, vec![1])
            .unwrap();
        let mut settings = MemorySettings::new();
        write_record(&mut settings, &record, Namespace::System).unwrap();

        assert!(!settings.contains(&key!("keymap/layer_order")));
        assert_eq!(settings.len(), 1);
    }

    #[test]
    fn failure_part_way_is_reported_with_field() {
        let mut settings = FailAfter {
            inner: MemorySettings::new(),
            allowed: 2,
        };

        let err = write_record(&mut settings, &sample(), Namespace::Slot(0)).unwrap_err();

        match &err {
            WriteError::Field { field, .. } => assert_eq!(*field, Field::LayerName(1)),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.namespace(), Namespace::Slot(0));
        assert!(err.to_string().contains("not guaranteed consistent"));
        assert_eq!(settings.inner.len(), 2);
        // only the clear was committed
        assert_eq!(settings.inner.commit_count(), 1);
    }

    #[test]
    fn clear_namespace_removes_only_that_slot() {
        let mut settings = MemorySettings::new();
        write_record(&mut settings, &sample(), Namespace::Slot(0)).unwrap();
        write_record(&mut settings, &sample(), Namespace::Slot(1)).unwrap();

        clear_namespace(&mut settings, Namespace::Slot(0)).unwrap();

        assert!(settings.keys_under(&key!("slots/0")).is_empty());
        assert_eq!(settings.keys_under(&key!("slots/1")).len(), 5);
    }
}
