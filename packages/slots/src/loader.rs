//! Stream one namespace out of the settings store into a [`SlotRecord`].
//!
//! Fields may arrive in any order. Problems with a single key (empty name,
//! short read, undecodable index) skip that key and are reported in the
//! [`LoadSummary`]; enumeration carries on. Running out of memory aborts the
//! whole record, and the target is left empty rather than half-grown.

use bytes::Bytes;
use keymap_settings::{ByteSource, Key, SettingsError, SettingsReader};
use serde::Serialize;

use crate::codec::{self, DecodeError, Field, Namespace};
use crate::record::{Binding, RecordError, SlotRecord};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// An allocation failed; the record was discarded.
    #[error("out of memory loading {field} from '{namespace}'")]
    OutOfMemory { namespace: Namespace, field: Field },

    /// Enumeration of the subtree failed; the record may be partially populated.
    #[error("failed to read '{namespace}': {source}")]
    Storage {
        namespace: Namespace,
        #[source]
        source: SettingsError,
    },
}

/// Why a key was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// A zero-length slot name signals corrupted storage.
    EmptyName,
    /// The slot name is not valid UTF-8.
    InvalidName,
    /// Fewer bytes were delivered than the stored length.
    ShortRead { expected: usize, actual: usize },
    /// The key names one of our fields but its index is unusable.
    Undecodable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub key: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Loaded {
    pub field: Field,
    pub len: usize,
}

/// What one load saw.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub loaded: Vec<Loaded>,
    pub skipped: Vec<Skipped>,
    /// Keys that matched no field shape.
    pub ignored: usize,
}

impl LoadSummary {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

enum Payload {
    Complete(Bytes),
    Short { expected: usize, actual: usize },
}

struct OutOfMemory;

fn read_payload(source: &mut dyn ByteSource) -> Result<Payload, OutOfMemory> {
    let expected = source.len();
    let mut buf = Vec::new();
    buf.try_reserve_exact(expected).map_err(|_| OutOfMemory)?;
    buf.resize(expected, 0);

    let actual = source.read_into(&mut buf);
    if actual != expected {
        return Ok(Payload::Short { expected, actual });
    }
    Ok(Payload::Complete(Bytes::from(buf)))
}

/// Load `namespace` into a fresh record with `layers` layers.
///
/// Any error discards the partially read record; use [`load_into`] to keep it.
pub fn load<R>(settings: &mut R, namespace: Namespace, layers: usize) -> Result<SlotRecord, LoadError>
where
    R: SettingsReader + ?Sized,
{
    let mut record = SlotRecord::new(layers);
    load_into(settings, namespace, &mut record)?;
    Ok(record)
}

/// Replace the contents of `target` with what is stored under `namespace`.
///
/// The record is built in a scratch copy and swapped in at the end:
/// - on success `target` holds the loaded record;
/// - on [`LoadError::Storage`] `target` holds whatever was read before the
///   failure;
/// - on [`LoadError::OutOfMemory`] `target` is left freed.
pub fn load_into<R>(
    settings: &mut R,
    namespace: Namespace,
    target: &mut SlotRecord,
) -> Result<LoadSummary, LoadError>
where
    R: SettingsReader + ?Sized,
{
    let layers = target.layer_count();
    target.free();

    let mut scratch = SlotRecord::new(layers);
    let mut summary = LoadSummary::default();
    let mut oom: Option<Field> = None;

    let result = settings.load_subtree(&namespace.root(), &mut |suffix, source| {
        match visit(&mut scratch, &mut summary, suffix, source, layers) {
            Ok(()) => Ok(()),
            Err(field) => {
                oom = Some(field);
                Err(SettingsError::ResourceExhausted)
            }
        }
    });

    if let Some(field) = oom {
        tracing::error!(%namespace, %field, "out of memory, discarding record");
        return Err(LoadError::OutOfMemory { namespace, field });
    }

    *target = scratch;

    if let Err(source) = result {
        tracing::error!(%namespace, error = %source, "failed to load subtree");
        return Err(LoadError::Storage { namespace, source });
    }

    tracing::debug!(
        %namespace,
        bytes = target.total_size(),
        fields = summary.loaded.len(),
        skipped = summary.skipped.len(),
        "record loaded"
    );
    Ok(summary)
}

/// Copy one key into `record`. `Err` carries the field whose allocation failed.
fn visit(
    record: &mut SlotRecord,
    summary: &mut LoadSummary,
    suffix: &Key,
    source: &mut dyn ByteSource,
    layers: usize,
) -> Result<(), Field> {
    let field = match codec::decode(suffix, layers) {
        Ok(Some(field)) => field,
        Ok(None) => {
            summary.ignored += 1;
            return Ok(());
        }
        Err(e) => {
            skip(summary, suffix, SkipReason::Undecodable(e.to_string()), &e);
            return Ok(());
        }
    };

    if field == Field::Name && source.is_empty() {
        let reason = SkipReason::EmptyName;
        tracing::warn!(key = %suffix, "empty slot name, storage may be corrupted");
        summary.skipped.push(Skipped {
            key: suffix.to_string(),
            reason,
        });
        return Ok(());
    }

    let data = match read_payload(source).map_err(|_| field)? {
        Payload::Complete(data) => data,
        Payload::Short { expected, actual } => {
            tracing::warn!(key = %suffix, expected, actual, "short read, field dropped");
            summary.skipped.push(Skipped {
                key: suffix.to_string(),
                reason: SkipReason::ShortRead { expected, actual },
            });
            return Ok(());
        }
    };
    let len = data.len();

    match field {
        Field::Name => match String::from_utf8(data.to_vec()) {
            Ok(name) => record.set_name(Some(name)),
            Err(_) => {
                tracing::warn!(key = %suffix, "slot name is not UTF-8");
                summary.skipped.push(Skipped {
                    key: suffix.to_string(),
                    reason: SkipReason::InvalidName,
                });
                return Ok(());
            }
        },
        Field::LayerOrder => record.set_layer_order(Some(data)),
        Field::LayerName(layer) => {
            // decode() already bounded the layer
            if let Err(e) = record.set_layer_name(layer, Some(data)) {
                skip_record_error(summary, suffix, e);
                return Ok(());
            }
        }
        Field::Binding { layer, position } => {
            match record.insert_binding(layer, Binding::new(position, data)) {
                Ok(()) => {}
                Err(RecordError::OutOfMemory { .. }) => return Err(field),
                Err(e) => {
                    skip_record_error(summary, suffix, e);
                    return Ok(());
                }
            }
        }
    }

    tracing::debug!(key = %suffix, len, "loaded {}", field);
    summary.loaded.push(Loaded { field, len });
    Ok(())
}

fn skip(summary: &mut LoadSummary, suffix: &Key, reason: SkipReason, error: &DecodeError) {
    tracing::warn!(key = %suffix, %error, "skipping undecodable key");
    summary.skipped.push(Skipped {
        key: suffix.to_string(),
        reason,
    });
}

fn skip_record_error(summary: &mut LoadSummary, suffix: &Key, error: RecordError) {
    tracing::warn!(key = %suffix, %error, "skipping key");
    summary.skipped.push(Skipped {
        key: suffix.to_string(),
        reason: SkipReason::Undecodable(error.to_string()),
    });
}
