//! Core traits for the settings layer.

use bytes::Bytes;

use crate::{Key, SettingsError};

/// A lazily-read payload handed out during enumeration.
///
/// Payloads can be large, so enumeration never copies them up front. The
/// consumer learns the stored length first and then pulls the bytes into a
/// buffer it owns.
pub trait ByteSource {
    /// Stored length of the payload in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy up to `buf.len()` bytes into `buf`.
    ///
    /// Returns the number of bytes actually copied. Anything less than
    /// requested is a short read.
    fn read_into(&mut self, buf: &mut [u8]) -> usize;
}

/// A [`ByteSource`] over a borrowed slice.
#[derive(Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }
}

impl ByteSource for SliceSource<'_> {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn read_into(&mut self, buf: &mut [u8]) -> usize {
        let remaining = &self.data[self.offset..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.offset += n;
        n
    }
}

/// Callback invoked once per key during [`SettingsReader::load_subtree`].
///
/// Receives the key suffix relative to the enumerated prefix and the payload
/// source. Returning an error aborts the enumeration.
pub type Visitor<'a> = dyn FnMut(&Key, &mut dyn ByteSource) -> Result<(), SettingsError> + 'a;

/// Enumerate stored keys.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn SettingsReader>`.
pub trait SettingsReader: Send {
    /// Visit every key at or below `prefix`, in key order.
    ///
    /// The visitor receives the suffix after `prefix` (empty for the prefix
    /// key itself). A visitor error stops the enumeration and is returned.
    fn load_subtree(&mut self, prefix: &Key, visitor: &mut Visitor<'_>)
        -> Result<(), SettingsError>;
}

/// Mutate stored keys.
///
/// Changes may be staged by the backend until [`SettingsWriter::commit`].
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn SettingsWriter>`.
pub trait SettingsWriter: Send {
    /// Store `data` under `key`, replacing any previous value.
    fn save_one(&mut self, key: &Key, data: Bytes) -> Result<(), SettingsError>;

    /// Remove one key. Removing an absent key succeeds.
    fn delete(&mut self, key: &Key) -> Result<(), SettingsError>;

    /// Remove `prefix` and every key below it.
    fn delete_subtree(&mut self, prefix: &Key) -> Result<(), SettingsError>;

    /// Make pending changes durable.
    fn commit(&mut self) -> Result<(), SettingsError>;
}

/// Combined read/write access to a settings backend.
pub trait SettingsStore: SettingsReader + SettingsWriter {}
impl<T: SettingsReader + SettingsWriter> SettingsStore for T {}

// Blanket implementations for references and boxes

impl<T: SettingsReader + ?Sized> SettingsReader for &mut T {
    fn load_subtree(
        &mut self,
        prefix: &Key,
        visitor: &mut Visitor<'_>,
    ) -> Result<(), SettingsError> {
        (**self).load_subtree(prefix, visitor)
    }
}

impl<T: SettingsWriter + ?Sized> SettingsWriter for &mut T {
    fn save_one(&mut self, key: &Key, data: Bytes) -> Result<(), SettingsError> {
        (**self).save_one(key, data)
    }

    fn delete(&mut self, key: &Key) -> Result<(), SettingsError> {
        (**self).delete(key)
    }

    fn delete_subtree(&mut self, prefix: &Key) -> Result<(), SettingsError> {
        (**self).delete_subtree(prefix)
    }

    fn commit(&mut self) -> Result<(), SettingsError> {
        (**self).commit()
    }
}

impl<T: SettingsReader + ?Sized> SettingsReader for Box<T> {
    fn load_subtree(
        &mut self,
        prefix: &Key,
        visitor: &mut Visitor<'_>,
    ) -> Result<(), SettingsError> {
        self.as_mut().load_subtree(prefix, visitor)
    }
}

impl<T: SettingsWriter + ?Sized> SettingsWriter for Box<T> {
    fn save_one(&mut self, key: &Key, data: Bytes) -> Result<(), SettingsError> {
        self.as_mut().save_one(key, data)
    }

    fn delete(&mut self, key: &Key) -> Result<(), SettingsError> {
        self.as_mut().delete(key)
    }

    fn delete_subtree(&mut self, prefix: &Key) -> Result<(), SettingsError> {
        self.as_mut().delete_subtree(prefix)
    }

    fn commit(&mut self) -> Result<(), SettingsError> {
        self.as_mut().commit()
    }
}
