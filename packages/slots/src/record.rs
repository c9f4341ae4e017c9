//! In-memory snapshot of one keymap configuration.

use std::collections::TryReserveError;

use bytes::Bytes;

/// Errors from mutating a [`SlotRecord`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("layer {layer} out of range (layer count {layers})")]
    LayerOutOfRange { layer: usize, layers: usize },
    #[error("out of memory growing bindings of layer {layer}")]
    OutOfMemory { layer: usize },
}

/// One key position's behavior assignment. The payload is never interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub position: u16,
    pub payload: Bytes,
}

impl Binding {
    pub fn new(position: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            position,
            payload: payload.into(),
        }
    }
}

/// The bindings of one layer, at most one per position.
///
/// Order follows insertion and carries no meaning; comparisons go by
/// position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerBindings {
    entries: Vec<Binding>,
}

impl LayerBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Binding> {
        self.entries.iter()
    }

    pub fn get(&self, position: u16) -> Option<&Binding> {
        self.entries.iter().find(|b| b.position == position)
    }

    /// Insert a binding, replacing any existing one at the same position.
    ///
    /// Growth is reserved before anything is touched, so a failed
    /// allocation leaves the set exactly as it was. Returns the replaced
    /// binding, if any.
    pub fn try_insert(&mut self, binding: Binding) -> Result<Option<Binding>, TryReserveError> {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|b| b.position == binding.position)
        {
            return Ok(Some(std::mem::replace(existing, binding)));
        }

        self.entries.try_reserve(1)?;
        self.entries.push(binding);
        Ok(None)
    }

    /// Sum of payload lengths.
    pub fn payload_size(&self) -> usize {
        self.entries.iter().map(|b| b.payload.len()).sum()
    }

    pub fn clear(&mut self) {
        self.entries = Vec::new();
    }
}

impl<'a> IntoIterator for &'a LayerBindings {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One complete keymap configuration.
///
/// `total_size` is the running sum of every payload held by the record and
/// is kept in step by the setters. A record holding no payload bytes is free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    name: Option<String>,
    layer_order: Option<Bytes>,
    layer_names: Vec<Option<Bytes>>,
    layer_bindings: Vec<LayerBindings>,
    total_size: usize,
}

impl SlotRecord {
    /// An empty record with `layers` layers.
    pub fn new(layers: usize) -> Self {
        Self {
            name: None,
            layer_order: None,
            layer_names: vec![None; layers],
            layer_bindings: vec![LayerBindings::new(); layers],
            total_size: 0,
        }
    }

    pub fn layer_count(&self) -> usize {
        self.layer_bindings.len()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn layer_order(&self) -> Option<&Bytes> {
        self.layer_order.as_ref()
    }

    pub fn layer_name(&self, layer: usize) -> Option<&Bytes> {
        self.layer_names.get(layer).and_then(Option::as_ref)
    }

    /// Bindings of `layer`; an out-of-range layer has none.
    pub fn bindings(&self, layer: usize) -> &LayerBindings {
        static EMPTY: LayerBindings = LayerBindings {
            entries: Vec::new(),
        };
        self.layer_bindings.get(layer).unwrap_or(&EMPTY)
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn is_free(&self) -> bool {
        self.total_size == 0
    }

    pub fn set_name(&mut self, name: Option<String>) {
        let added = name.as_ref().map_or(0, String::len);
        if let Some(old) = std::mem::replace(&mut self.name, name) {
            self.total_size -= old.len();
        }
        self.total_size += added;
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.set_name(Some(name.into()));
        self
    }

    pub fn set_layer_order(&mut self, order: Option<Bytes>) {
        let added = order.as_ref().map_or(0, Bytes::len);
        if let Some(old) = std::mem::replace(&mut self.layer_order, order) {
            self.total_size -= old.len();
        }
        self.total_size += added;
    }

    #[must_use]
    pub fn with_layer_order(mut self, order: impl Into<Bytes>) -> Self {
        self.set_layer_order(Some(order.into()));
        self
    }

    pub fn set_layer_name(&mut self, layer: usize, name: Option<Bytes>) -> Result<(), RecordError> {
        let layers = self.layer_count();
        let slot = self
            .layer_names
            .get_mut(layer)
            .ok_or(RecordError::LayerOutOfRange { layer, layers })?;

        let added = name.as_ref().map_or(0, Bytes::len);
        if let Some(old) = std::mem::replace(slot, name) {
            self.total_size -= old.len();
        }
        self.total_size += added;
        Ok(())
    }

    pub fn with_layer_name(
        mut self,
        layer: usize,
        name: impl Into<Bytes>,
    ) -> Result<Self, RecordError> {
        self.set_layer_name(layer, Some(name.into()))?;
        Ok(self)
    }

    /// Add a binding to `layer`. A binding already at that position is
    /// replaced (last write wins).
    pub fn insert_binding(&mut self, layer: usize, binding: Binding) -> Result<(), RecordError> {
        let layers = self.layer_count();
        let set = self
            .layer_bindings
            .get_mut(layer)
            .ok_or(RecordError::LayerOutOfRange { layer, layers })?;

        let added = binding.payload.len();
        let replaced = set
            .try_insert(binding)
            .map_err(|_| RecordError::OutOfMemory { layer })?;
        if let Some(old) = replaced {
            self.total_size -= old.payload.len();
        }
        self.total_size += added;
        Ok(())
    }

    pub fn with_binding(
        mut self,
        layer: usize,
        position: u16,
        payload: impl Into<Bytes>,
    ) -> Result<Self, RecordError> {
        self.insert_binding(layer, Binding::new(position, payload))?;
        Ok(self)
    }

    /// Return the record to the empty state. Idempotent.
    pub fn free(&mut self) {
        self.name = None;
        self.layer_order = None;
        self.layer_names.iter_mut().for_each(|n| *n = None);
        self.layer_bindings.iter_mut().for_each(LayerBindings::clear);
        self.total_size = 0;
    }

    /// Same content without the slot label, as written to the live keymap.
    #[must_use]
    pub fn without_name(&self) -> Self {
        let mut copy = self.clone();
        copy.set_name(None);
        copy
    }
}
