//! The live keymap runtime that reads the `keymap` namespace.

/// Notified after the live keymap namespace was replaced on storage.
///
/// # Object Safety
///
/// This trait is object-safe: the store holds a `Box<dyn KeymapConsumer>`.
pub trait KeymapConsumer: Send {
    /// Drop any unsaved in-memory edits and reload from storage.
    fn discard_in_memory_overrides(&mut self);
}

impl<F> KeymapConsumer for F
where
    F: FnMut() + Send,
{
    fn discard_in_memory_overrides(&mut self) {
        self()
    }
}

/// A consumer that ignores notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopConsumer;

impl KeymapConsumer for NoopConsumer {
    fn discard_in_memory_overrides(&mut self) {}
}
