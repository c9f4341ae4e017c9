use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PinError {
    #[error("output '{name}' is not ready")]
    NotReady { name: String },

    #[error("failed to drive output '{name}': {message}")]
    Drive { name: String, message: String },
}

/// A digital output line.
///
/// # Object Safety
///
/// This trait is object-safe: feedback holds `Box<dyn OutputPin>`.
pub trait OutputPin: Send {
    fn set(&mut self, high: bool) -> Result<(), PinError>;

    /// Current logical level.
    fn get(&self) -> bool;
}

impl<T: OutputPin + ?Sized> OutputPin for Box<T> {
    fn set(&mut self, high: bool) -> Result<(), PinError> {
        (**self).set(high)
    }

    fn get(&self) -> bool {
        (**self).get()
    }
}

/// An output kept in memory. Clones share the same level.
#[derive(Debug, Clone, Default)]
pub struct MemoryPin {
    level: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl MemoryPin {
    pub fn new(high: bool) -> Self {
        Self {
            level: Arc::new(AtomicBool::new(high)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn is_high(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }

    /// Number of `set` calls across all clones.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl OutputPin for MemoryPin {
    fn set(&mut self, high: bool) -> Result<(), PinError> {
        self.level.store(high, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get(&self) -> bool {
        self.is_high()
    }
}
