//! Timed feedback pulse on one or two outputs.
//!
//! A pulse drives the primary output high and, if configured, forces an extra
//! output high after remembering its level. When the duration elapses both are
//! put back. Pulsing again before that cancels the pending auto-off and
//! starts a fresh one.
//!
//! The extra output is only driven alongside a primary one. Without a primary
//! output a pulse touches nothing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::pin::{OutputPin, PinError};

#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("feedback needs a tokio runtime")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error(transparent)]
    Pin(#[from] PinError),
}

#[derive(Default)]
struct Outputs {
    primary: Option<Box<dyn OutputPin>>,
    extra: Option<Box<dyn OutputPin>>,
    /// Level of `extra` before the pulse in progress.
    extra_prior: Option<bool>,
}

impl Outputs {
    fn start(&mut self) -> Result<(), PinError> {
        let Some(primary) = self.primary.as_mut() else {
            return Ok(());
        };
        if let Some(extra) = self.extra.as_mut() {
            if self.extra_prior.is_none() {
                self.extra_prior = Some(extra.get());
            }
            extra.set(true)?;
        }
        primary.set(true)?;
        Ok(())
    }

    fn end(&mut self) -> Result<(), PinError> {
        if let (Some(extra), Some(prior)) = (self.extra.as_mut(), self.extra_prior.take()) {
            extra.set(prior)?;
        }
        if let Some(primary) = self.primary.as_mut() {
            primary.set(false)?;
        }
        Ok(())
    }
}

fn lock(outputs: &Mutex<Outputs>) -> MutexGuard<'_, Outputs> {
    outputs.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct FeedbackPulse {
    outputs: Arc<Mutex<Outputs>>,
    duration: Duration,
    runtime: Handle,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl FeedbackPulse {
    /// A pulse with no outputs attached. A zero duration leaves the outputs
    /// on until the next [`FeedbackPulse::end`].
    pub fn new(duration: Duration, runtime: Handle) -> Self {
        Self {
            outputs: Arc::new(Mutex::new(Outputs::default())),
            duration,
            runtime,
            pending: Mutex::new(None),
        }
    }

    /// Use the runtime of the calling context.
    pub fn from_current(duration: Duration) -> Result<Self, FeedbackError> {
        Ok(Self::new(duration, Handle::try_current()?))
    }

    #[must_use]
    pub fn with_primary(self, pin: impl OutputPin + 'static) -> Self {
        lock(&self.outputs).primary = Some(Box::new(pin));
        self
    }

    #[must_use]
    pub fn with_extra(self, pin: impl OutputPin + 'static) -> Self {
        lock(&self.outputs).extra = Some(Box::new(pin));
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whether an auto-off is scheduled and has not run yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Turn the outputs on and (re)schedule the auto-off.
    pub fn pulse(&self) -> Result<(), FeedbackError> {
        lock(&self.outputs).start()?;

        if self.duration.is_zero() {
            return Ok(());
        }

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
            tracing::trace!("feedback auto-off rescheduled");
        }

        let outputs = Arc::clone(&self.outputs);
        let duration = self.duration;
        *pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            if let Err(e) = lock(&outputs).end() {
                tracing::warn!(error = %e, "failed to end feedback pulse");
            }
        }));
        Ok(())
    }

    /// Cancel any pending auto-off and put the outputs back now.
    pub fn end(&self) -> Result<(), FeedbackError> {
        if let Some(task) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        lock(&self.outputs).end()?;
        Ok(())
    }
}

impl Drop for FeedbackPulse {
    fn drop(&mut self) {
        if let Some(task) = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}
