use keymap_settings::SettingsStore;
use keymap_slots::{SharedSlotStore, SlotError};

use crate::feedback::FeedbackPulse;

/// What a press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switched {
    /// The live keymap was reset to the firmware defaults.
    Restored,
    /// Slot `index` (0-based) was copied over the live keymap.
    Activated { index: usize },
}

/// Key behavior that switches keymaps.
///
/// The binding parameter selects the action: `0` restores the default
/// keymap, `n > 0` activates slot `n` (1-based).
pub struct SwitchKeymap<S> {
    store: SharedSlotStore<S>,
    feedback: Option<FeedbackPulse>,
}

impl<S: SettingsStore> SwitchKeymap<S> {
    pub fn new(store: SharedSlotStore<S>) -> Self {
        Self {
            store,
            feedback: None,
        }
    }

    #[must_use]
    pub fn with_feedback(mut self, feedback: FeedbackPulse) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn store(&self) -> &SharedSlotStore<S> {
        &self.store
    }

    pub fn feedback(&self) -> Option<&FeedbackPulse> {
        self.feedback.as_ref()
    }

    pub fn on_pressed(&self, param: u32) -> Result<Switched, SlotError> {
        let switched = self.store.with(|store| match param.checked_sub(1) {
            None => store.restore().map(|()| Switched::Restored),
            Some(index) => {
                let index = index as usize;
                store
                    .activate(index)
                    .map(|_| Switched::Activated { index })
            }
        });

        match &switched {
            Ok(done) => {
                tracing::info!(param, ?done, "keymap switched");
                if let Some(feedback) = &self.feedback {
                    if let Err(e) = feedback.pulse() {
                        tracing::warn!(error = %e, "feedback pulse failed");
                    }
                }
            }
            Err(e) => tracing::warn!(param, error = %e, "keymap switch refused"),
        }
        switched
    }
}
