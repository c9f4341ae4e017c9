//! Everything a shell session operates on.

use keymap_settings::SettingsStore;
use keymap_slots::{SharedSlotStore, SlotConfig, SlotStore};
use keymap_switch::{FeedbackPulse, MemoryPin, SwitchKeymap};

/// Settings backend as seen by the shell.
pub type DynSettings = Box<dyn SettingsStore>;

/// The slot store plus the key behavior that shares it.
pub struct ShellContext {
    switch: SwitchKeymap<DynSettings>,
    led: Option<MemoryPin>,
}

impl ShellContext {
    pub fn new(settings: impl SettingsStore + 'static, config: SlotConfig) -> Self {
        let settings: DynSettings = Box::new(settings);
        let store = SlotStore::new(settings, config).with_consumer(|| {
            tracing::info!("live keymap replaced, in-memory overrides discarded");
        });
        Self {
            switch: SwitchKeymap::new(SharedSlotStore::new(store)),
            led: None,
        }
    }

    /// Pulse `led` through `feedback` after each successful `press`.
    #[must_use]
    pub fn with_feedback(mut self, feedback: FeedbackPulse, led: MemoryPin) -> Self {
        self.switch = self.switch.with_feedback(feedback);
        self.led = Some(led);
        self
    }

    pub fn store(&self) -> &SharedSlotStore<DynSettings> {
        self.switch.store()
    }

    pub fn switch(&self) -> &SwitchKeymap<DynSettings> {
        &self.switch
    }

    /// The feedback output, if one is attached.
    pub fn led(&self) -> Option<&MemoryPin> {
        self.led.as_ref()
    }
}
