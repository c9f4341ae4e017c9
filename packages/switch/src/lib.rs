//! Keymap Switch: activate stored keymaps from a key press
//!
//! [`SwitchKeymap`] is the key behavior: its parameter picks a slot to
//! activate, or `0` to restore the default keymap. A successful switch pulses
//! a [`FeedbackPulse`] so the user sees it took effect.
//!
//! Outputs are abstracted as [`OutputPin`]; [`MemoryPin`] keeps the level in
//! memory for hosts without real lines and for tests.

mod behavior;
mod feedback;
mod pin;

pub use behavior::{SwitchKeymap, Switched};
pub use feedback::{FeedbackError, FeedbackPulse};
pub use pin::{MemoryPin, OutputPin, PinError};
