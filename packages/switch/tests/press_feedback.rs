use std::time::Duration;

use keymap_settings::{key, Bytes, MemorySettings, SettingsWriter};
use keymap_slots::{SharedSlotStore, SlotConfig, SlotStore};
use keymap_switch::{FeedbackPulse, MemoryPin, SwitchKeymap, Switched};

fn store_with_slot() -> SharedSlotStore<MemorySettings> {
    let mut settings = MemorySettings::new();
    settings
        .save_one(&key!("slots/1/_name"), Bytes::from_static(b"travel"))
        .unwrap();
    settings
        .save_one(&key!("slots/1/layer_order"), Bytes::from_static(&[1, 0]))
        .unwrap();
    SharedSlotStore::new(SlotStore::new(settings, SlotConfig::default()))
}

#[tokio::test(start_paused = true)]
async fn successful_press_pulses_feedback() {
    let led = MemoryPin::new(false);
    let switch = SwitchKeymap::new(store_with_slot()).with_feedback(
        FeedbackPulse::from_current(Duration::from_millis(300))
            .unwrap()
            .with_primary(led.clone()),
    );

    assert_eq!(
        switch.on_pressed(2).unwrap(),
        Switched::Activated { index: 1 }
    );
    assert!(led.is_high());

    tokio::time::sleep(Duration::from_millis(301)).await;
    assert!(!led.is_high());
    assert_eq!(switch.store().lock().active_slot(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn refused_press_leaves_feedback_off() {
    let led = MemoryPin::new(false);
    let switch = SwitchKeymap::new(store_with_slot()).with_feedback(
        FeedbackPulse::from_current(Duration::from_millis(300))
            .unwrap()
            .with_primary(led.clone()),
    );

    assert!(switch.on_pressed(1).is_err());
    assert!(!led.is_high());
    assert_eq!(led.writes(), 0);
}
