//! Activation lifecycle tests: binding, reference counting and teardown.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use horizon_hotkeys::{
    EngineConfig, HotkeyEngine, HotkeyError, HotkeyOptions, Key, KeyCombination, KeyboardEvent,
    KeyboardModifiers, Scheduler, SharedTimerManager, TimerCallback, TimerId,
};
use parking_lot::Mutex;

fn counting(id: &str, key: KeyCombination, count: &Arc<AtomicUsize>) -> HotkeyOptions {
    let count = count.clone();
    HotkeyOptions::new(key).with_id(id).on_key_down(move |_, _, _| {
        count.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn test_two_mounts_stay_bound_until_last_unmount() {
    let engine = HotkeyEngine::new();
    let hotkey = engine
        .register_hotkey(HotkeyOptions::new(KeyCombination::key_only(Key::A)))
        .unwrap();

    let first_mount = hotkey.bind_scoped();
    let second_mount = hotkey.bind_scoped();
    assert!(hotkey.is_bound());

    drop(first_mount);
    assert!(hotkey.is_bound());

    drop(second_mount);
    assert!(!hotkey.is_bound());
}

#[test]
fn test_is_bound_tracks_unreleased_handles() {
    let engine = HotkeyEngine::new();
    let hotkey = engine
        .register_hotkey(HotkeyOptions::new(KeyCombination::key_only(Key::A)))
        .unwrap();

    let handles: Vec<_> = (0..4).map(|_| hotkey.force_bind()).collect();
    // Release in a scrambled order, each twice.
    for index in [2, 0, 3] {
        handles[index].release();
        handles[index].release();
        assert!(hotkey.is_bound());
    }
    handles[1].release();
    assert!(!hotkey.is_bound());
    assert!(handles.iter().all(|handle| handle.is_released()));
}

#[test]
fn test_rebinding_after_release() {
    let engine = HotkeyEngine::new();
    let presses = Arc::new(AtomicUsize::new(0));
    let hotkey = engine
        .register_hotkey(counting("h", KeyCombination::key_only(Key::A), &presses))
        .unwrap();
    let event = KeyboardEvent::new(Key::A, KeyboardModifiers::NONE);

    hotkey.force_bind().release();
    engine.handle_key_down(&event);
    assert_eq!(presses.load(Ordering::SeqCst), 0);

    let _binding = hotkey.force_bind();
    engine.handle_key_down(&event);
    assert_eq!(presses.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unregister_leaves_no_trace_for_new_registration() {
    let engine = HotkeyEngine::new();
    let old_presses = Arc::new(AtomicUsize::new(0));
    let new_presses = Arc::new(AtomicUsize::new(0));
    let combination = KeyCombination::ctrl(Key::K);
    let event = KeyboardEvent::new(Key::K, KeyboardModifiers::CTRL);

    let old = engine
        .register_hotkey(counting("palette", combination.clone(), &old_presses))
        .unwrap();
    let _old_binding = old.force_bind();
    assert!(old.unregister());
    assert!(engine.hotkey("palette").is_none());

    engine.handle_key_down(&event);
    assert_eq!(old_presses.load(Ordering::SeqCst), 0);

    let new = engine
        .register_hotkey(counting("palette", combination, &new_presses))
        .unwrap();
    assert!(!new.is_bound());
    engine.handle_key_down(&event);
    assert_eq!(new_presses.load(Ordering::SeqCst), 0);

    let _new_binding = new.force_bind();
    engine.handle_key_down(&event);
    assert_eq!(new_presses.load(Ordering::SeqCst), 1);
    assert_eq!(old_presses.load(Ordering::SeqCst), 0);
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let engine = HotkeyEngine::new();
    engine
        .register_hotkey(HotkeyOptions::new(KeyCombination::key_only(Key::A)).with_id("dup"))
        .unwrap();

    let result =
        engine.register_hotkey(HotkeyOptions::new(KeyCombination::key_only(Key::B)).with_id("dup"));
    assert!(matches!(result, Err(HotkeyError::DuplicateId(id)) if id == "dup"));
}

#[test]
fn test_parsed_combinations_bind_like_constructed_ones() {
    let engine = HotkeyEngine::new();
    let presses = Arc::new(AtomicUsize::new(0));
    let parsed: KeyCombination = "shift+ctrl+p".parse().unwrap();
    let hotkey = engine
        .register_hotkey(counting("palette", parsed, &presses))
        .unwrap();
    let _binding = hotkey.force_bind();

    engine.handle_key_down(&KeyboardEvent::new(Key::P, KeyboardModifiers::CTRL_SHIFT));
    assert_eq!(presses.load(Ordering::SeqCst), 1);
}

#[test]
fn test_engine_config_from_toml() {
    let config = EngineConfig::from_toml_str(
        r#"
        default_held_delay_ms = 1200
        warn_on_conflicts = false
        "#,
    )
    .unwrap();
    let engine = HotkeyEngine::with_config(config);
    let hotkey = engine
        .register_hotkey(HotkeyOptions::new(KeyCombination::key_only(Key::A)))
        .unwrap();

    assert_eq!(hotkey.config().held_delay(), Duration::from_millis(1200));
    assert!(!engine.config().warn_on_conflicts);
}

/// A scheduler that records requests and lets the test fire them.
#[derive(Default)]
struct RecordingScheduler {
    timers: SharedTimerManager,
    delays: Mutex<Vec<Duration>>,
}

impl Scheduler for RecordingScheduler {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        self.delays.lock().push(delay);
        // Fire on the next `process_expired`, whatever the delay.
        self.timers.start_one_shot(Duration::ZERO, callback)
    }

    fn cancel(&self, id: TimerId) -> bool {
        self.timers.stop(id).is_ok()
    }
}

#[test]
fn test_custom_scheduler_receives_held_delay() {
    let scheduler = Arc::new(RecordingScheduler::default());
    let engine = HotkeyEngine::builder().scheduler(scheduler.clone()).build();
    let held = Arc::new(AtomicUsize::new(0));
    let counter = held.clone();
    let hotkey = engine
        .register_hotkey(
            HotkeyOptions::new(KeyCombination::key_only(Key::Space))
                .held_delay(Duration::from_millis(750))
                .on_key_held(move |_, _, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .unwrap();
    let _binding = hotkey.force_bind();

    engine.handle_key_down(&KeyboardEvent::new(Key::Space, KeyboardModifiers::NONE));
    assert_eq!(*scheduler.delays.lock(), [Duration::from_millis(750)]);

    // The engine does not own this scheduler's timers.
    assert_eq!(engine.process_timers(), 0);
    assert_eq!(engine.time_until_next_timer(), None);

    assert_eq!(scheduler.timers.process_expired(), 1);
    assert_eq!(held.load(Ordering::SeqCst), 1);
}

#[test]
fn test_reset_tears_everything_down() {
    let engine = HotkeyEngine::new();
    let presses = Arc::new(AtomicUsize::new(0));
    let hotkey = engine
        .register_hotkey(counting("h", KeyCombination::key_only(Key::A), &presses))
        .unwrap();
    let _binding = hotkey.bind_scoped();

    engine.reset();
    engine.handle_key_down(&KeyboardEvent::new(Key::A, KeyboardModifiers::NONE));

    assert!(engine.is_empty());
    assert!(!hotkey.is_bound());
    assert_eq!(presses.load(Ordering::SeqCst), 0);

    // The id is free again.
    engine
        .register_hotkey(HotkeyOptions::new(KeyCombination::key_only(Key::A)).with_id("h"))
        .unwrap();
}
