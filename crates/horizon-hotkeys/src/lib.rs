//! Horizon Hotkeys: in-process keyboard shortcut dispatch.
//!
//! Register hotkeys against one or more key combinations, bind them while
//! the part of your application that owns them is live, and feed the engine
//! native key events:
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::time::Duration;
//!
//! use horizon_hotkeys::{
//!     HotkeyEngine, HotkeyOptions, Key, KeyCombination, KeyboardEvent, KeyboardModifiers,
//!     ManualClock,
//! };
//!
//! let clock = ManualClock::new();
//! let engine = HotkeyEngine::builder().clock(Arc::new(clock.clone())).build();
//!
//! let held = Arc::new(AtomicBool::new(false));
//! let flag = held.clone();
//! let push_to_talk = engine
//!     .register_hotkey(
//!         HotkeyOptions::new(KeyCombination::key_only(Key::Space))
//!             .held_delay(Duration::from_millis(300))
//!             .on_key_held(move |_, _, _| flag.store(true, Ordering::SeqCst)),
//!     )
//!     .unwrap();
//! let _binding = push_to_talk.bind_scoped();
//!
//! let space = KeyboardEvent::new(Key::Space, KeyboardModifiers::NONE);
//! engine.handle_key_down(&space);
//! clock.advance_ms(300);
//! engine.process_timers();
//! engine.handle_key_up(&space);
//!
//! assert!(held.load(Ordering::SeqCst));
//! ```
//!
//! # Modules
//!
//! - [`keys`]: Physical keys, modifiers, key combinations and their identity
//! - [`event`]: Keyboard events and input-field detection
//! - [`config`]: Hotkey options and engine settings
//! - [`registry`]: Hotkey storage, conflict tracking and activation counting
//! - [`session`]: Held-key timers and consumed presses
//! - [`dispatch`]: Keydown/keyup handling
//! - [`hotkey`]: The [`HotkeyEngine`] façade and [`Hotkey`] handles
//!
//! # Threading
//!
//! Engines and handles are `Send + Sync`, but dispatch is meant to run on
//! the thread that receives keyboard events. Held callbacks run from
//! [`HotkeyEngine::process_timers`] on whichever thread calls it.

pub mod config;
pub mod dispatch;
pub mod event;
pub mod hotkey;
pub mod keys;
pub mod registry;
pub mod session;

pub use config::{
    DEFAULT_HELD_DELAY_MS, EngineConfig, HotkeyConfig, HotkeyId, HotkeyOptions, KeyCallback,
};
pub use dispatch::Dispatcher;
pub use event::{EventTarget, InputFieldDetector, KeyboardEvent, TagNameDetector};
pub use hotkey::{BindGuard, BindHandle, Hotkey, HotkeyEngine, HotkeyEngineBuilder, register_hotkey};
pub use keys::{Key, KeyCombination, KeyCombinationId, KeyParseError, KeyboardModifiers, key_to_id};
pub use registry::{ActivationToken, HotkeyRegistry};
pub use session::{HeldId, SessionState};

pub use horizon_hotkeys_core::{
    Clock, HotkeyError, ManualClock, Result, Scheduler, SharedTimerManager, SystemClock,
    TimerCallback, TimerId, logging,
};
