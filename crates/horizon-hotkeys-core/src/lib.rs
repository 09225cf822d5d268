//! Core systems for Horizon Hotkeys.
//!
//! This crate provides the host-independent building blocks the hotkey engine
//! is assembled from:
//!
//! - **Timers**: One-shot deferred callbacks behind the [`Scheduler`] trait
//! - **Clocks**: Wall-clock and manually driven time sources
//! - **Errors**: The shared [`HotkeyError`] type and [`Result`] alias
//! - **Logging**: Tracing target names for filtering by subsystem
//!
//! # Timer Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//!
//! use horizon_hotkeys_core::{ManualClock, Scheduler, SharedTimerManager};
//!
//! let clock = ManualClock::new();
//! let timers = SharedTimerManager::with_clock(Arc::new(clock.clone()));
//!
//! let fired = Arc::new(AtomicUsize::new(0));
//! let counter = fired.clone();
//! timers.schedule(
//!     Duration::from_millis(500),
//!     Box::new(move |_id| {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!     }),
//! );
//!
//! clock.advance(Duration::from_millis(499));
//! assert_eq!(timers.process_expired(), 0);
//!
//! clock.advance(Duration::from_millis(1));
//! assert_eq!(timers.process_expired(), 1);
//! assert_eq!(fired.load(Ordering::SeqCst), 1);
//! ```

mod clock;
mod error;
pub mod logging;
mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{HotkeyError, Result, TimerError};
pub use timer::{Scheduler, SharedTimerManager, TimerCallback, TimerId, TimerManager};
