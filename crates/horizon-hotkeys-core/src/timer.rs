//! Timer system for Horizon Hotkeys.
//!
//! Provides one-shot deferred callbacks. Timers do not run on their own
//! thread: the host's event loop calls [`SharedTimerManager::process_expired`]
//! (typically after sleeping for [`SharedTimerManager::time_until_next`]) and
//! expired callbacks run right there, on the event-loop thread.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::clock::{Clock, SystemClock};
use crate::error::TimerError;

new_key_type! {
    /// A unique identifier for a timer.
    pub struct TimerId;
}

/// A deferred callback. It receives the ID of the timer that fired it.
pub type TimerCallback = Box<dyn FnOnce(TimerId) + Send + 'static>;

/// Schedules fire-once deferred callbacks.
///
/// This is the only capability the hotkey dispatcher needs from a timer
/// implementation. [`SharedTimerManager`] is the bundled implementation;
/// hosts with their own event loop timers can implement this trait instead.
pub trait Scheduler: Send + Sync {
    /// Schedule `callback` to run once after `delay`.
    ///
    /// The callback must run later, from the host's event loop, and never
    /// from inside `schedule` itself, even when `delay` is zero.
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerId;

    /// Cancel a pending timer.
    ///
    /// Returns `true` if the timer was pending and will no longer fire.
    fn cancel(&self, id: TimerId) -> bool;
}

/// Internal timer data.
struct TimerData {
    /// When this timer should fire.
    fire_time: Instant,
    /// The callback to run. Taken when the timer fires.
    callback: Option<TimerCallback>,
}

/// An entry in the timer queue (min-heap by fire time, FIFO among equals).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_time: Instant,
    seq: u64,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time && self.seq == other.seq
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other
            .fire_time
            .cmp(&self.fire_time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Manages all pending one-shot timers.
pub struct TimerManager {
    /// All pending timers.
    timers: SlotMap<TimerId, TimerData>,
    /// Priority queue of pending timer fires (min-heap by fire time).
    queue: BinaryHeap<TimerQueueEntry>,
    /// Insertion counter used to keep equal fire times in FIFO order.
    next_seq: u64,
    /// Source of the current time.
    clock: Arc<dyn Clock>,
}

impl TimerManager {
    /// Create a new timer manager driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a new timer manager driven by the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            timers: SlotMap::with_key(),
            queue: BinaryHeap::new(),
            next_seq: 0,
            clock,
        }
    }

    /// Start a one-shot timer that fires after the specified duration.
    ///
    /// Returns the timer ID that can be used to cancel the timer.
    pub fn start_one_shot(&mut self, duration: Duration, callback: TimerCallback) -> TimerId {
        let fire_time = self.clock.now() + duration;

        let id = self.timers.insert(TimerData {
            fire_time,
            callback: Some(callback),
        });
        self.queue.push(TimerQueueEntry {
            id,
            fire_time,
            seq: self.next_seq,
        });
        self.next_seq += 1;

        tracing::trace!(target: "horizon_hotkeys_core::timer", ?id, ?duration, "timer started");
        id
    }

    /// Stop and remove a timer.
    ///
    /// Returns an error if the timer has already fired or was never started.
    pub fn stop(&mut self, id: TimerId) -> Result<(), TimerError> {
        match self.timers.remove(id) {
            Some(_) => {
                tracing::trace!(target: "horizon_hotkeys_core::timer", ?id, "timer stopped");
                Ok(())
            }
            None => Err(TimerError::InvalidTimerId),
        }
    }

    /// Check if a timer is still pending.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Get the duration until the next timer fires, if any.
    ///
    /// Returns `None` if there are no pending timers.
    pub fn time_until_next(&mut self) -> Option<Duration> {
        self.discard_stopped();

        self.queue.peek().map(|entry| {
            let now = self.clock.now();
            entry.fire_time.saturating_duration_since(now)
        })
    }

    /// Remove the earliest timer due at `now` and started before `seq_limit`.
    fn pop_expired(&mut self, now: Instant, seq_limit: u64) -> Option<(TimerId, TimerCallback)> {
        while let Some(entry) = self.queue.peek().copied() {
            if entry.fire_time > now || entry.seq >= seq_limit {
                return None;
            }
            self.queue.pop();

            // Stopped timers leave their queue entry behind.
            let Some(mut timer) = self.timers.remove(entry.id) else {
                continue;
            };
            debug_assert_eq!(timer.fire_time, entry.fire_time);

            if let Some(callback) = timer.callback.take() {
                tracing::trace!(target: "horizon_hotkeys_core::timer", id = ?entry.id, "timer fired");
                return Some((entry.id, callback));
            }
        }
        None
    }

    /// Get the number of pending timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Drop every pending timer without running it.
    pub fn clear(&mut self) {
        self.timers.clear();
        self.queue.clear();
    }

    fn discard_stopped(&mut self) {
        while let Some(entry) = self.queue.peek() {
            if self.timers.contains_key(entry.id) {
                break;
            }
            self.queue.pop();
        }
    }
}

impl Default for TimerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TimerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerManager")
            .field("active", &self.timers.len())
            .field("queued", &self.queue.len())
            .finish()
    }
}

/// A thread-safe wrapper around [`TimerManager`].
///
/// This is the bundled [`Scheduler`]. The lock is never held while a
/// callback runs, so callbacks may schedule or cancel other timers.
#[derive(Debug, Default)]
pub struct SharedTimerManager {
    inner: Mutex<TimerManager>,
}

impl SharedTimerManager {
    /// Create a shared timer manager driven by the system clock.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TimerManager::new()),
        }
    }

    /// Create a shared timer manager driven by the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(TimerManager::with_clock(clock)),
        }
    }

    /// Start a one-shot timer. See [`TimerManager::start_one_shot`].
    pub fn start_one_shot(&self, duration: Duration, callback: TimerCallback) -> TimerId {
        self.inner.lock().start_one_shot(duration, callback)
    }

    /// Stop a timer. See [`TimerManager::stop`].
    pub fn stop(&self, id: TimerId) -> Result<(), TimerError> {
        self.inner.lock().stop(id)
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.inner.lock().is_active(id)
    }

    pub fn time_until_next(&self) -> Option<Duration> {
        self.inner.lock().time_until_next()
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().active_count()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Run every expired timer's callback on the calling thread.
    ///
    /// Timers are taken one at a time, so if a callback panics the timers
    /// behind it stay pending and run on the next call. Timers started by a
    /// callback wait for the next call even when already due.
    ///
    /// Returns the number of callbacks that ran.
    #[tracing::instrument(skip(self), target = "horizon_hotkeys_core::timer", level = "trace")]
    pub fn process_expired(&self) -> usize {
        let (now, seq_limit) = {
            let inner = self.inner.lock();
            (inner.clock.now(), inner.next_seq)
        };
        let mut count = 0;

        loop {
            let next = self.inner.lock().pop_expired(now, seq_limit);
            let Some((id, callback)) = next else {
                break;
            };
            callback(id);
            count += 1;
        }

        count
    }
}

impl Scheduler for SharedTimerManager {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        self.start_one_shot(delay, callback)
    }

    fn cancel(&self, id: TimerId) -> bool {
        self.stop(id).is_ok()
    }
}

static_assertions::assert_impl_all!(SharedTimerManager: Send, Sync);

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    use super::*;
    use crate::clock::ManualClock;

    fn manager() -> (ManualClock, SharedTimerManager) {
        let clock = ManualClock::new();
        let timers = SharedTimerManager::with_clock(Arc::new(clock.clone()));
        (clock, timers)
    }

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> TimerCallback {
        let log = log.clone();
        Box::new(move |_| log.lock().push(name))
    }

    #[test]
    fn test_one_shot_fires_once_after_delay() {
        let (clock, timers) = manager();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let id = timers.start_one_shot(
            Duration::from_millis(100),
            Box::new(move |_| {
                c.fetch_add(1, AtomicOrdering::SeqCst);
            }),
        );
        assert!(timers.is_active(id));

        clock.advance_ms(99);
        assert_eq!(timers.process_expired(), 0);

        clock.advance_ms(1);
        assert_eq!(timers.process_expired(), 1);
        assert_eq!(count.load(AtomicOrdering::SeqCst), 1);
        assert!(!timers.is_active(id));

        clock.advance_ms(1000);
        assert_eq!(timers.process_expired(), 0);
        assert_eq!(count.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn test_stopped_timer_never_fires() {
        let (clock, timers) = manager();
        let log = Arc::new(Mutex::new(Vec::new()));
        let id = timers.start_one_shot(Duration::from_millis(10), recorder(&log, "a"));

        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert_eq!(timers.stop(id), Err(TimerError::InvalidTimerId));

        clock.advance_ms(20);
        assert_eq!(timers.process_expired(), 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_fire_order_by_time_then_insertion() {
        let (clock, timers) = manager();
        let log = Arc::new(Mutex::new(Vec::new()));
        timers.start_one_shot(Duration::from_millis(30), recorder(&log, "late"));
        timers.start_one_shot(Duration::from_millis(10), recorder(&log, "first"));
        timers.start_one_shot(Duration::from_millis(10), recorder(&log, "second"));

        clock.advance_ms(50);
        assert_eq!(timers.process_expired(), 3);
        assert_eq!(*log.lock(), vec!["first", "second", "late"]);
    }

    #[test]
    fn test_callback_receives_its_own_id() {
        let (clock, timers) = manager();
        let seen = Arc::new(Mutex::new(None));
        let s = seen.clone();
        let id = timers.start_one_shot(
            Duration::ZERO,
            Box::new(move |fired| {
                *s.lock() = Some(fired);
            }),
        );

        clock.advance_ms(0);
        timers.process_expired();
        assert_eq!(*seen.lock(), Some(id));
    }

    #[test]
    fn test_time_until_next_skips_stopped_timers() {
        let (clock, timers) = manager();
        assert_eq!(timers.time_until_next(), None);

        let early = timers.start_one_shot(Duration::from_millis(10), Box::new(|_| {}));
        timers.start_one_shot(Duration::from_millis(40), Box::new(|_| {}));
        assert_eq!(timers.time_until_next(), Some(Duration::from_millis(10)));

        timers.cancel(early);
        assert_eq!(timers.time_until_next(), Some(Duration::from_millis(40)));

        clock.advance_ms(100);
        assert_eq!(timers.time_until_next(), Some(Duration::ZERO));
    }

    #[test]
    fn test_callback_can_schedule_reentrantly() {
        let (clock, timers) = manager();
        let timers = Arc::new(timers);
        let count = Arc::new(AtomicUsize::new(0));

        let inner_timers = timers.clone();
        let c = count.clone();
        timers.schedule(
            Duration::from_millis(5),
            Box::new(move |_| {
                let c = c.clone();
                inner_timers.schedule(
                    Duration::from_millis(5),
                    Box::new(move |_| {
                        c.fetch_add(1, AtomicOrdering::SeqCst);
                    }),
                );
            }),
        );

        clock.advance_ms(5);
        assert_eq!(timers.process_expired(), 1);
        assert_eq!(timers.active_count(), 1);

        clock.advance_ms(5);
        assert_eq!(timers.process_expired(), 1);
        assert_eq!(count.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_callback_keeps_later_timers_pending() {
        let (clock, timers) = manager();
        let log = Arc::new(Mutex::new(Vec::new()));
        fn fail(_: TimerId) {
            panic!("callback failed");
        }
        timers.start_one_shot(Duration::from_millis(10), Box::new(fail));
        timers.start_one_shot(Duration::from_millis(10), recorder(&log, "after"));

        clock.advance_ms(10);
        let result =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| timers.process_expired()));
        assert!(result.is_err());
        assert_eq!(timers.active_count(), 1);
        assert!(log.lock().is_empty());

        assert_eq!(timers.process_expired(), 1);
        assert_eq!(*log.lock(), vec!["after"]);
    }

    #[test]
    fn test_zero_delay_timer_from_callback_waits_for_next_pass() {
        let (clock, timers) = manager();
        let timers = Arc::new(timers);
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner_timers = timers.clone();
        let inner_log = log.clone();
        timers.start_one_shot(
            Duration::ZERO,
            Box::new(move |_| {
                inner_log.lock().push("outer");
                inner_timers.start_one_shot(Duration::ZERO, recorder(&inner_log, "inner"));
            }),
        );

        clock.advance_ms(0);
        assert_eq!(timers.process_expired(), 1);
        assert_eq!(*log.lock(), vec!["outer"]);

        assert_eq!(timers.process_expired(), 1);
        assert_eq!(*log.lock(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_clear_drops_pending_timers() {
        let (clock, timers) = manager();
        let log = Arc::new(Mutex::new(Vec::new()));
        timers.start_one_shot(Duration::from_millis(1), recorder(&log, "a"));
        timers.start_one_shot(Duration::from_millis(2), recorder(&log, "b"));
        assert_eq!(timers.active_count(), 2);

        timers.clear();
        assert_eq!(timers.active_count(), 0);

        clock.advance_ms(10);
        assert_eq!(timers.process_expired(), 0);
        assert!(log.lock().is_empty());
    }
}
