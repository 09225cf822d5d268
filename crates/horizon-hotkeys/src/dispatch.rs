//! Keyboard event dispatch.
//!
//! The [`Dispatcher`] turns key press and release events into hotkey
//! callbacks:
//!
//! - keydown invokes `on_key_down` and starts a held timer for hotkeys with
//!   an `on_key_held` callback, unless one is already pending or already
//!   fired for this press (OS key repeat);
//! - the held timer invokes `on_key_held` once per press and marks the press
//!   as consumed;
//! - keyup invokes `on_key_up` unless the press was consumed (and the hotkey
//!   did not ask for `always_trigger_key_up`), then clears the press state.
//!
//! No lock is held while a callback runs, so callbacks may register, bind or
//! unbind hotkeys on the same engine.
//!
//! # Lock order
//!
//! registry, then session. Neither is held while calling into the
//! [`Scheduler`].

use std::sync::Arc;

use horizon_hotkeys_core::{Scheduler, TimerId};
use parking_lot::Mutex;

use crate::config::HotkeyConfig;
use crate::event::{InputFieldDetector, KeyboardEvent};
use crate::keys::{KeyCombination, KeyCombinationId};
use crate::registry::HotkeyRegistry;
use crate::session::{HeldId, SessionState};

/// Routes keyboard events to the active hotkeys of one registry.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Mutex<HotkeyRegistry>>,
    session: Arc<Mutex<SessionState>>,
    scheduler: Arc<dyn Scheduler>,
    input_fields: Arc<dyn InputFieldDetector>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<Mutex<HotkeyRegistry>>,
        session: Arc<Mutex<SessionState>>,
        scheduler: Arc<dyn Scheduler>,
        input_fields: Arc<dyn InputFieldDetector>,
    ) -> Self {
        Self {
            registry,
            session,
            scheduler,
            input_fields,
        }
    }

    /// Handle a key press.
    pub fn handle_key_down(&self, event: &KeyboardEvent) {
        let key_id = event.key_combination_id();
        let Some(configs) = self.active_hotkeys(&key_id) else {
            return;
        };
        tracing::trace!(target: "horizon_hotkeys::dispatch", key = %key_id, hotkeys = configs.len(), repeat = event.is_repeat, "keydown");

        for config in &configs {
            if self.suppressed_by_input_field(event, config) {
                continue;
            }
            for combination in config.keys().iter().filter(|k| *k.id() == key_id) {
                if let Some(on_key_down) = config.on_key_down() {
                    on_key_down(event, combination, config.as_ref());
                }
                if config.on_key_held().is_some() {
                    self.start_held_timer(event, combination, config);
                }
            }
        }
    }

    /// Handle a key release.
    pub fn handle_key_up(&self, event: &KeyboardEvent) {
        let key_id = event.key_combination_id();
        let Some(configs) = self.active_hotkeys(&key_id) else {
            return;
        };
        tracing::trace!(target: "horizon_hotkeys::dispatch", key = %key_id, hotkeys = configs.len(), "keyup");

        for config in &configs {
            let suppressed = self.suppressed_by_input_field(event, config);
            for combination in config.keys().iter().filter(|k| *k.id() == key_id) {
                let held = HeldId::new(combination.id().clone(), config.id());
                let _cleanup = HeldCleanup {
                    dispatcher: self,
                    held: &held,
                };
                if suppressed {
                    continue;
                }

                let consumed = self.session.lock().is_triggered(&held);
                if consumed && !config.always_trigger_key_up() {
                    tracing::trace!(target: "horizon_hotkeys::dispatch", hotkey = %config.id(), "keyup consumed by held callback");
                    continue;
                }
                if let Some(on_key_up) = config.on_key_up() {
                    on_key_up(event, combination, config.as_ref());
                }
            }
        }
    }

    /// Cancel a hotkey's pending held timers and clear its triggered marks.
    ///
    /// Called when a hotkey stops being dispatchable.
    pub fn clear_held_state(&self, hotkey_id: &str) {
        let timers = self.session.lock().take_timers_for_hotkey(hotkey_id);
        if !timers.is_empty() {
            tracing::trace!(target: "horizon_hotkeys::dispatch", hotkey = %hotkey_id, cancelled = timers.len(), "cancelled held timers");
        }
        for timer in timers {
            self.scheduler.cancel(timer);
        }
    }

    /// Cancel every pending held timer and clear all triggered marks.
    pub fn clear_all_held_state(&self) {
        let timers = self.session.lock().drain_timers();
        for timer in timers {
            self.scheduler.cancel(timer);
        }
    }

    fn active_hotkeys(&self, key_id: &KeyCombinationId) -> Option<Vec<Arc<HotkeyConfig>>> {
        self.registry.lock().get_hotkeys_for_key_combination(key_id)
    }

    /// Events without a target are never suppressed.
    fn suppressed_by_input_field(&self, event: &KeyboardEvent, config: &HotkeyConfig) -> bool {
        if config.allow_input_fields() {
            return false;
        }
        event
            .target
            .as_ref()
            .is_some_and(|target| self.input_fields.is_input_field(target))
    }

    fn start_held_timer(
        &self,
        event: &KeyboardEvent,
        combination: &KeyCombination,
        config: &Arc<HotkeyConfig>,
    ) {
        let held = HeldId::new(combination.id().clone(), config.id());

        let pending = |session: &SessionState| session.has_timer(&held) || session.is_triggered(&held);
        if pending(&*self.session.lock()) {
            return;
        }

        let registry = Arc::clone(&self.registry);
        let session_state = Arc::clone(&self.session);
        let event = event.clone();
        let combination = combination.clone();
        let config_for_timer = Arc::clone(config);
        let held_for_timer = held.clone();

        // Scheduled without the session lock; a callback run early finds no
        // timer on record and does nothing.
        let timer = self.scheduler.schedule(
            config.held_delay(),
            Box::new(move |timer_id| {
                fire_held(
                    &registry,
                    &session_state,
                    &held_for_timer,
                    timer_id,
                    &event,
                    &combination,
                    &config_for_timer,
                );
            }),
        );

        let mut session = self.session.lock();
        if pending(&*session) {
            drop(session);
            self.scheduler.cancel(timer);
            return;
        }
        tracing::trace!(target: "horizon_hotkeys::dispatch", hotkey = %held.hotkey_id, key = %held.key_id, ?timer, "held timer started");
        session.insert_timer(held, timer);
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

/// Runs when a held timer elapses.
///
/// The callback only fires if the timer is still the one on record and the
/// hotkey (with this exact configuration) is still active for the
/// combination.
fn fire_held(
    registry: &Mutex<HotkeyRegistry>,
    session: &Mutex<SessionState>,
    held: &HeldId,
    timer: TimerId,
    event: &KeyboardEvent,
    combination: &KeyCombination,
    config: &Arc<HotkeyConfig>,
) {
    {
        let registry = registry.lock();
        let mut session = session.lock();
        if !session.remove_timer_if(held, timer) {
            return;
        }
        let current = registry
            .get_hotkey(&held.hotkey_id)
            .is_some_and(|stored| Arc::ptr_eq(&stored, config));
        if !current || !registry.is_active_for(&held.key_id, &held.hotkey_id) {
            tracing::trace!(target: "horizon_hotkeys::dispatch", hotkey = %held.hotkey_id, "held timer elapsed for inactive hotkey");
            return;
        }
        session.mark_triggered(held.clone());
    }

    if let Some(on_key_held) = config.on_key_held() {
        on_key_held(event, combination, config.as_ref());
    }
}

/// Clears a press's held state when dropped, even if a callback panics.
struct HeldCleanup<'a> {
    dispatcher: &'a Dispatcher,
    held: &'a HeldId,
}

impl Drop for HeldCleanup<'_> {
    fn drop(&mut self) {
        let timer = {
            let mut session = self.dispatcher.session.lock();
            session.clear_triggered(self.held);
            session.take_timer(self.held)
        };
        if let Some(timer) = timer {
            self.dispatcher.scheduler.cancel(timer);
        }
    }
}
