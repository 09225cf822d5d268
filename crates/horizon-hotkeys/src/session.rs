//! Per-engine held-key bookkeeping.
//!
//! While a key combination stays pressed, each hotkey bound to it with an
//! `on_key_held` callback owns at most one pending timer. Once that timer
//! fires, the (combination, hotkey) pair is marked as triggered until the
//! key is released, which lets keyup tell a long press from a short one.
//!
//! [`SessionState`] only records timer ownership. Scheduling and cancelling
//! the timers themselves is the dispatcher's job.

use std::collections::{HashMap, HashSet};

use horizon_hotkeys_core::TimerId;

use crate::keys::KeyCombinationId;

/// Identifies one hotkey's interest in one pressed key combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeldId {
    pub key_id: KeyCombinationId,
    pub hotkey_id: String,
}

impl HeldId {
    pub fn new(key_id: KeyCombinationId, hotkey_id: impl Into<String>) -> Self {
        Self {
            key_id,
            hotkey_id: hotkey_id.into(),
        }
    }
}

/// Pending held timers and the presses they already consumed.
#[derive(Debug, Default)]
pub struct SessionState {
    held_timeouts: HashMap<HeldId, TimerId>,
    held_triggered: HashSet<HeldId>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a held timer is pending for `held`.
    pub fn has_timer(&self, held: &HeldId) -> bool {
        self.held_timeouts.contains_key(held)
    }

    /// Record the pending timer for `held`.
    ///
    /// Returns the timer it replaced, which the caller must cancel. Callers
    /// check [`has_timer`](Self::has_timer) first, so this is normally `None`.
    pub fn insert_timer(&mut self, held: HeldId, timer: TimerId) -> Option<TimerId> {
        self.held_timeouts.insert(held, timer)
    }

    /// Remove the entry for `held` only if it still refers to `timer`.
    ///
    /// Returns `false` when the entry was already removed or replaced.
    pub fn remove_timer_if(&mut self, held: &HeldId, timer: TimerId) -> bool {
        if self.held_timeouts.get(held) == Some(&timer) {
            self.held_timeouts.remove(held);
            true
        } else {
            false
        }
    }

    /// Remove and return the pending timer for `held`.
    pub fn take_timer(&mut self, held: &HeldId) -> Option<TimerId> {
        self.held_timeouts.remove(held)
    }

    /// Mark the press as consumed by `on_key_held`.
    pub fn mark_triggered(&mut self, held: HeldId) {
        tracing::trace!(target: "horizon_hotkeys::session", hotkey = %held.hotkey_id, key = %held.key_id, "held triggered");
        self.held_triggered.insert(held);
    }

    pub fn is_triggered(&self, held: &HeldId) -> bool {
        self.held_triggered.contains(held)
    }

    /// Clear the triggered mark. Returns whether it was set.
    pub fn clear_triggered(&mut self, held: &HeldId) -> bool {
        self.held_triggered.remove(held)
    }

    /// Forget everything recorded for a hotkey.
    ///
    /// Clears its triggered marks and returns its pending timers so the
    /// caller can cancel them.
    pub fn take_timers_for_hotkey(&mut self, hotkey_id: &str) -> Vec<TimerId> {
        self.held_triggered.retain(|held| held.hotkey_id != hotkey_id);

        let owned: Vec<HeldId> = self
            .held_timeouts
            .keys()
            .filter(|held| held.hotkey_id == hotkey_id)
            .cloned()
            .collect();

        owned
            .iter()
            .filter_map(|held| self.held_timeouts.remove(held))
            .collect()
    }

    /// Clear all state, returning every pending timer.
    pub fn drain_timers(&mut self) -> Vec<TimerId> {
        self.held_triggered.clear();
        self.held_timeouts.drain().map(|(_, timer)| timer).collect()
    }

    /// Number of pending held timers.
    pub fn pending_count(&self) -> usize {
        self.held_timeouts.len()
    }

    /// Number of presses currently marked as triggered.
    pub fn triggered_count(&self) -> usize {
        self.held_triggered.len()
    }
}
