//! The hotkey registry.
//!
//! The registry owns every registered [`HotkeyConfig`] and three indices
//! over them:
//!
//! - which hotkeys declare a key combination (used for conflict warnings),
//! - which of those are currently active (the only ones that dispatch),
//! - which [`ActivationToken`]s keep each hotkey active.
//!
//! A hotkey is active while at least one token is held for it. Tokens are
//! handed out by the activation façade; each owner (a mounted view, a mode,
//! a test) keeps its own, so independent owners never deactivate each other.
//!
//! When several hotkeys declare the same combination they all stay
//! registered and all dispatch, in registration order.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use horizon_hotkeys_core::{HotkeyError, Result};

use crate::config::{HotkeyConfig, HotkeyId};
use crate::keys::KeyCombinationId;

/// Opaque proof of one owner's interest in keeping a hotkey active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivationToken(u64);

impl ActivationToken {
    /// Generate a new unique token.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw token value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ActivationToken {
    fn default() -> Self {
        Self::new()
    }
}

struct RegisteredHotkey {
    config: Arc<HotkeyConfig>,
    /// Registration sequence number; orders the active lists.
    seq: u64,
}

/// Store of hotkey configurations and their key-combination indices.
///
/// Engines wrap the registry in a mutex; every method here completes its
/// update before returning, so each call is atomic with respect to others.
pub struct HotkeyRegistry {
    all_hotkeys: HashMap<HotkeyId, RegisteredHotkey>,
    registered_key_combinations: HashMap<KeyCombinationId, Vec<HotkeyId>>,
    active_key_combinations: HashMap<KeyCombinationId, Vec<HotkeyId>>,
    hotkey_activations: HashMap<HotkeyId, Vec<ActivationToken>>,
    next_seq: u64,
    warn_on_conflicts: bool,
}

impl HotkeyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            all_hotkeys: HashMap::new(),
            registered_key_combinations: HashMap::new(),
            active_key_combinations: HashMap::new(),
            hotkey_activations: HashMap::new(),
            next_seq: 0,
            warn_on_conflicts: true,
        }
    }

    /// Enable or disable conflict warnings for the whole registry.
    ///
    /// Individual hotkeys can still opt out with `ignore_conflicts`.
    pub fn set_warn_on_conflicts(&mut self, warn: bool) {
        self.warn_on_conflicts = warn;
    }

    /// Register a hotkey.
    ///
    /// The hotkey starts inactive. Declaring a combination that other
    /// hotkeys already declare logs a warning but still succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`HotkeyError::DuplicateId`] if a hotkey with the same id is
    /// already registered.
    pub fn register_hotkey(&mut self, config: HotkeyConfig) -> Result<Arc<HotkeyConfig>> {
        if self.all_hotkeys.contains_key(config.id()) {
            return Err(HotkeyError::DuplicateId(config.id().to_string()));
        }

        let config = Arc::new(config);
        let id: HotkeyId = config.id().to_string();

        for key in config.keys() {
            let owners = self
                .registered_key_combinations
                .entry(key.id().clone())
                .or_default();
            if owners.contains(&id) {
                continue;
            }
            if !owners.is_empty() && self.warn_on_conflicts && !config.ignore_conflicts() {
                tracing::warn!(
                    target: "horizon_hotkeys::registry",
                    hotkey = %id,
                    key = %key,
                    existing = ?owners,
                    "key combination is already registered by other hotkeys"
                );
            }
            owners.push(id.clone());
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.all_hotkeys.insert(
            id.clone(),
            RegisteredHotkey {
                config: Arc::clone(&config),
                seq,
            },
        );

        tracing::debug!(target: "horizon_hotkeys::registry", hotkey = %id, keys = config.keys().len(), "registered hotkey");
        Ok(config)
    }

    /// Remove a hotkey from every index.
    ///
    /// Returns the removed configuration, or `None` if the id is unknown.
    pub fn unregister_hotkey(&mut self, id: &str) -> Option<Arc<HotkeyConfig>> {
        let removed = self.all_hotkeys.remove(id)?;

        for key in removed.config.keys() {
            remove_from_index(&mut self.registered_key_combinations, key.id(), id);
            remove_from_index(&mut self.active_key_combinations, key.id(), id);
        }
        self.hotkey_activations.remove(id);

        tracing::debug!(target: "horizon_hotkeys::registry", hotkey = %id, "unregistered hotkey");
        Some(removed.config)
    }

    /// Add `token` to the hotkey's activations.
    ///
    /// The hotkey is inserted into the active index of each of its
    /// combinations where it is missing, keeping registration order.
    /// Activating twice with the same token has no further effect. Unknown
    /// ids are ignored.
    pub fn activate_hotkey(&mut self, id: &str, token: ActivationToken) {
        let Some(entry) = self.all_hotkeys.get(id) else {
            return;
        };

        for key in entry.config.keys() {
            let active = self.active_key_combinations.entry(key.id().clone()).or_default();
            if active.iter().any(|existing| existing == id) {
                continue;
            }
            let position = active
                .iter()
                .position(|existing| {
                    self.all_hotkeys
                        .get(existing)
                        .is_some_and(|other| other.seq > entry.seq)
                })
                .unwrap_or(active.len());
            active.insert(position, id.to_string());
        }

        let tokens = self.hotkey_activations.entry(id.to_string()).or_default();
        if !tokens.contains(&token) {
            tokens.push(token);
            tracing::trace!(
                target: "horizon_hotkeys::registry",
                hotkey = %id,
                token = token.as_u64(),
                activations = tokens.len(),
                "activated hotkey"
            );
        }
    }

    /// Remove `token` from the hotkey's activations.
    ///
    /// When the last token goes the hotkey leaves every active index.
    /// Returns `true` if this call made the hotkey inactive. Unknown ids and
    /// tokens that are not held are ignored.
    pub fn deactivate_hotkey(&mut self, id: &str, token: ActivationToken) -> bool {
        let Some(tokens) = self.hotkey_activations.get_mut(id) else {
            return false;
        };
        let Some(index) = tokens.iter().position(|held| *held == token) else {
            return false;
        };
        tokens.remove(index);
        tracing::trace!(
            target: "horizon_hotkeys::registry",
            hotkey = %id,
            token = token.as_u64(),
            activations = tokens.len(),
            "deactivated hotkey"
        );

        if !tokens.is_empty() {
            return false;
        }
        self.hotkey_activations.remove(id);
        self.remove_from_active(id);
        true
    }

    /// Drop every token held for the hotkey, whoever holds it.
    ///
    /// Returns `true` if the hotkey was active.
    pub fn force_deactivate_hotkey(&mut self, id: &str) -> bool {
        let was_active = self.hotkey_activations.remove(id).is_some();
        self.remove_from_active(id);
        if was_active {
            tracing::debug!(target: "horizon_hotkeys::registry", hotkey = %id, "force-deactivated hotkey");
        }
        was_active
    }

    /// The active hotkeys bound to a key combination, in registration order.
    ///
    /// Returns `None` when no active hotkey is bound to it.
    pub fn get_hotkeys_for_key_combination(
        &self,
        key_id: &KeyCombinationId,
    ) -> Option<Vec<Arc<HotkeyConfig>>> {
        let active = self.active_key_combinations.get(key_id)?;
        if active.is_empty() {
            return None;
        }
        Some(
            active
                .iter()
                .filter_map(|id| self.all_hotkeys.get(id))
                .map(|entry| Arc::clone(&entry.config))
                .collect(),
        )
    }

    /// Look up a registered hotkey.
    pub fn get_hotkey(&self, id: &str) -> Option<Arc<HotkeyConfig>> {
        self.all_hotkeys.get(id).map(|entry| Arc::clone(&entry.config))
    }

    /// Whether the hotkey is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.all_hotkeys.contains_key(id)
    }

    /// Whether the hotkey holds at least one activation token.
    pub fn is_active(&self, id: &str) -> bool {
        self.hotkey_activations
            .get(id)
            .is_some_and(|tokens| !tokens.is_empty())
    }

    /// Number of activation tokens held for the hotkey.
    pub fn activation_count(&self, id: &str) -> usize {
        self.hotkey_activations.get(id).map_or(0, Vec::len)
    }

    /// Whether `id` is in the active index for `key_id`.
    pub fn is_active_for(&self, key_id: &KeyCombinationId, id: &str) -> bool {
        self.active_key_combinations
            .get(key_id)
            .is_some_and(|active| active.iter().any(|existing| existing == id))
    }

    /// The registered hotkeys sharing a key combination.
    ///
    /// Returns the owners in registration order when more than one hotkey
    /// declares `key_id`, and an empty list otherwise.
    pub fn conflicts_for(&self, key_id: &KeyCombinationId) -> Vec<HotkeyId> {
        match self.registered_key_combinations.get(key_id) {
            Some(owners) if owners.len() > 1 => owners.clone(),
            _ => Vec::new(),
        }
    }

    /// Ids of all registered hotkeys, in registration order.
    pub fn hotkey_ids(&self) -> Vec<HotkeyId> {
        let mut entries: Vec<(&HotkeyId, u64)> = self
            .all_hotkeys
            .iter()
            .map(|(id, entry)| (id, entry.seq))
            .collect();
        entries.sort_by_key(|(_, seq)| *seq);
        entries.into_iter().map(|(id, _)| id.clone()).collect()
    }

    /// Number of registered hotkeys.
    pub fn len(&self) -> usize {
        self.all_hotkeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_hotkeys.is_empty()
    }

    /// Remove every hotkey and activation.
    pub fn clear(&mut self) {
        self.all_hotkeys.clear();
        self.registered_key_combinations.clear();
        self.active_key_combinations.clear();
        self.hotkey_activations.clear();
    }

    fn remove_from_active(&mut self, id: &str) {
        let Some(entry) = self.all_hotkeys.get(id) else {
            return;
        };
        for key in entry.config.keys() {
            remove_from_index(&mut self.active_key_combinations, key.id(), id);
        }
    }
}

impl Default for HotkeyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HotkeyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotkeyRegistry")
            .field("hotkeys", &self.all_hotkeys.len())
            .field("registered_key_combinations", &self.registered_key_combinations)
            .field("active_key_combinations", &self.active_key_combinations)
            .field("hotkey_activations", &self.hotkey_activations)
            .finish()
    }
}

/// Remove `id` from `index[key_id]`, deleting the list once empty.
fn remove_from_index(
    index: &mut HashMap<KeyCombinationId, Vec<HotkeyId>>,
    key_id: &KeyCombinationId,
    id: &str,
) {
    if let Some(ids) = index.get_mut(key_id) {
        ids.retain(|existing| existing != id);
        if ids.is_empty() {
            index.remove(key_id);
        }
    }
}
