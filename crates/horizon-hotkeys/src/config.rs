//! Hotkey and engine configuration.
//!
//! - [`HotkeyOptions`]: What a caller passes to register a hotkey
//! - [`HotkeyConfig`]: The normalized, immutable configuration the registry stores
//! - [`EngineConfig`]: Engine-wide defaults, loadable from TOML
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use horizon_hotkeys::{HotkeyOptions, Key, KeyCombination};
//!
//! let options = HotkeyOptions::new(KeyCombination::ctrl(Key::S))
//!     .with_id("save")
//!     .with_key(KeyCombination::meta(Key::S))
//!     .on_key_down(|_event, combination, config| {
//!         println!("{} pressed for {}", combination, config.id());
//!     })
//!     .held_delay(Duration::from_millis(800));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use horizon_hotkeys_core::{HotkeyError, Result};
use serde::Deserialize;

use crate::event::KeyboardEvent;
use crate::keys::KeyCombination;

/// Identifier of a registered hotkey.
pub type HotkeyId = String;

/// A hotkey callback: `(event, matched combination, hotkey config)`.
pub type KeyCallback = Arc<dyn Fn(&KeyboardEvent, &KeyCombination, &HotkeyConfig) + Send + Sync>;

/// Default delay before `on_key_held` fires (in milliseconds).
pub const DEFAULT_HELD_DELAY_MS: u64 = 500;

/// The stored configuration of a registered hotkey.
///
/// Created by [`HotkeyOptions::build`]; immutable afterwards and shared
/// between the registry and in-flight dispatches.
pub struct HotkeyConfig {
    id: HotkeyId,
    keys: Vec<KeyCombination>,
    description: Option<String>,
    on_key_down: Option<KeyCallback>,
    on_key_up: Option<KeyCallback>,
    on_key_held: Option<KeyCallback>,
    held_delay: Duration,
    allow_input_fields: bool,
    ignore_conflicts: bool,
    always_trigger_key_up: bool,
}

impl HotkeyConfig {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The key combinations that trigger this hotkey, without duplicates.
    pub fn keys(&self) -> &[KeyCombination] {
        &self.keys
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn on_key_down(&self) -> Option<&KeyCallback> {
        self.on_key_down.as_ref()
    }

    pub fn on_key_up(&self) -> Option<&KeyCallback> {
        self.on_key_up.as_ref()
    }

    pub fn on_key_held(&self) -> Option<&KeyCallback> {
        self.on_key_held.as_ref()
    }

    /// How long a combination must stay pressed before `on_key_held` fires.
    pub fn held_delay(&self) -> Duration {
        self.held_delay
    }

    /// Whether callbacks run while a text-entry field has focus.
    pub fn allow_input_fields(&self) -> bool {
        self.allow_input_fields
    }

    /// Whether sharing a key combination with other hotkeys is expected.
    pub fn ignore_conflicts(&self) -> bool {
        self.ignore_conflicts
    }

    /// Whether `on_key_up` still fires after `on_key_held` consumed the press.
    pub fn always_trigger_key_up(&self) -> bool {
        self.always_trigger_key_up
    }
}

impl fmt::Debug for HotkeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyConfig")
            .field("id", &self.id)
            .field("keys", &self.keys)
            .field("description", &self.description)
            .field("on_key_down", &self.on_key_down.is_some())
            .field("on_key_up", &self.on_key_up.is_some())
            .field("on_key_held", &self.on_key_held.is_some())
            .field("held_delay", &self.held_delay)
            .field("allow_input_fields", &self.allow_input_fields)
            .field("ignore_conflicts", &self.ignore_conflicts)
            .field("always_trigger_key_up", &self.always_trigger_key_up)
            .finish()
    }
}

/// Options for registering a hotkey.
///
/// Unset values fall back to defaults when the options are built: a
/// generated id, the engine's default held delay, and `false` for every flag.
#[derive(Clone, Default)]
pub struct HotkeyOptions {
    id: Option<String>,
    keys: Vec<KeyCombination>,
    description: Option<String>,
    on_key_down: Option<KeyCallback>,
    on_key_up: Option<KeyCallback>,
    on_key_held: Option<KeyCallback>,
    held_delay: Option<Duration>,
    allow_input_fields: bool,
    ignore_conflicts: bool,
    always_trigger_key_up: bool,
}

impl HotkeyOptions {
    /// Create options bound to a single key combination.
    pub fn new(key: KeyCombination) -> Self {
        Self {
            keys: vec![key],
            ..Default::default()
        }
    }

    /// Create options bound to several key combinations.
    pub fn with_keys(keys: impl IntoIterator<Item = KeyCombination>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Add another key combination.
    pub fn with_key(mut self, key: KeyCombination) -> Self {
        self.keys.push(key);
        self
    }

    /// Set an explicit id. Blank ids are replaced by a generated one.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn on_key_down<F>(mut self, callback: F) -> Self
    where
        F: Fn(&KeyboardEvent, &KeyCombination, &HotkeyConfig) + Send + Sync + 'static,
    {
        self.on_key_down = Some(Arc::new(callback));
        self
    }

    pub fn on_key_up<F>(mut self, callback: F) -> Self
    where
        F: Fn(&KeyboardEvent, &KeyCombination, &HotkeyConfig) + Send + Sync + 'static,
    {
        self.on_key_up = Some(Arc::new(callback));
        self
    }

    pub fn on_key_held<F>(mut self, callback: F) -> Self
    where
        F: Fn(&KeyboardEvent, &KeyCombination, &HotkeyConfig) + Send + Sync + 'static,
    {
        self.on_key_held = Some(Arc::new(callback));
        self
    }

    pub fn held_delay(mut self, delay: Duration) -> Self {
        self.held_delay = Some(delay);
        self
    }

    pub fn allow_input_fields(mut self, allow: bool) -> Self {
        self.allow_input_fields = allow;
        self
    }

    pub fn ignore_conflicts(mut self, ignore: bool) -> Self {
        self.ignore_conflicts = ignore;
        self
    }

    pub fn always_trigger_key_up(mut self, always: bool) -> Self {
        self.always_trigger_key_up = always;
        self
    }

    /// The explicit id, trimmed, if one was given and is not blank.
    pub(crate) fn explicit_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    /// Build the stored configuration under `id`.
    ///
    /// Duplicate key combinations are collapsed (first occurrence wins).
    /// Fails if no key combination was given.
    pub fn build(self, id: impl Into<HotkeyId>, engine: &EngineConfig) -> Result<HotkeyConfig> {
        let id = id.into();

        let mut keys: Vec<KeyCombination> = Vec::with_capacity(self.keys.len());
        for key in self.keys {
            if !keys.iter().any(|k| k.id() == key.id()) {
                keys.push(key);
            }
        }
        if keys.is_empty() {
            return Err(HotkeyError::NoKeyCombinations(id));
        }

        Ok(HotkeyConfig {
            id,
            keys,
            description: self.description,
            on_key_down: self.on_key_down,
            on_key_up: self.on_key_up,
            on_key_held: self.on_key_held,
            held_delay: self.held_delay.unwrap_or_else(|| engine.default_held_delay()),
            allow_input_fields: self.allow_input_fields,
            ignore_conflicts: self.ignore_conflicts,
            always_trigger_key_up: self.always_trigger_key_up,
        })
    }
}

impl fmt::Debug for HotkeyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyOptions")
            .field("id", &self.id)
            .field("keys", &self.keys)
            .field("held_delay", &self.held_delay)
            .finish_non_exhaustive()
    }
}

/// Engine-wide settings.
///
/// ```
/// use horizon_hotkeys::EngineConfig;
///
/// let config = EngineConfig::from_toml_str("default_held_delay_ms = 750").unwrap();
/// assert_eq!(config.default_held_delay_ms, 750);
/// assert!(config.warn_on_conflicts);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Held delay for hotkeys that do not set their own.
    pub default_held_delay_ms: u64,
    /// Whether registering a combination that another hotkey already
    /// declares logs a warning.
    pub warn_on_conflicts: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_held_delay_ms: DEFAULT_HELD_DELAY_MS,
            warn_on_conflicts: true,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| HotkeyError::Config(e.to_string()))
    }

    pub fn default_held_delay(&self) -> Duration {
        Duration::from_millis(self.default_held_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Key;

    #[test]
    fn test_defaults_applied_on_build() {
        let config = HotkeyOptions::new(KeyCombination::key_only(Key::A))
            .build("a", &EngineConfig::default())
            .unwrap();

        assert_eq!(config.id(), "a");
        assert_eq!(config.held_delay(), Duration::from_millis(DEFAULT_HELD_DELAY_MS));
        assert!(!config.allow_input_fields());
        assert!(!config.ignore_conflicts());
        assert!(!config.always_trigger_key_up());
        assert!(config.on_key_down().is_none());
        assert!(config.description().is_none());
    }

    #[test]
    fn test_engine_default_delay_and_override() {
        let engine = EngineConfig {
            default_held_delay_ms: 900,
            ..Default::default()
        };
        let inherited = HotkeyOptions::new(KeyCombination::key_only(Key::A))
            .build("a", &engine)
            .unwrap();
        assert_eq!(inherited.held_delay(), Duration::from_millis(900));

        let overridden = HotkeyOptions::new(KeyCombination::key_only(Key::A))
            .held_delay(Duration::from_millis(50))
            .build("a", &engine)
            .unwrap();
        assert_eq!(overridden.held_delay(), Duration::from_millis(50));
    }

    #[test]
    fn test_duplicate_keys_collapse() {
        let config = HotkeyOptions::new(KeyCombination::ctrl(Key::S))
            .with_key("Ctrl+S".parse().unwrap())
            .with_key(KeyCombination::meta(Key::S))
            .build("save", &EngineConfig::default())
            .unwrap();
        assert_eq!(config.keys().len(), 2);
        assert_eq!(config.keys()[1], KeyCombination::meta(Key::S));
    }

    #[test]
    fn test_empty_keys_rejected() {
        let result = HotkeyOptions::with_keys(Vec::<KeyCombination>::new()).build("nothing", &EngineConfig::default());
        assert_eq!(result.unwrap_err(), HotkeyError::NoKeyCombinations("nothing".into()));
    }

    #[test]
    fn test_explicit_id_is_trimmed() {
        let options = HotkeyOptions::new(KeyCombination::key_only(Key::A)).with_id("  save ");
        assert_eq!(options.explicit_id(), Some("save"));

        let blank = HotkeyOptions::new(KeyCombination::key_only(Key::A)).with_id("   ");
        assert_eq!(blank.explicit_id(), None);
    }

    #[test]
    fn test_engine_config_from_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            default_held_delay_ms = 300
            warn_on_conflicts = false
            "#,
        )
        .unwrap();
        assert_eq!(config.default_held_delay(), Duration::from_millis(300));
        assert!(!config.warn_on_conflicts);

        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_engine_config_rejects_unknown_keys() {
        let err = EngineConfig::from_toml_str("held = 1").unwrap_err();
        assert!(matches!(err, HotkeyError::Config(_)));
    }
}
