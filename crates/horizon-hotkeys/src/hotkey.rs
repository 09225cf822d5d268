//! The activation façade.
//!
//! [`HotkeyEngine`] ties a registry, a held-key session and a dispatcher
//! together. Hosts register hotkeys through it, feed it keyboard events and
//! drive its timers from their event loop:
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use horizon_hotkeys::{
//!     HotkeyEngine, HotkeyOptions, Key, KeyCombination, KeyboardEvent, KeyboardModifiers,
//! };
//!
//! let engine = HotkeyEngine::new();
//! let saves = Arc::new(AtomicUsize::new(0));
//! let counter = saves.clone();
//!
//! let save = engine
//!     .register_hotkey(
//!         HotkeyOptions::new(KeyCombination::ctrl(Key::S))
//!             .with_id("save")
//!             .on_key_down(move |_, _, _| {
//!                 counter.fetch_add(1, Ordering::SeqCst);
//!             }),
//!     )
//!     .unwrap();
//!
//! // Registered hotkeys only dispatch while bound.
//! let binding = save.force_bind();
//! engine.handle_key_down(&KeyboardEvent::new(Key::S, KeyboardModifiers::CTRL));
//! binding.release();
//! engine.handle_key_down(&KeyboardEvent::new(Key::S, KeyboardModifiers::CTRL));
//!
//! assert_eq!(saves.load(Ordering::SeqCst), 1);
//! ```
//!
//! Each call to [`Hotkey::force_bind`] or [`Hotkey::bind_scoped`] holds its
//! own activation token, so a hotkey used by several independent owners
//! stays bound until the last of them lets go.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use horizon_hotkeys_core::{Clock, Result, Scheduler, SharedTimerManager, SystemClock};
use parking_lot::Mutex;
use static_assertions::assert_impl_all;

use crate::config::{EngineConfig, HotkeyConfig, HotkeyOptions};
use crate::dispatch::Dispatcher;
use crate::event::{InputFieldDetector, KeyboardEvent, TagNameDetector};
use crate::registry::{ActivationToken, HotkeyRegistry};
use crate::session::SessionState;

/// Global default engine.
static GLOBAL_ENGINE: OnceLock<HotkeyEngine> = OnceLock::new();

struct EngineInner {
    config: EngineConfig,
    registry: Arc<Mutex<HotkeyRegistry>>,
    /// Built-in timers; `None` when the host supplied its own scheduler.
    timers: Option<Arc<SharedTimerManager>>,
    dispatcher: Dispatcher,
    next_generated_id: AtomicU64,
}

/// A hotkey engine instance.
///
/// Cloning is cheap and yields a handle to the same engine.
#[derive(Clone)]
pub struct HotkeyEngine {
    inner: Arc<EngineInner>,
}

assert_impl_all!(HotkeyEngine: Send, Sync);

impl HotkeyEngine {
    /// Create an engine with default settings and the system clock.
    pub fn new() -> Self {
        HotkeyEngineBuilder::new().build()
    }

    /// Create an engine with the given settings.
    pub fn with_config(config: EngineConfig) -> Self {
        HotkeyEngineBuilder::new().config(config).build()
    }

    pub fn builder() -> HotkeyEngineBuilder {
        HotkeyEngineBuilder::new()
    }

    /// The process-wide default engine.
    ///
    /// Created on first use with default settings. Hosts using it must
    /// still call [`process_timers`](Self::process_timers) from their loop.
    pub fn global() -> &'static HotkeyEngine {
        GLOBAL_ENGINE.get_or_init(HotkeyEngine::new)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Register a hotkey.
    ///
    /// A missing or blank id is replaced by a generated `hotkey-N` id. The
    /// hotkey starts unbound.
    ///
    /// # Errors
    ///
    /// - [`HotkeyError::DuplicateId`](crate::HotkeyError::DuplicateId) if the id is taken
    /// - [`HotkeyError::NoKeyCombinations`](crate::HotkeyError::NoKeyCombinations) if no key
    ///   combination was given
    pub fn register_hotkey(&self, options: HotkeyOptions) -> Result<Hotkey> {
        let mut registry = self.inner.registry.lock();
        let id = match options.explicit_id() {
            Some(id) => id.to_string(),
            None => self.generate_id(&registry),
        };
        let config = options.build(id, &self.inner.config)?;
        let config = registry.register_hotkey(config)?;
        drop(registry);

        Ok(Hotkey {
            engine: self.downgrade(),
            id: config.id().to_string(),
            config,
        })
    }

    /// Get a handle to a registered hotkey.
    pub fn hotkey(&self, id: &str) -> Option<Hotkey> {
        let config = self.inner.registry.lock().get_hotkey(id)?;
        Some(Hotkey {
            engine: self.downgrade(),
            id: id.to_string(),
            config,
        })
    }

    /// Remove a hotkey and cancel its pending held timers.
    ///
    /// Returns `false` if the id is unknown.
    pub fn unregister_hotkey(&self, id: &str) -> bool {
        let removed = self.inner.registry.lock().unregister_hotkey(id).is_some();
        if removed {
            self.inner.dispatcher.clear_held_state(id);
        }
        removed
    }

    /// Activate a hotkey on behalf of the holder of `token`.
    pub fn activate_hotkey(&self, id: &str, token: ActivationToken) {
        self.inner.registry.lock().activate_hotkey(id, token);
    }

    /// Release `token`'s activation of a hotkey.
    ///
    /// Pending held timers are cancelled when the hotkey becomes inactive.
    pub fn deactivate_hotkey(&self, id: &str, token: ActivationToken) {
        let became_inactive = self.inner.registry.lock().deactivate_hotkey(id, token);
        if became_inactive {
            self.inner.dispatcher.clear_held_state(id);
        }
    }

    /// Deactivate a hotkey regardless of how many tokens are held for it.
    pub fn force_deactivate_hotkey(&self, id: &str) {
        if self.inner.registry.lock().force_deactivate_hotkey(id) {
            self.inner.dispatcher.clear_held_state(id);
        }
    }

    /// Whether a hotkey is currently bound.
    pub fn is_active(&self, id: &str) -> bool {
        self.inner.registry.lock().is_active(id)
    }

    /// Ids of all registered hotkeys, in registration order.
    pub fn hotkey_ids(&self) -> Vec<String> {
        self.inner.registry.lock().hotkey_ids()
    }

    /// Number of registered hotkeys.
    pub fn len(&self) -> usize {
        self.inner.registry.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.registry.lock().is_empty()
    }

    /// Dispatch a key press.
    pub fn handle_key_down(&self, event: &KeyboardEvent) {
        self.inner.dispatcher.handle_key_down(event);
    }

    /// Dispatch a key release.
    pub fn handle_key_up(&self, event: &KeyboardEvent) {
        self.inner.dispatcher.handle_key_up(event);
    }

    /// Run expired held timers. Returns how many fired.
    ///
    /// Hosts call this from their event loop. Engines built with a custom
    /// scheduler drive timers through it instead, and this returns 0.
    pub fn process_timers(&self) -> usize {
        match &self.inner.timers {
            Some(timers) => timers.process_expired(),
            None => 0,
        }
    }

    /// Time until the next held timer expires, if any is pending.
    ///
    /// Useful for computing an event-loop wait timeout.
    pub fn time_until_next_timer(&self) -> Option<Duration> {
        self.inner.timers.as_ref()?.time_until_next()
    }

    /// Remove every hotkey, activation and pending timer.
    pub fn reset(&self) {
        self.inner.registry.lock().clear();
        self.inner.dispatcher.clear_all_held_state();
        if let Some(timers) = &self.inner.timers {
            timers.clear();
        }
        tracing::debug!(target: "horizon_hotkeys::engine", "engine reset");
    }

    fn generate_id(&self, registry: &HotkeyRegistry) -> String {
        loop {
            let n = self.inner.next_generated_id.fetch_add(1, Ordering::Relaxed);
            let id = format!("hotkey-{n}");
            if !registry.contains(&id) {
                return id;
            }
        }
    }

    fn downgrade(&self) -> Weak<EngineInner> {
        Arc::downgrade(&self.inner)
    }
}

impl Default for HotkeyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HotkeyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotkeyEngine")
            .field("config", &self.inner.config)
            .field("hotkeys", &self.len())
            .finish()
    }
}

/// Builder for [`HotkeyEngine`].
#[derive(Default)]
pub struct HotkeyEngineBuilder {
    config: EngineConfig,
    clock: Option<Arc<dyn Clock>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    input_field_detector: Option<Arc<dyn InputFieldDetector>>,
}

impl HotkeyEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Clock for the built-in timers. Ignored with a custom scheduler.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Schedule held timers on a host-provided scheduler.
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Replace the default [`TagNameDetector`].
    pub fn input_field_detector(mut self, detector: impl InputFieldDetector + 'static) -> Self {
        self.input_field_detector = Some(Arc::new(detector));
        self
    }

    pub fn build(self) -> HotkeyEngine {
        let mut registry = HotkeyRegistry::new();
        registry.set_warn_on_conflicts(self.config.warn_on_conflicts);
        let registry = Arc::new(Mutex::new(registry));

        let (timers, scheduler) = match self.scheduler {
            Some(scheduler) => (None, scheduler),
            None => {
                let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
                let timers = Arc::new(SharedTimerManager::with_clock(clock));
                let scheduler: Arc<dyn Scheduler> = timers.clone();
                (Some(timers), scheduler)
            }
        };

        let input_fields = self
            .input_field_detector
            .unwrap_or_else(|| Arc::new(TagNameDetector));

        let dispatcher = Dispatcher::new(
            Arc::clone(&registry),
            Arc::new(Mutex::new(SessionState::new())),
            scheduler,
            input_fields,
        );

        HotkeyEngine {
            inner: Arc::new(EngineInner {
                config: self.config,
                registry,
                timers,
                dispatcher,
                next_generated_id: AtomicU64::new(1),
            }),
        }
    }
}

/// A registered hotkey.
///
/// Operations act on the registration this handle was created for; once the
/// hotkey is unregistered they are no-ops, even if another hotkey later
/// reuses the id.
///
/// A handle does not keep its engine alive, so a callback may capture its
/// own `Hotkey`. Once the engine is dropped every operation is a no-op.
#[derive(Clone)]
pub struct Hotkey {
    engine: Weak<EngineInner>,
    id: String,
    config: Arc<HotkeyConfig>,
}

assert_impl_all!(Hotkey: Send, Sync);

impl Hotkey {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The stored configuration.
    pub fn config(&self) -> &Arc<HotkeyConfig> {
        &self.config
    }

    /// The engine this hotkey was registered on, if it still exists.
    pub fn engine(&self) -> Option<HotkeyEngine> {
        self.engine.upgrade().map(|inner| HotkeyEngine { inner })
    }

    /// Whether at least one activation token is held for this hotkey.
    pub fn is_bound(&self) -> bool {
        self.with_current(|registry| registry.is_active(&self.id))
            .unwrap_or(false)
    }

    /// Whether this hotkey is still registered.
    pub fn is_registered(&self) -> bool {
        self.with_current(|_| ()).is_some()
    }

    /// Activate the hotkey with a fresh token.
    ///
    /// The returned handle releases that token exactly once. Dropping the
    /// handle without releasing it leaves the hotkey bound.
    pub fn force_bind(&self) -> BindHandle {
        let token = ActivationToken::new();
        self.with_current(|registry| registry.activate_hotkey(&self.id, token));
        BindHandle {
            engine: self.engine.clone(),
            id: self.id.clone(),
            token,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Drop every activation of this hotkey, whoever holds it.
    pub fn force_unbind(&self) {
        let Some(inner) = self.engine.upgrade() else {
            return;
        };
        let deactivated = {
            let mut registry = inner.registry.lock();
            self.is_current(&registry) && registry.force_deactivate_hotkey(&self.id)
        };
        if deactivated {
            inner.dispatcher.clear_held_state(&self.id);
        }
    }

    /// Bind for the lifetime of the returned guard.
    ///
    /// This is the mount/unmount form of [`force_bind`](Self::force_bind):
    /// tie the guard to a view, mode or scope and the binding ends when the
    /// guard is dropped.
    pub fn bind_scoped(&self) -> BindGuard {
        BindGuard {
            handle: self.force_bind(),
        }
    }

    /// Remove this hotkey from its engine.
    ///
    /// Returns `false` if it was already unregistered.
    pub fn unregister(&self) -> bool {
        let Some(inner) = self.engine.upgrade() else {
            return false;
        };
        let removed = {
            let mut registry = inner.registry.lock();
            self.is_current(&registry) && registry.unregister_hotkey(&self.id).is_some()
        };
        if removed {
            inner.dispatcher.clear_held_state(&self.id);
        }
        removed
    }

    /// Run `f` on the registry if the engine is alive and still holds this
    /// registration.
    fn with_current<T>(&self, f: impl FnOnce(&mut HotkeyRegistry) -> T) -> Option<T> {
        let inner = self.engine.upgrade()?;
        let mut registry = inner.registry.lock();
        self.is_current(&registry).then(|| f(&mut registry))
    }

    fn is_current(&self, registry: &HotkeyRegistry) -> bool {
        registry
            .get_hotkey(&self.id)
            .is_some_and(|stored| Arc::ptr_eq(&stored, &self.config))
    }
}

impl std::fmt::Debug for Hotkey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hotkey")
            .field("id", &self.id)
            .field("keys", &self.config.keys())
            .finish()
    }
}

/// Releases one activation created by [`Hotkey::force_bind`].
///
/// Clones share the same token; releasing any of them releases it once.
#[derive(Debug, Clone)]
pub struct BindHandle {
    engine: Weak<EngineInner>,
    id: String,
    token: ActivationToken,
    released: Arc<AtomicBool>,
}

assert_impl_all!(BindHandle: Send, Sync);

impl BindHandle {
    /// Release the activation. Calling this again has no effect.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(inner) = self.engine.upgrade() {
            HotkeyEngine { inner }.deactivate_hotkey(&self.id, self.token);
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    pub fn token(&self) -> ActivationToken {
        self.token
    }

    pub fn hotkey_id(&self) -> &str {
        &self.id
    }
}

/// An activation released when dropped.
#[derive(Debug)]
#[must_use = "the hotkey is unbound as soon as the guard is dropped"]
pub struct BindGuard {
    handle: BindHandle,
}

assert_impl_all!(BindGuard: Send, Sync);

impl BindGuard {
    /// Release now instead of at drop.
    pub fn release(self) {
        self.handle.release();
    }

    pub fn token(&self) -> ActivationToken {
        self.handle.token()
    }
}

impl Drop for BindGuard {
    fn drop(&mut self) {
        self.handle.release();
    }
}

/// Register a hotkey on the [global engine](HotkeyEngine::global).
pub fn register_hotkey(options: HotkeyOptions) -> Result<Hotkey> {
    HotkeyEngine::global().register_hotkey(options)
}
