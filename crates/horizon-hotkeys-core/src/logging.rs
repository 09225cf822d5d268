//! Logging facilities for Horizon Hotkeys.
//!
//! Horizon Hotkeys uses the `tracing` crate for instrumentation and never
//! installs a subscriber itself. To see logs, install one in your host:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_hotkeys=debug,horizon_hotkeys::dispatch=trace")
//!     .init();
//! ```
//!
//! Key-combination conflicts are reported at `warn` level on the
//! [`targets::REGISTRY`] target; per-event dispatch decisions are `trace`.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_hotkeys_core";
    /// Timer system target.
    pub const TIMER: &str = "horizon_hotkeys_core::timer";
    /// Hotkey registry target (registration, activation, conflicts).
    pub const REGISTRY: &str = "horizon_hotkeys::registry";
    /// Keyboard event dispatch target.
    pub const DISPATCH: &str = "horizon_hotkeys::dispatch";
    /// Held-key session bookkeeping target.
    pub const SESSION: &str = "horizon_hotkeys::session";
    /// Activation façade target.
    pub const ENGINE: &str = "horizon_hotkeys::engine";
}
