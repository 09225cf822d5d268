//! Error types for Horizon Hotkeys.

/// The main error type for hotkey operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HotkeyError {
    /// A hotkey with this ID is already registered.
    #[error("Hotkey '{0}' is already registered")]
    DuplicateId(String),

    /// The hotkey does not declare any key combination.
    #[error("Hotkey '{0}' must declare at least one key combination")]
    NoKeyCombinations(String),

    /// The engine configuration could not be loaded.
    #[error("Invalid engine configuration: {0}")]
    Config(String),

    /// Timer-related error.
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),
}

/// Timer-specific errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    /// The timer ID is invalid, has already fired, or was already stopped.
    #[error("Invalid or expired timer ID")]
    InvalidTimerId,
}

/// A specialized Result type for hotkey operations.
pub type Result<T> = std::result::Result<T, HotkeyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            HotkeyError::DuplicateId("save".into()).to_string(),
            "Hotkey 'save' is already registered"
        );
        assert_eq!(
            HotkeyError::from(TimerError::InvalidTimerId).to_string(),
            "Timer error: Invalid or expired timer ID"
        );
    }
}
