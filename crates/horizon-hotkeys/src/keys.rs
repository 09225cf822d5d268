//! Physical keys, modifiers and key combinations.
//!
//! - [`Key`]: A physical key, named after web `KeyboardEvent.code` values
//! - [`KeyboardModifiers`]: The Shift/Ctrl/Alt/Meta flags held with a key
//! - [`KeyCombination`]: One key plus modifiers, with a canonical identity
//! - [`key_to_id`]: The canonical identity function
//!
//! # Identity
//!
//! Two combinations with the same key and the same set of held modifiers
//! always produce the same [`KeyCombinationId`], no matter how they were
//! built:
//!
//! ```
//! use horizon_hotkeys::{Key, KeyCombination, KeyboardModifiers};
//!
//! let a = KeyCombination::new(Key::K, KeyboardModifiers { shift: true, control: true, ..Default::default() });
//! let b: KeyCombination = "Shift+Ctrl+K".parse().unwrap();
//! assert_eq!(a.id(), b.id());
//! assert_eq!(a.id().as_str(), "ctrl+shift+KeyK");
//! ```

use std::fmt;
use std::str::FromStr;

/// Keyboard key codes.
///
/// This enum represents physical keys on a keyboard. Its [`code`](Self::code)
/// strings follow web `KeyboardEvent.code` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum Key {
    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Numbers (main keyboard)
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Function keys
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,

    // Navigation
    ArrowUp, ArrowDown, ArrowLeft, ArrowRight,
    Home, End, PageUp, PageDown,

    // Editing
    Backspace, Delete, Insert,
    Enter, Tab,

    // Whitespace
    Space,

    // Modifiers (also tracked via KeyboardModifiers, but useful as key events)
    ShiftLeft, ShiftRight,
    ControlLeft, ControlRight,
    AltLeft, AltRight,
    MetaLeft, MetaRight,

    // Punctuation and symbols
    Minus, Equal,
    BracketLeft, BracketRight, Backslash,
    Semicolon, Quote,
    Comma, Period, Slash,
    Backquote,

    // Control
    Escape,
    CapsLock, NumLock, ScrollLock,
    PrintScreen, Pause,

    // Numpad
    Numpad0, Numpad1, Numpad2, Numpad3, Numpad4,
    Numpad5, Numpad6, Numpad7, Numpad8, Numpad9,
    NumpadAdd, NumpadSubtract, NumpadMultiply, NumpadDivide,
    NumpadDecimal, NumpadEnter,

    // Media keys
    MediaPlayPause, MediaStop, MediaTrackNext, MediaTrackPrevious,
    AudioVolumeUp, AudioVolumeDown, AudioVolumeMute,

    // Unknown/unmapped key (raw platform scancode)
    Unknown(u16),
}

/// Every named key, in declaration order. Used for code lookups.
#[rustfmt::skip]
const NAMED_KEYS: &[Key] = &[
    Key::A, Key::B, Key::C, Key::D, Key::E, Key::F, Key::G, Key::H, Key::I,
    Key::J, Key::K, Key::L, Key::M, Key::N, Key::O, Key::P, Key::Q, Key::R,
    Key::S, Key::T, Key::U, Key::V, Key::W, Key::X, Key::Y, Key::Z,
    Key::Digit0, Key::Digit1, Key::Digit2, Key::Digit3, Key::Digit4,
    Key::Digit5, Key::Digit6, Key::Digit7, Key::Digit8, Key::Digit9,
    Key::F1, Key::F2, Key::F3, Key::F4, Key::F5, Key::F6,
    Key::F7, Key::F8, Key::F9, Key::F10, Key::F11, Key::F12,
    Key::ArrowUp, Key::ArrowDown, Key::ArrowLeft, Key::ArrowRight,
    Key::Home, Key::End, Key::PageUp, Key::PageDown,
    Key::Backspace, Key::Delete, Key::Insert, Key::Enter, Key::Tab, Key::Space,
    Key::ShiftLeft, Key::ShiftRight, Key::ControlLeft, Key::ControlRight,
    Key::AltLeft, Key::AltRight, Key::MetaLeft, Key::MetaRight,
    Key::Minus, Key::Equal, Key::BracketLeft, Key::BracketRight, Key::Backslash,
    Key::Semicolon, Key::Quote, Key::Comma, Key::Period, Key::Slash, Key::Backquote,
    Key::Escape, Key::CapsLock, Key::NumLock, Key::ScrollLock, Key::PrintScreen, Key::Pause,
    Key::Numpad0, Key::Numpad1, Key::Numpad2, Key::Numpad3, Key::Numpad4,
    Key::Numpad5, Key::Numpad6, Key::Numpad7, Key::Numpad8, Key::Numpad9,
    Key::NumpadAdd, Key::NumpadSubtract, Key::NumpadMultiply, Key::NumpadDivide,
    Key::NumpadDecimal, Key::NumpadEnter,
    Key::MediaPlayPause, Key::MediaStop, Key::MediaTrackNext, Key::MediaTrackPrevious,
    Key::AudioVolumeUp, Key::AudioVolumeDown, Key::AudioVolumeMute,
];

impl Key {
    /// The physical key code, e.g. `"KeyA"`, `"Digit1"`, `"ArrowUp"`.
    ///
    /// Returns `None` for [`Key::Unknown`], which has no named code.
    pub fn code(&self) -> Option<&'static str> {
        let code = match self {
            Key::A => "KeyA",
            Key::B => "KeyB",
            Key::C => "KeyC",
            Key::D => "KeyD",
            Key::E => "KeyE",
            Key::F => "KeyF",
            Key::G => "KeyG",
            Key::H => "KeyH",
            Key::I => "KeyI",
            Key::J => "KeyJ",
            Key::K => "KeyK",
            Key::L => "KeyL",
            Key::M => "KeyM",
            Key::N => "KeyN",
            Key::O => "KeyO",
            Key::P => "KeyP",
            Key::Q => "KeyQ",
            Key::R => "KeyR",
            Key::S => "KeyS",
            Key::T => "KeyT",
            Key::U => "KeyU",
            Key::V => "KeyV",
            Key::W => "KeyW",
            Key::X => "KeyX",
            Key::Y => "KeyY",
            Key::Z => "KeyZ",
            Key::Digit0 => "Digit0",
            Key::Digit1 => "Digit1",
            Key::Digit2 => "Digit2",
            Key::Digit3 => "Digit3",
            Key::Digit4 => "Digit4",
            Key::Digit5 => "Digit5",
            Key::Digit6 => "Digit6",
            Key::Digit7 => "Digit7",
            Key::Digit8 => "Digit8",
            Key::Digit9 => "Digit9",
            Key::F1 => "F1",
            Key::F2 => "F2",
            Key::F3 => "F3",
            Key::F4 => "F4",
            Key::F5 => "F5",
            Key::F6 => "F6",
            Key::F7 => "F7",
            Key::F8 => "F8",
            Key::F9 => "F9",
            Key::F10 => "F10",
            Key::F11 => "F11",
            Key::F12 => "F12",
            Key::ArrowUp => "ArrowUp",
            Key::ArrowDown => "ArrowDown",
            Key::ArrowLeft => "ArrowLeft",
            Key::ArrowRight => "ArrowRight",
            Key::Home => "Home",
            Key::End => "End",
            Key::PageUp => "PageUp",
            Key::PageDown => "PageDown",
            Key::Backspace => "Backspace",
            Key::Delete => "Delete",
            Key::Insert => "Insert",
            Key::Enter => "Enter",
            Key::Tab => "Tab",
            Key::Space => "Space",
            Key::ShiftLeft => "ShiftLeft",
            Key::ShiftRight => "ShiftRight",
            Key::ControlLeft => "ControlLeft",
            Key::ControlRight => "ControlRight",
            Key::AltLeft => "AltLeft",
            Key::AltRight => "AltRight",
            Key::MetaLeft => "MetaLeft",
            Key::MetaRight => "MetaRight",
            Key::Minus => "Minus",
            Key::Equal => "Equal",
            Key::BracketLeft => "BracketLeft",
            Key::BracketRight => "BracketRight",
            Key::Backslash => "Backslash",
            Key::Semicolon => "Semicolon",
            Key::Quote => "Quote",
            Key::Comma => "Comma",
            Key::Period => "Period",
            Key::Slash => "Slash",
            Key::Backquote => "Backquote",
            Key::Escape => "Escape",
            Key::CapsLock => "CapsLock",
            Key::NumLock => "NumLock",
            Key::ScrollLock => "ScrollLock",
            Key::PrintScreen => "PrintScreen",
            Key::Pause => "Pause",
            Key::Numpad0 => "Numpad0",
            Key::Numpad1 => "Numpad1",
            Key::Numpad2 => "Numpad2",
            Key::Numpad3 => "Numpad3",
            Key::Numpad4 => "Numpad4",
            Key::Numpad5 => "Numpad5",
            Key::Numpad6 => "Numpad6",
            Key::Numpad7 => "Numpad7",
            Key::Numpad8 => "Numpad8",
            Key::Numpad9 => "Numpad9",
            Key::NumpadAdd => "NumpadAdd",
            Key::NumpadSubtract => "NumpadSubtract",
            Key::NumpadMultiply => "NumpadMultiply",
            Key::NumpadDivide => "NumpadDivide",
            Key::NumpadDecimal => "NumpadDecimal",
            Key::NumpadEnter => "NumpadEnter",
            Key::MediaPlayPause => "MediaPlayPause",
            Key::MediaStop => "MediaStop",
            Key::MediaTrackNext => "MediaTrackNext",
            Key::MediaTrackPrevious => "MediaTrackPrevious",
            Key::AudioVolumeUp => "AudioVolumeUp",
            Key::AudioVolumeDown => "AudioVolumeDown",
            Key::AudioVolumeMute => "AudioVolumeMute",
            Key::Unknown(_) => return None,
        };
        Some(code)
    }

    /// Look up a key by its physical code (e.g. `"KeyA"`). Case-sensitive.
    pub fn from_code(code: &str) -> Option<Key> {
        NAMED_KEYS.iter().copied().find(|key| key.code() == Some(code))
    }

    /// A short human-readable label, e.g. `"A"`, `"1"`, `"Up"`.
    pub fn label(&self) -> String {
        match self {
            Key::ArrowUp => "Up".into(),
            Key::ArrowDown => "Down".into(),
            Key::ArrowLeft => "Left".into(),
            Key::ArrowRight => "Right".into(),
            Key::Minus => "-".into(),
            Key::Equal => "=".into(),
            Key::BracketLeft => "[".into(),
            Key::BracketRight => "]".into(),
            Key::Backslash => "\\".into(),
            Key::Semicolon => ";".into(),
            Key::Quote => "'".into(),
            Key::Comma => ",".into(),
            Key::Period => ".".into(),
            Key::Slash => "/".into(),
            Key::Backquote => "`".into(),
            Key::Unknown(scancode) => format!("Unknown({scancode})"),
            other => {
                let code = other.code().unwrap_or_default();
                code.strip_prefix("Key")
                    .or_else(|| code.strip_prefix("Digit"))
                    .unwrap_or(code)
                    .to_string()
            }
        }
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Key::ShiftLeft
                | Key::ShiftRight
                | Key::ControlLeft
                | Key::ControlRight
                | Key::AltLeft
                | Key::AltRight
                | Key::MetaLeft
                | Key::MetaRight
        )
    }
}

impl fmt::Display for Key {
    /// Formats the physical code; unknown keys format as `Unknown(<scancode>)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code(), self) {
            (Some(code), _) => f.write_str(code),
            (None, Key::Unknown(scancode)) => write!(f, "Unknown({scancode})"),
            (None, _) => f.write_str("Unknown"),
        }
    }
}

/// Keyboard modifiers that may be held during a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held.
    pub control: bool,
    /// The Alt key is held (Option on macOS).
    pub alt: bool,
    /// The Meta/Super key is held (Windows key, Cmd on macOS).
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Control modifier only.
    pub const CTRL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    /// Alt modifier only.
    pub const ALT: Self = Self {
        shift: false,
        control: false,
        alt: true,
        meta: false,
    };

    /// Meta modifier only.
    pub const META: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: true,
    };

    /// Control + Shift modifiers.
    pub const CTRL_SHIFT: Self = Self {
        shift: true,
        control: true,
        alt: false,
        meta: false,
    };

    /// Check if any modifier is pressed.
    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }

    /// Check if no modifiers are pressed.
    pub fn none(&self) -> bool {
        !self.any()
    }
}

/// The canonical identity of a [`KeyCombination`].
///
/// Formed from the held modifiers in the fixed order ctrl, alt, shift, meta,
/// followed by the physical key code, joined with `+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCombinationId(String);

impl KeyCombinationId {
    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyCombinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the canonical id for a key and a set of modifiers.
pub fn key_to_id(code: Key, modifiers: KeyboardModifiers) -> KeyCombinationId {
    let mut id = String::new();
    for (held, name) in [
        (modifiers.control, "ctrl"),
        (modifiers.alt, "alt"),
        (modifiers.shift, "shift"),
        (modifiers.meta, "meta"),
    ] {
        if held {
            id.push_str(name);
            id.push('+');
        }
    }
    id.push_str(&code.to_string());
    KeyCombinationId(id)
}

/// A single key combination (one physical key with modifiers).
///
/// Immutable once created; its [`id`](Self::id) is computed at construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyCombination {
    id: KeyCombinationId,
    code: Key,
    modifiers: KeyboardModifiers,
}

impl KeyCombination {
    /// Create a new key combination from a key and modifiers.
    pub fn new(code: Key, modifiers: KeyboardModifiers) -> Self {
        Self {
            id: key_to_id(code, modifiers),
            code,
            modifiers,
        }
    }

    /// Create a key combination with no modifiers.
    pub fn key_only(code: Key) -> Self {
        Self::new(code, KeyboardModifiers::NONE)
    }

    /// Create a Ctrl+key combination.
    pub fn ctrl(code: Key) -> Self {
        Self::new(code, KeyboardModifiers::CTRL)
    }

    /// Create an Alt+key combination.
    pub fn alt(code: Key) -> Self {
        Self::new(code, KeyboardModifiers::ALT)
    }

    /// Create a Shift+key combination.
    pub fn shift(code: Key) -> Self {
        Self::new(code, KeyboardModifiers::SHIFT)
    }

    /// Create a Meta+key combination.
    pub fn meta(code: Key) -> Self {
        Self::new(code, KeyboardModifiers::META)
    }

    /// Create a Ctrl+Shift+key combination.
    pub fn ctrl_shift(code: Key) -> Self {
        Self::new(code, KeyboardModifiers::CTRL_SHIFT)
    }

    pub fn id(&self) -> &KeyCombinationId {
        &self.id
    }

    pub fn code(&self) -> Key {
        self.code
    }

    pub fn modifiers(&self) -> KeyboardModifiers {
        self.modifiers
    }

    pub fn has_shift(&self) -> bool {
        self.modifiers.shift
    }

    pub fn has_ctrl(&self) -> bool {
        self.modifiers.control
    }

    pub fn has_alt(&self) -> bool {
        self.modifiers.alt
    }

    pub fn has_meta(&self) -> bool {
        self.modifiers.meta
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if self.modifiers.control {
            parts.push("Ctrl".to_string());
        }
        if self.modifiers.alt {
            parts.push("Alt".to_string());
        }
        if self.modifiers.shift {
            parts.push("Shift".to_string());
        }
        if self.modifiers.meta {
            parts.push("Meta".to_string());
        }

        parts.push(self.code.label());

        write!(f, "{}", parts.join("+"))
    }
}

/// Error type for parsing key combinations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    /// The string is empty.
    #[error("empty key combination")]
    Empty,
    /// No key was specified (only modifiers).
    #[error("no key specified (only modifiers)")]
    NoKey,
    /// Unknown key name.
    #[error("unknown key: {0}")]
    UnknownKey(String),
    /// More than one non-modifier key was given.
    #[error("more than one key in combination: {0}")]
    MultipleKeys(String),
}

impl FromStr for KeyCombination {
    type Err = KeyParseError;

    /// Parse a key combination from a string like `"Ctrl+Shift+K"`.
    ///
    /// - Modifiers: `Ctrl`/`Control`, `Alt`/`Option`, `Shift`,
    ///   `Meta`/`Cmd`/`Command`/`Super`/`Win`, case-insensitive
    /// - Keys: labels (`A`, `1`, `F5`, `Up`, `Esc`, `-`) or physical codes
    ///   (`KeyA`, `Digit1`, `ArrowUp`)
    /// - A literal plus key is written `Ctrl+Plus` or as a trailing `+`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(KeyParseError::Empty);
        }

        let mut modifiers = KeyboardModifiers::NONE;
        let mut key: Option<Key> = None;

        let (body, trailing_plus) = match s.strip_suffix("++") {
            Some(rest) => (rest, true),
            None if s == "+" => ("", true),
            None => (s, false),
        };

        let parts = body.split('+').filter(|p| !p.trim().is_empty());
        for part in parts {
            let part = part.trim();
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers.control = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "meta" | "cmd" | "command" | "win" | "windows" | "super" => modifiers.meta = true,
                _ => {
                    if key.is_some() {
                        return Err(KeyParseError::MultipleKeys(s.to_string()));
                    }
                    key = Some(parse_key(part)?);
                }
            }
        }

        if trailing_plus {
            if key.is_some() {
                return Err(KeyParseError::MultipleKeys(s.to_string()));
            }
            key = Some(Key::Equal);
        }

        match key {
            Some(k) => Ok(KeyCombination::new(k, modifiers)),
            None => Err(KeyParseError::NoKey),
        }
    }
}

/// Parse a key name (label, alias or physical code) to a [`Key`].
fn parse_key(s: &str) -> Result<Key, KeyParseError> {
    if let Some(key) = Key::from_code(s) {
        return Ok(key);
    }

    // Single character keys
    let mut chars = s.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        let ch = ch.to_ascii_uppercase();
        if ch.is_ascii_uppercase() {
            return Key::from_code(&format!("Key{ch}"))
                .ok_or_else(|| KeyParseError::UnknownKey(s.to_string()));
        }
        if ch.is_ascii_digit() {
            return Key::from_code(&format!("Digit{ch}"))
                .ok_or_else(|| KeyParseError::UnknownKey(s.to_string()));
        }
    }

    let s_lower = s.to_lowercase();
    if let Some(n) = s_lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        if (1..=12).contains(&n) {
            return Key::from_code(&format!("F{n}"))
                .ok_or_else(|| KeyParseError::UnknownKey(s.to_string()));
        }
    }

    match s_lower.as_str() {
        // Navigation
        "up" | "arrowup" => Ok(Key::ArrowUp),
        "down" | "arrowdown" => Ok(Key::ArrowDown),
        "left" | "arrowleft" => Ok(Key::ArrowLeft),
        "right" | "arrowright" => Ok(Key::ArrowRight),
        "home" => Ok(Key::Home),
        "end" => Ok(Key::End),
        "pageup" | "pgup" => Ok(Key::PageUp),
        "pagedown" | "pgdn" => Ok(Key::PageDown),

        // Editing
        "backspace" | "back" => Ok(Key::Backspace),
        "delete" | "del" => Ok(Key::Delete),
        "insert" | "ins" => Ok(Key::Insert),
        "enter" | "return" => Ok(Key::Enter),
        "tab" => Ok(Key::Tab),
        "space" | "spacebar" => Ok(Key::Space),
        "escape" | "esc" => Ok(Key::Escape),

        // Punctuation
        "minus" | "-" => Ok(Key::Minus),
        "equal" | "equals" | "plus" | "=" => Ok(Key::Equal),
        "bracketleft" | "[" => Ok(Key::BracketLeft),
        "bracketright" | "]" => Ok(Key::BracketRight),
        "backslash" | "\\" => Ok(Key::Backslash),
        "semicolon" | ";" => Ok(Key::Semicolon),
        "quote" | "'" => Ok(Key::Quote),
        "comma" | "," => Ok(Key::Comma),
        "period" | "." => Ok(Key::Period),
        "slash" | "/" => Ok(Key::Slash),
        "grave" | "backquote" | "`" => Ok(Key::Backquote),

        _ => Err(KeyParseError::UnknownKey(s.to_string())),
    }
}
