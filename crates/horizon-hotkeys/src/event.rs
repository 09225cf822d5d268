//! Keyboard events delivered by the host.
//!
//! The engine consumes native key press/release events as [`KeyboardEvent`]
//! values. Each event carries the physical key, the held modifiers and,
//! when the host knows it, the [`EventTarget`] that had focus. Whether a
//! target counts as a text-entry field is decided by an
//! [`InputFieldDetector`] supplied by the host.

use crate::keys::{Key, KeyCombinationId, KeyboardModifiers, key_to_id};

/// The element that had keyboard focus when an event was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTarget {
    tag_name: String,
    content_editable: bool,
}

impl EventTarget {
    /// Create a target with the given element tag name (e.g. `"INPUT"`).
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            content_editable: false,
        }
    }

    /// Builder pattern for the content-editable flag.
    pub fn with_content_editable(mut self, content_editable: bool) -> Self {
        self.content_editable = content_editable;
        self
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn is_content_editable(&self) -> bool {
        self.content_editable
    }
}

/// Decides whether an event target accepts text input.
///
/// Any `Fn(&EventTarget) -> bool` closure can be used as a detector.
pub trait InputFieldDetector: Send + Sync {
    /// Return `true` if typing into `target` should not trigger hotkeys.
    fn is_input_field(&self, target: &EventTarget) -> bool;
}

impl<F> InputFieldDetector for F
where
    F: Fn(&EventTarget) -> bool + Send + Sync,
{
    fn is_input_field(&self, target: &EventTarget) -> bool {
        self(target)
    }
}

/// The default detector.
///
/// Treats `INPUT`, `TEXTAREA` and `SELECT` elements (case-insensitive) and
/// any content-editable element as input fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagNameDetector;

impl InputFieldDetector for TagNameDetector {
    fn is_input_field(&self, target: &EventTarget) -> bool {
        if target.is_content_editable() {
            return true;
        }
        ["INPUT", "TEXTAREA", "SELECT"]
            .iter()
            .any(|tag| target.tag_name().eq_ignore_ascii_case(tag))
    }
}

/// A key press or release event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardEvent {
    /// The physical key.
    pub code: Key,
    /// Keyboard modifiers held during the event.
    pub modifiers: KeyboardModifiers,
    /// The focused element, if the host could resolve it.
    pub target: Option<EventTarget>,
    /// Whether this is an OS auto-repeat event (key held down).
    pub is_repeat: bool,
}

impl KeyboardEvent {
    /// Create a new event with no target.
    pub fn new(code: Key, modifiers: KeyboardModifiers) -> Self {
        Self {
            code,
            modifiers,
            target: None,
            is_repeat: false,
        }
    }

    /// Builder pattern for the focused target.
    pub fn with_target(mut self, target: EventTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Builder pattern for the auto-repeat flag.
    pub fn with_repeat(mut self, is_repeat: bool) -> Self {
        self.is_repeat = is_repeat;
        self
    }

    /// The canonical id of the pressed combination.
    pub fn key_combination_id(&self) -> KeyCombinationId {
        key_to_id(self.code, self.modifiers)
    }
}
