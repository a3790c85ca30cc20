//! Debounced detection of content changes.
//!
//! Keystrokes fall into three classes. Typing a run of the same class (a
//! word, a row of deletes) is coalesced; switching class flushes at once so
//! every word boundary and every switch between typing and deleting is
//! observable. A debounce timer, reset on every key-up, catches whatever is
//! left once typing stops, and losing focus flushes if that timer is still
//! pending.

/// A released key as far as change detection cares.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Delete,
    /// Navigation, modifiers and anything else that does not type.
    Other,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyClass {
    /// Space or Enter.
    SpaceLike,
    /// Backspace or Delete.
    DeleteLike,
    Other,
}

impl Key {
    pub fn class(self) -> KeyClass {
        match self {
            Key::Char(' ') | Key::Enter => KeyClass::SpaceLike,
            Key::Backspace | Key::Delete => KeyClass::DeleteLike,
            Key::Char(_) | Key::Other => KeyClass::Other,
        }
    }
}

/// Keystroke classification and the last notified value. Timers are owned
/// by the session; this only decides when a flush is due and whether a
/// flush has anything new to report.
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    last_class: Option<KeyClass>,
    trigger_next: bool,
    composing: bool,
    last_value: Option<String>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a known value so an unchanged flush reports nothing.
    pub fn with_value(value: String) -> Self {
        Self {
            last_value: Some(value),
            ..Self::default()
        }
    }

    /// Record a key-up and return whether a flush is due right now.
    pub fn key_up(&mut self, key: Key) -> bool {
        if self.composing {
            return false;
        }
        let class = key.class();
        let previous = self.last_class.replace(class);
        if previous == Some(class) {
            self.trigger_next = true;
            false
        } else {
            true
        }
    }

    pub fn composition_start(&mut self) {
        self.composing = true;
    }

    pub fn composition_end(&mut self) {
        self.composing = false;
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    /// Whether a run of same-class keystrokes is waiting for its flush.
    pub fn is_armed(&self) -> bool {
        self.trigger_next
    }

    /// Take a flushed value. Returns it back when it differs from the
    /// last one reported.
    pub fn flush(&mut self, value: String) -> Option<String> {
        self.trigger_next = false;
        self.composing = false;
        if self.last_value.as_deref() == Some(value.as_str()) {
            return None;
        }
        self.last_value = Some(value.clone());
        Some(value)
    }

    /// Forget the last value, e.g. when the content is replaced wholesale.
    pub fn reset_value(&mut self, value: String) {
        self.last_value = Some(value);
    }
}
