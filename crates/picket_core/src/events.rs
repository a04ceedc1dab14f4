//! Input event types delivered to widgets by the host

/// Key press/release state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyState {
    /// Key was pressed
    Pressed,
    /// Key was released
    Released,
}

/// Modifier key state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Shift key is held
    pub shift: bool,
    /// Control key is held
    pub ctrl: bool,
    /// Alt key is held (Option on macOS)
    pub alt: bool,
    /// Meta key is held (Command on macOS, Windows key on Windows)
    pub meta: bool,
}

impl Modifiers {
    /// Check if no modifiers are held
    pub fn is_empty(&self) -> bool {
        !self.shift && !self.ctrl && !self.alt && !self.meta
    }
}

/// Keys the toolkit reacts to; everything printable arrives as `Char`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Escape,
    Space,
    Tab,
    Backspace,
    Delete,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    Char(char),
}

/// Keyboard event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyboardEvent {
    /// The key that was pressed or released
    pub key: Key,
    /// Whether the key was pressed or released
    pub state: KeyState,
    /// Modifier keys held during this event
    pub modifiers: Modifiers,
}

impl KeyboardEvent {
    /// A key press without modifiers
    pub fn pressed(key: Key) -> Self {
        Self {
            key,
            state: KeyState::Pressed,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn is_pressed(&self) -> bool {
        self.state == KeyState::Pressed
    }
}

/// What a widget did with an event
///
/// `prevent_default` asks the host to skip its own default action, such as
/// submitting the surrounding form on Enter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventOutcome {
    pub handled: bool,
    pub prevent_default: bool,
}

impl EventOutcome {
    /// The widget did not react
    pub fn ignored() -> Self {
        Self::default()
    }

    /// The widget reacted; the host default still applies
    pub fn handled() -> Self {
        Self {
            handled: true,
            prevent_default: false,
        }
    }

    /// The widget reacted and the host default must be suppressed
    pub fn prevent_default() -> Self {
        Self {
            handled: true,
            prevent_default: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pressed_has_no_modifiers() {
        let ev = KeyboardEvent::pressed(Key::ArrowDown);
        assert!(ev.is_pressed());
        assert!(ev.modifiers.is_empty());
    }

    #[test]
    fn test_outcomes() {
        assert!(!EventOutcome::ignored().handled);
        assert!(EventOutcome::handled().handled);
        assert!(!EventOutcome::handled().prevent_default);
        assert!(EventOutcome::prevent_default().prevent_default);
    }
}
