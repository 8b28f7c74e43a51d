//! Backend-neutral input events.
//!
//! Widgets in this crate consume [`InputEvent`] so that apps can drive them from any terminal
//! backend. With the `crossterm` feature enabled, [`crate::crossterm_input`] converts crossterm
//! events into this model.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl KeyModifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::default()
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }

    pub fn is_none(&self) -> bool {
        !self.shift && !self.ctrl && !self.alt
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCode {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Tab,
    BackTab,
    Esc,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::none(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: KeyModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Returns the typed character for plain (or shifted) character keys.
    ///
    /// Chords with `ctrl` or `alt` are commands, not text.
    pub fn text_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) if !self.modifiers.ctrl && !self.modifiers.alt => Some(c),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Paste(String),
    Mouse(MouseEvent),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseEventKind {
    Down(MouseButton),
    Drag(MouseButton),
    Up(MouseButton),
    Moved,
    ScrollUp,
    ScrollDown,
}

/// A mouse event in absolute terminal coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MouseEvent {
    pub x: u16,
    pub y: u16,
    pub kind: MouseEventKind,
    pub modifiers: KeyModifiers,
}

impl MouseEvent {
    pub fn new(x: u16, y: u16, kind: MouseEventKind) -> Self {
        Self {
            x,
            y,
            kind,
            modifiers: KeyModifiers::none(),
        }
    }

    pub fn left_down(x: u16, y: u16) -> Self {
        Self::new(x, y, MouseEventKind::Down(MouseButton::Left))
    }

    pub fn left_drag(x: u16, y: u16) -> Self {
        Self::new(x, y, MouseEventKind::Drag(MouseButton::Left))
    }

    pub fn left_up(x: u16, y: u16) -> Self {
        Self::new(x, y, MouseEventKind::Up(MouseButton::Left))
    }

    pub fn moved(x: u16, y: u16) -> Self {
        Self::new(x, y, MouseEventKind::Moved)
    }

    pub fn position(&self) -> (u16, u16) {
        (self.x, self.y)
    }
}
