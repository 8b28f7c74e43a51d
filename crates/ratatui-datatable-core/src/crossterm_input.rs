use crate::input::InputEvent;
use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::input::KeyModifiers;
use crate::input::MouseButton;
use crate::input::MouseEvent;
use crate::input::MouseEventKind;

/// Converts a crossterm event into an [`InputEvent`].
///
/// Key releases/repeats, focus changes and resize events return `None`; apps handle terminal
/// resizes by simply re-rendering.
pub fn input_event_from_crossterm(ev: crossterm::event::Event) -> Option<InputEvent> {
    match ev {
        crossterm::event::Event::Key(key) => {
            if key.kind != crossterm::event::KeyEventKind::Press {
                return None;
            }
            Some(InputEvent::Key(key_event_from_crossterm(key)?))
        }
        crossterm::event::Event::Paste(s) => Some(InputEvent::Paste(s)),
        crossterm::event::Event::Mouse(m) => {
            Some(InputEvent::Mouse(mouse_event_from_crossterm(m)?))
        }
        _ => None,
    }
}

pub fn key_event_from_crossterm(key: crossterm::event::KeyEvent) -> Option<KeyEvent> {
    use crossterm::event::KeyCode as C;

    let code = match key.code {
        C::Char(c) => KeyCode::Char(c),
        C::Enter => KeyCode::Enter,
        C::Backspace => KeyCode::Backspace,
        C::Delete => KeyCode::Delete,
        C::Tab => KeyCode::Tab,
        C::BackTab => KeyCode::BackTab,
        C::Esc => KeyCode::Esc,
        C::Left => KeyCode::Left,
        C::Right => KeyCode::Right,
        C::Up => KeyCode::Up,
        C::Down => KeyCode::Down,
        C::Home => KeyCode::Home,
        C::End => KeyCode::End,
        C::PageUp => KeyCode::PageUp,
        C::PageDown => KeyCode::PageDown,
        _ => return None,
    };

    let mut modifiers = modifiers_from_crossterm(key.modifiers);
    // Terminals report BackTab together with SHIFT; the code already carries it.
    if code == KeyCode::BackTab {
        modifiers.shift = false;
    }

    Some(KeyEvent { code, modifiers })
}

pub fn mouse_event_from_crossterm(m: crossterm::event::MouseEvent) -> Option<MouseEvent> {
    use crossterm::event::MouseEventKind as K;

    let kind = match m.kind {
        K::Down(b) => MouseEventKind::Down(mouse_button_from_crossterm(b)),
        K::Drag(b) => MouseEventKind::Drag(mouse_button_from_crossterm(b)),
        K::Up(b) => MouseEventKind::Up(mouse_button_from_crossterm(b)),
        K::Moved => MouseEventKind::Moved,
        K::ScrollUp => MouseEventKind::ScrollUp,
        K::ScrollDown => MouseEventKind::ScrollDown,
        _ => return None,
    };

    Some(MouseEvent {
        x: m.column,
        y: m.row,
        kind,
        modifiers: modifiers_from_crossterm(m.modifiers),
    })
}

fn modifiers_from_crossterm(m: crossterm::event::KeyModifiers) -> KeyModifiers {
    KeyModifiers {
        shift: m.contains(crossterm::event::KeyModifiers::SHIFT),
        ctrl: m.contains(crossterm::event::KeyModifiers::CONTROL),
        alt: m.contains(crossterm::event::KeyModifiers::ALT),
    }
}

fn mouse_button_from_crossterm(b: crossterm::event::MouseButton) -> MouseButton {
    match b {
        crossterm::event::MouseButton::Left => MouseButton::Left,
        crossterm::event::MouseButton::Right => MouseButton::Right,
        crossterm::event::MouseButton::Middle => MouseButton::Middle,
    }
}
