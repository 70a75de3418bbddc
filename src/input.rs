//! Key bindings: normal and vim-style.

use crate::grid::Direction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SlideUp,
    SlideRight,
    SlideDown,
    SlideLeft,
    Pause,
    Restart,
    Confirm,
    Quit,
    None,
}

impl Action {
    /// The slide direction this action maps to, if any.
    pub fn slide_direction(self) -> Option<Direction> {
        match self {
            Self::SlideUp => Some(Direction::Top),
            Self::SlideRight => Some(Direction::Right),
            Self::SlideDown => Some(Direction::Bottom),
            Self::SlideLeft => Some(Direction::Left),
            _ => None,
        }
    }
}

/// Map key event to game action. Supports both normal (arrows, enter) and vim
/// (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Char('r') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') => Action::SlideLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::SlideRight,
        KeyCode::Up | KeyCode::Char('k') => Action::SlideUp,
        KeyCode::Down | KeyCode::Char('j') => Action::SlideDown,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Confirm,
        _ => Action::None,
    }
}
