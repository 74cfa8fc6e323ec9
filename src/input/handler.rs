use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::game::Direction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Keyboard steering, used alongside or instead of gestures
    Move(Direction),
    TogglePause,
    ToggleWrap,
    Restart,
    Quit,
    None,
}

pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_key_event(&self, key: KeyEvent) -> KeyAction {
        // Handle Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }

        match key.code {
            // Movement - Arrow keys
            KeyCode::Up => KeyAction::Move(Direction::Up),
            KeyCode::Down => KeyAction::Move(Direction::Down),
            KeyCode::Left => KeyAction::Move(Direction::Left),
            KeyCode::Right => KeyAction::Move(Direction::Right),

            // Movement - WASD
            KeyCode::Char('w') | KeyCode::Char('W') => KeyAction::Move(Direction::Up),
            KeyCode::Char('s') | KeyCode::Char('S') => KeyAction::Move(Direction::Down),
            KeyCode::Char('a') | KeyCode::Char('A') => KeyAction::Move(Direction::Left),
            KeyCode::Char('d') | KeyCode::Char('D') => KeyAction::Move(Direction::Right),

            // Controls
            KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => {
                KeyAction::TogglePause
            }
            KeyCode::Char('m') | KeyCode::Char('M') => KeyAction::ToggleWrap,
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Restart,

            _ => KeyAction::None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
