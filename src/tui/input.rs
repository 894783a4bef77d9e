use std::time::Duration;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crate::shared::InputEvent;

const TEMPO_FINE: f64 = 1.0;
const TEMPO_COARSE: f64 = 10.0;
const VELOCITY_STEP: f32 = 0.05;

// poll for input from tui and resolve key presses into input events for the
// middle layer; key releases and repeats-as-release are ignored
pub fn poll_input(timeout: Duration) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    let mut events = Vec::new();
    // drain everything already queued so a burst of keys lands in one frame
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                events.extend(handle_key(key.code));
            }
        }
        if !event::poll(Duration::ZERO)? {
            break;
        }
    }
    Ok(events)
}

fn handle_key(code: KeyCode) -> Option<InputEvent> {
    let event = match code {
        KeyCode::Esc => InputEvent::Quit,
        KeyCode::Char(' ') => InputEvent::PlayPress,

        // grid cursor, arrows or vim keys
        KeyCode::Left | KeyCode::Char('h') => InputEvent::CursorLeft,
        KeyCode::Right | KeyCode::Char('l') => InputEvent::CursorRight,
        KeyCode::Up | KeyCode::Char('k') => InputEvent::CursorUp,
        KeyCode::Down | KeyCode::Char('j') => InputEvent::CursorDown,

        KeyCode::Enter => InputEvent::ToggleStep,
        KeyCode::Char('m') => InputEvent::ToggleMute,
        KeyCode::Char('c') => InputEvent::ClearPattern,

        // knobs: tempo on the brackets, shifted for big jumps; velocity on -/=
        KeyCode::Char('[') => InputEvent::NudgeTempo(-TEMPO_FINE),
        KeyCode::Char(']') => InputEvent::NudgeTempo(TEMPO_FINE),
        KeyCode::Char('{') => InputEvent::NudgeTempo(-TEMPO_COARSE),
        KeyCode::Char('}') => InputEvent::NudgeTempo(TEMPO_COARSE),
        KeyCode::Char('-') => InputEvent::NudgeVelocity(-VELOCITY_STEP),
        KeyCode::Char('=') => InputEvent::NudgeVelocity(VELOCITY_STEP),

        _ => return None,
    };
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_and_quit() {
        assert_eq!(handle_key(KeyCode::Char(' ')), Some(InputEvent::PlayPress));
        assert_eq!(handle_key(KeyCode::Esc), Some(InputEvent::Quit));
    }

    #[test]
    fn test_arrows_and_vim_keys_agree() {
        assert_eq!(handle_key(KeyCode::Left), handle_key(KeyCode::Char('h')));
        assert_eq!(handle_key(KeyCode::Right), handle_key(KeyCode::Char('l')));
        assert_eq!(handle_key(KeyCode::Up), handle_key(KeyCode::Char('k')));
        assert_eq!(handle_key(KeyCode::Down), handle_key(KeyCode::Char('j')));
        assert_eq!(handle_key(KeyCode::Down), Some(InputEvent::CursorDown));
    }

    #[test]
    fn test_knobs() {
        assert_eq!(handle_key(KeyCode::Char(']')), Some(InputEvent::NudgeTempo(1.0)));
        assert_eq!(handle_key(KeyCode::Char('{')), Some(InputEvent::NudgeTempo(-10.0)));
        assert_eq!(handle_key(KeyCode::Char('=')), Some(InputEvent::NudgeVelocity(0.05)));
        assert_eq!(handle_key(KeyCode::Char('-')), Some(InputEvent::NudgeVelocity(-0.05)));
    }

    #[test]
    fn test_unbound_keys() {
        assert_eq!(handle_key(KeyCode::Char('x')), None);
        assert_eq!(handle_key(KeyCode::Tab), None);
    }
}
