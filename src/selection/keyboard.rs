//! Key grammar for grid navigation.

use crate::types::KeyInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    Up,
    Down,
    Left,
    Right,
    /// First column of the current row
    LineStart,
    /// Last column of the current row
    LineEnd,
    FirstRow,
    LastRow,
    SelectAll,
    Clear,
}

impl NavCommand {
    pub fn is_movement(self) -> bool {
        !matches!(self, NavCommand::SelectAll | NavCommand::Clear)
    }
}

/// A parsed key press. `extend` is set for Shift+movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCommand {
    pub command: NavCommand,
    pub extend: bool,
}

/// Map a normalized key press to a navigation command; `None` for keys the
/// grid does not handle.
pub fn parse_key(input: &KeyInput) -> Option<KeyCommand> {
    let ctrl = input.ctrl_or_cmd;
    let command = match input.key.as_str() {
        "ArrowUp" | "Up" => NavCommand::Up,
        "ArrowDown" | "Down" => NavCommand::Down,
        "ArrowLeft" | "Left" => NavCommand::Left,
        "ArrowRight" | "Right" => NavCommand::Right,
        "Home" if ctrl => NavCommand::FirstRow,
        "Home" => NavCommand::LineStart,
        "End" if ctrl => NavCommand::LastRow,
        "End" => NavCommand::LineEnd,
        "a" | "A" if ctrl => NavCommand::SelectAll,
        "Escape" | "Esc" => NavCommand::Clear,
        _ => return None,
    };
    Some(KeyCommand {
        command,
        extend: input.shift && command.is_movement(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(KeyInput::new("ArrowDown"), NavCommand::Down, false ; "arrow")]
    #[test_case(KeyInput::new("ArrowLeft").shift(), NavCommand::Left, true ; "shift arrow extends")]
    #[test_case(KeyInput::new("Home"), NavCommand::LineStart, false ; "home")]
    #[test_case(KeyInput::new("Home").ctrl(), NavCommand::FirstRow, false ; "ctrl home")]
    #[test_case(KeyInput::new("End").ctrl().shift(), NavCommand::LastRow, true ; "ctrl shift end")]
    #[test_case(KeyInput::new("a").ctrl(), NavCommand::SelectAll, false ; "ctrl a")]
    #[test_case(KeyInput::new("Escape").shift(), NavCommand::Clear, false ; "escape ignores shift")]
    fn parses(input: KeyInput, command: NavCommand, extend: bool) {
        assert_eq!(parse_key(&input), Some(KeyCommand { command, extend }));
    }

    #[test]
    fn ignores_unhandled_keys() {
        assert_eq!(parse_key(&KeyInput::new("a")), None);
        assert_eq!(parse_key(&KeyInput::new("Tab")), None);
    }
}
