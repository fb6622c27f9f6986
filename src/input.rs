use crate::snake::Direction;

/// Key codes the host hands to the core. Hosts translate their platform
/// events into these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Turn(Direction),
    Confirm,
    None,
}

/// Maps arrow keys and WASD to turns, Enter/Return to confirm.
pub fn route(key: Key) -> Command {
    match key {
        Key::Up | Key::Char('w') | Key::Char('W') => Command::Turn(Direction::Up),
        Key::Down | Key::Char('s') | Key::Char('S') => Command::Turn(Direction::Down),
        Key::Left | Key::Char('a') | Key::Char('A') => Command::Turn(Direction::Left),
        Key::Right | Key::Char('d') | Key::Char('D') => Command::Turn(Direction::Right),
        Key::Enter | Key::Char('\r') | Key::Char('\n') => Command::Confirm,
        _ => Command::None,
    }
}
