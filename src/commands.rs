//! Line commands typed during a game.

#[cfg(test)]
#[path = "commands_test.rs"]
mod commands_test;

pub const HELP: &str = "Type a column number to drop a token, `u` to undo your last move, `q` to quit.";

#[derive(Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Zero-based column.
    Drop(usize),
    Undo,
    Help,
    Quit,
    Unknown(String),
}

/// Parse one input line. Columns are typed 1-based.
#[must_use]
pub fn parse_command(line: &str) -> PlayerCommand {
    let word = line.trim().to_ascii_lowercase();
    match word.as_str() {
        "u" | "undo" => PlayerCommand::Undo,
        "q" | "quit" | "exit" => PlayerCommand::Quit,
        "" | "?" | "h" | "help" => PlayerCommand::Help,
        other => match other.parse::<usize>() {
            Ok(n) if n >= 1 => PlayerCommand::Drop(n - 1),
            _ => PlayerCommand::Unknown(other.to_owned()),
        },
    }
}
