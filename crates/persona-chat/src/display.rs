//! Console rendering of the dialogue.

use std::io::{self, Write};

use owo_colors::OwoColorize;
use persona_chat_core::{Speaker, Turn};

/// Printed after every turn.
pub const DIVIDER: &str = "==================================";

/// Writes a turn as `A: text`, followed by the divider between blank lines.
pub fn write_turn<W: Write>(
    out: &mut W,
    turn: &Turn,
    colored: bool,
) -> io::Result<()> {
    let label = format!("{}:", turn.speaker);
    if colored {
        match turn.speaker {
            Speaker::A => write!(out, "{}", label.bright_yellow().bold())?,
            Speaker::B => write!(out, "{}", label.bright_cyan().bold())?,
        }
    } else {
        out.write_all(label.as_bytes())?;
    }
    writeln!(out, " {}", turn.text)?;
    writeln!(out, "\n{DIVIDER}\n")?;
    out.flush()
}

/// The spinner message shown while `speaker` is replying.
pub fn typing_message(speaker: Speaker, streamed_chars: usize) -> String {
    if streamed_chars == 0 {
        format!("{speaker} is typing...")
    } else {
        format!("{speaker} is typing... ({streamed_chars} chars)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_turn() {
        let mut out = Vec::new();
        let turn = Turn {
            speaker: Speaker::A,
            text: "hey! you doing ok?".to_owned(),
        };
        write_turn(&mut out, &turn, false).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "A: hey! you doing ok?\n\n==================================\n\n"
        );
    }

    #[test]
    fn test_write_colored_turn() {
        let mut out = Vec::new();
        let turn = Turn {
            speaker: Speaker::B,
            text: "fine".to_owned(),
        };
        write_turn(&mut out, &turn, true).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("\x1b["));
        assert!(out.contains("B:"));
        assert!(out.ends_with(" fine\n\n==================================\n\n"));
    }

    #[test]
    fn test_typing_message() {
        assert_eq!(typing_message(Speaker::B, 0), "B is typing...");
        assert_eq!(typing_message(Speaker::A, 12), "A is typing... (12 chars)");
    }
}
