//! The record of what has been said.

use serde::{Deserialize, Serialize};

use crate::error::TurnOrderError;
use crate::persona::Speaker;

/// One message of the dialogue.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Turn {
    /// Who said it.
    pub speaker: Speaker,
    /// What was said.
    pub text: String,
}

/// An append-only log of turns.
///
/// Turns can only be added to the end, and consecutive turns always come
/// from different speakers. Prompts are derived from the transcript
/// without modifying it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all turns, oldest first.
    #[inline]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the number of turns, which also serves as the version of
    /// the log.
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if nobody has spoken yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the most recent turn.
    #[inline]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Returns who speaks next, given who opened the dialogue.
    #[inline]
    pub fn next_speaker(&self, first: Speaker) -> Speaker {
        self.last().map_or(first, |turn| turn.speaker.other())
    }

    /// Appends a turn to the end of the log.
    pub fn push(&mut self, turn: Turn) -> Result<(), TurnOrderError> {
        if let Some(last) = self.last() {
            if last.speaker == turn.speaker {
                return Err(TurnOrderError::SameSpeakerTwice(turn.speaker));
            }
        }
        self.turns.push(turn);
        Ok(())
    }
}

impl IntoIterator for Transcript {
    type Item = Turn;
    type IntoIter = std::vec::IntoIter<Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(speaker: Speaker, text: &str) -> Turn {
        Turn {
            speaker,
            text: text.to_owned(),
        }
    }

    #[test]
    fn test_push_alternating() {
        let mut transcript = Transcript::new();
        assert_eq!(transcript.next_speaker(Speaker::A), Speaker::A);

        transcript.push(turn(Speaker::A, "hey")).unwrap();
        assert_eq!(transcript.next_speaker(Speaker::A), Speaker::B);
        transcript.push(turn(Speaker::B, "hi")).unwrap();
        assert_eq!(transcript.next_speaker(Speaker::A), Speaker::A);
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn test_reject_same_speaker() {
        let mut transcript = Transcript::new();
        transcript.push(turn(Speaker::B, "hello")).unwrap();
        assert_eq!(
            transcript.push(turn(Speaker::B, "again")),
            Err(TurnOrderError::SameSpeakerTwice(Speaker::B))
        );
        assert_eq!(transcript.turns(), &[turn(Speaker::B, "hello")]);
    }
}
