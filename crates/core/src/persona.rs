//! The two parties of the dialogue and the instructions they follow.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// One side of the dialogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    /// Persona A.
    A,
    /// Persona B.
    B,
}

impl Speaker {
    /// Returns the other side of the dialogue.
    #[inline]
    pub fn other(self) -> Self {
        match self {
            Speaker::A => Speaker::B,
            Speaker::B => Speaker::A,
        }
    }

    /// Returns the label printed in front of this speaker's messages.
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Speaker::A => "A",
            Speaker::B => "B",
        }
    }
}

impl Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The system instructions for one speaker.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Persona {
    /// Sent as the system message of every prompt this persona answers.
    pub system_prompt: String,
}

impl Persona {
    /// Creates a persona from its system prompt.
    #[inline]
    pub fn new<S: Into<String>>(system_prompt: S) -> Self {
        Self {
            system_prompt: system_prompt.into(),
        }
    }
}

/// Both personas, plus the filler turn that opens a prompt.
///
/// Chat models expect the first turn after the system message to come from
/// the user. The dialogue has no such turn for whoever speaks first, so
/// `opening` stands in for it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Personas {
    /// Persona A, who opens the dialogue by default.
    pub a: Persona,
    /// Persona B.
    pub b: Persona,
    /// The user turn placed in front of the first speaker's own messages.
    pub opening: String,
}

impl Personas {
    /// Returns the persona speaking as `speaker`.
    #[inline]
    pub fn get(&self, speaker: Speaker) -> &Persona {
        match speaker {
            Speaker::A => &self.a,
            Speaker::B => &self.b,
        }
    }
}

impl Default for Personas {
    fn default() -> Self {
        Self {
            a: Persona::new(
                "You are a human text chatting your coworker and trying to \
                 deceive your coworker about buying a new gadget. send short \
                 messages",
            ),
            b: Persona::new(
                "You are a human. response to the text messages that your \
                 coworker is sending you. send short messages",
            ),
            opening: "start by asking how they are doing".to_owned(),
        }
    }
}
