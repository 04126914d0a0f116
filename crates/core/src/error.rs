use std::error::Error as StdError;
use std::fmt::{self, Display};

use persona_chat_model::{ErrorKind, ModelProviderError};

use crate::persona::Speaker;

/// A turn sequence that cannot become a valid prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TurnOrderError {
    /// The same speaker was about to take two turns in a row.
    SameSpeakerTwice(Speaker),
    /// The responder spoke last, so there is nothing to reply to.
    ResponderSpokeLast(Speaker),
    /// The prompt breaks the system, user, assistant, ..., user layout at
    /// `index`.
    MalformedPrompt {
        /// Position of the first offending message.
        index: usize,
    },
}

impl Display for TurnOrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnOrderError::SameSpeakerTwice(speaker) => {
                write!(f, "{speaker} cannot take two turns in a row")
            }
            TurnOrderError::ResponderSpokeLast(speaker) => {
                write!(f, "{speaker} spoke last and has nothing to reply to")
            }
            TurnOrderError::MalformedPrompt { index } => {
                write!(f, "prompt roles do not alternate at message {index}")
            }
        }
    }
}

impl StdError for TurnOrderError {}

/// Error type for running a dialogue.
#[derive(Debug)]
pub enum Error {
    /// The transcript could not be turned into a prompt.
    TurnOrder(TurnOrderError),
    /// The model provider failed.
    Model(Box<dyn ModelProviderError>),
}

impl Error {
    /// Returns the provider error kind, if the model failed.
    #[inline]
    pub fn model_error_kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Model(err) => Some(err.kind()),
            Error::TurnOrder(_) => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TurnOrder(err) => write!(f, "invalid turn order: {err}"),
            Error::Model(err) => write!(f, "model request failed: {err}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::TurnOrder(err) => Some(err),
            Error::Model(err) => Some(err.as_ref()),
        }
    }
}

impl From<TurnOrderError> for Error {
    #[inline]
    fn from(err: TurnOrderError) -> Self {
        Error::TurnOrder(err)
    }
}
