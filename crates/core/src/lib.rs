//! Core logic of the persona dialogue: turn bookkeeping, prompt building,
//! and the loop that lets two personas talk through one model.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod dialogue;
mod error;
mod model_client;
pub mod persona;
pub mod prompt;
mod retry;
pub mod transcript;

pub use dialogue::{Dialogue, DialogueBuilder};
pub use error::{Error, TurnOrderError};
pub use model_client::{Completion, ModelClient};
pub use persona::{Persona, Personas, Speaker};
pub use retry::RetryPolicy;
pub use transcript::{Transcript, Turn};
