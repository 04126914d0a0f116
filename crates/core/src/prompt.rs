//! Turning a transcript into a chat prompt.
//!
//! Chat models take a system message followed by user and assistant turns
//! that strictly alternate, starting and ending with the user. From the
//! responder's point of view its own past messages are the assistant turns
//! and the other party's are the user turns.

use persona_chat_model::{ModelMessage, Role};

use crate::error::TurnOrderError;
use crate::persona::{Personas, Speaker};
use crate::transcript::Transcript;

/// Builds the prompt `responder` should answer.
///
/// When the transcript is empty, or it starts with the responder's own
/// message (equivalently, the transcript has an even length), the persona
/// opening is inserted as the first user turn. The transcript itself is
/// never modified.
///
/// # Errors
///
/// Fails with [`TurnOrderError::ResponderSpokeLast`] if the responder has
/// the last word already.
pub fn build_prompt(
    personas: &Personas,
    transcript: &Transcript,
    responder: Speaker,
) -> Result<Vec<ModelMessage>, TurnOrderError> {
    if transcript.last().is_some_and(|turn| turn.speaker == responder) {
        return Err(TurnOrderError::ResponderSpokeLast(responder));
    }

    let mut prompt = Vec::with_capacity(transcript.len() + 2);
    prompt.push(ModelMessage::System(
        personas.get(responder).system_prompt.clone(),
    ));

    let needs_opening = transcript
        .turns()
        .first()
        .is_none_or(|turn| turn.speaker == responder);
    if needs_opening {
        prompt.push(ModelMessage::User(personas.opening.clone()));
    }

    prompt.extend(transcript.turns().iter().map(|turn| {
        if turn.speaker == responder {
            ModelMessage::Assistant(turn.text.clone())
        } else {
            ModelMessage::User(turn.text.clone())
        }
    }));

    check_roles(&prompt)?;
    Ok(prompt)
}

/// Checks that `messages` is one system message followed by user and
/// assistant messages alternating, starting and ending with the user.
pub fn check_roles(messages: &[ModelMessage]) -> Result<(), TurnOrderError> {
    let malformed = |index| TurnOrderError::MalformedPrompt { index };

    match messages.first().map(ModelMessage::role) {
        Some(Role::System) => {}
        _ => return Err(malformed(0)),
    }

    let mut expected = Role::User;
    for (index, msg) in messages.iter().enumerate().skip(1) {
        if msg.role() != expected {
            return Err(malformed(index));
        }
        expected = match expected {
            Role::User => Role::Assistant,
            _ => Role::User,
        };
    }

    // The last message must be a user turn, which also rules out a prompt
    // with nothing after the system message.
    if expected != Role::Assistant {
        return Err(malformed(messages.len()));
    }
    Ok(())
}
