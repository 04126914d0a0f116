mod builder;

use std::sync::Arc;

use persona_chat_model::{ModelFinishReason, ModelRequest, SamplingParams};

use crate::error::Error;
use crate::model_client::ModelClient;
use crate::persona::{Personas, Speaker};
use crate::prompt;
use crate::transcript::{Transcript, Turn};
pub use builder::DialogueBuilder;

type TurnStartFn = Box<dyn Fn(Speaker) + Send + Sync>;
type DeltaFn = Arc<dyn Fn(Speaker, &str) + Send + Sync>;
type TurnFn = Box<dyn Fn(&Turn) + Send + Sync>;

/// A conversation between two personas, both voiced by the same model.
///
/// Each turn re-derives the prompt from the transcript as seen by the
/// speaker whose turn it is, awaits the model's reply, and appends it.
/// Turns run strictly one after another.
pub struct Dialogue {
    model_client: ModelClient,
    personas: Personas,
    sampling: SamplingParams,
    first_speaker: Speaker,
    transcript: Transcript,

    on_turn_start: Option<TurnStartFn>,
    on_delta: Option<DeltaFn>,
    on_turn: Option<TurnFn>,
}

impl Dialogue {
    /// Returns everything said so far.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Consumes the dialogue, returning its transcript.
    #[inline]
    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    /// Returns who speaks next.
    #[inline]
    pub fn next_speaker(&self) -> Speaker {
        self.transcript.next_speaker(self.first_speaker)
    }

    /// Lets the next speaker reply and records the reply.
    ///
    /// The transcript is left untouched if this fails.
    pub async fn take_turn(&mut self) -> Result<&Turn, Error> {
        let speaker = self.next_speaker();
        let messages =
            prompt::build_prompt(&self.personas, &self.transcript, speaker)?;
        let request = ModelRequest {
            messages,
            sampling: self.sampling,
        };

        if let Some(on_turn_start) = &self.on_turn_start {
            on_turn_start(speaker);
        }
        let on_delta = self.on_delta.clone();
        let completion = self
            .model_client
            .send_request(request, move |delta| {
                if let Some(on_delta) = &on_delta {
                    on_delta(speaker, delta);
                }
            })
            .await
            .map_err(Error::Model)?;

        if completion.finish_reason == Some(ModelFinishReason::Length) {
            warn!("reply from {speaker} hit the token limit and is truncated");
        }

        let turn = Turn {
            speaker,
            text: completion.text.trim().to_owned(),
        };
        self.transcript.push(turn)?;

        let turn = &self.transcript.turns()[self.transcript.len() - 1];
        if let Some(on_turn) = &self.on_turn {
            on_turn(turn);
        }
        Ok(turn)
    }

    /// Runs one exchange: the first speaker, then the other.
    pub async fn run_round(&mut self) -> Result<(), Error> {
        self.take_turn().await?;
        self.take_turn().await?;
        Ok(())
    }

    /// Runs `rounds` exchanges.
    pub async fn run(&mut self, rounds: usize) -> Result<(), Error> {
        for round in 1..=rounds {
            debug!("starting round {round} of {rounds}");
            self.run_round().await?;
        }
        Ok(())
    }
}
