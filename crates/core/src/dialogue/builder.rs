use std::sync::Arc;

use persona_chat_model::{ModelProvider, SamplingParams};

use super::{DeltaFn, Dialogue, TurnFn, TurnStartFn};
use crate::model_client::ModelClient;
use crate::persona::{Personas, Speaker};
use crate::retry::RetryPolicy;
use crate::transcript::{Transcript, Turn};

/// [`Dialogue`] builder.
pub struct DialogueBuilder {
    model_client: ModelClient,
    personas: Personas,
    sampling: SamplingParams,
    retry_policy: Option<RetryPolicy>,
    first_speaker: Speaker,
    on_turn_start: Option<TurnStartFn>,
    on_delta: Option<DeltaFn>,
    on_turn: Option<TurnFn>,
}

impl DialogueBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            personas: Personas::default(),
            sampling: SamplingParams::default(),
            retry_policy: None,
            first_speaker: Speaker::A,
            on_turn_start: None,
            on_delta: None,
            on_turn: None,
        }
    }

    /// Sets the personas and the opening turn.
    #[inline]
    pub fn with_personas(mut self, personas: Personas) -> Self {
        self.personas = personas;
        self
    }

    /// Sets the sampling parameters used for every turn.
    #[inline]
    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    /// Retries transient model failures. Without a policy a failure ends
    /// the dialogue right away.
    #[inline]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Sets who speaks first, `Speaker::A` by default.
    #[inline]
    pub fn with_first_speaker(mut self, speaker: Speaker) -> Self {
        self.first_speaker = speaker;
        self
    }

    /// Attaches a callback to be invoked when a speaker starts replying.
    #[inline]
    pub fn on_turn_start(
        mut self,
        on_turn_start: impl Fn(Speaker) + Send + Sync + 'static,
    ) -> Self {
        self.on_turn_start = Some(Box::new(on_turn_start));
        self
    }

    /// Attaches a callback to be invoked for each streamed text delta.
    #[inline]
    pub fn on_delta(
        mut self,
        on_delta: impl Fn(Speaker, &str) + Send + Sync + 'static,
    ) -> Self {
        self.on_delta = Some(Arc::new(on_delta));
        self
    }

    /// Attaches a callback to be invoked when a turn has been recorded.
    #[inline]
    pub fn on_turn(
        mut self,
        on_turn: impl Fn(&Turn) + Send + Sync + 'static,
    ) -> Self {
        self.on_turn = Some(Box::new(on_turn));
        self
    }

    /// Builds the dialogue.
    #[inline]
    pub fn build(self) -> Dialogue {
        let DialogueBuilder {
            model_client,
            personas,
            sampling,
            retry_policy,
            first_speaker,
            on_turn_start,
            on_delta,
            on_turn,
        } = self;

        Dialogue {
            model_client: model_client.with_retry_policy(retry_policy),
            personas,
            sampling,
            first_speaker,
            transcript: Transcript::new(),
            on_turn_start,
            on_delta,
            on_turn,
        }
    }
}
