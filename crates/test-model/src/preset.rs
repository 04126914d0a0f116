use persona_chat_model::ModelFinishReason;
use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    /// The stream breaks off with a rate limit error at this point.
    #[serde(rename = "interrupted")]
    Interrupted,
}

/// The preset response for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// The finish reason reported after the last event.
    #[serde(default = "default_finish_reason")]
    pub finish_reason: ModelFinishReason,
    /// If set, the request will fail in the first `failure` attempts.
    /// `Some(0)` means the request will fail infinitely.
    #[serde(default)]
    pub failures: Option<u64>,
}

fn default_finish_reason() -> ModelFinishReason {
    ModelFinishReason::Stop
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            finish_reason: ModelFinishReason::Stop,
            failures: None,
        }
    }

    /// Creates a `PresetResponse` that streams `text` word by word.
    pub fn with_text(text: &str) -> Self {
        let mut events = Vec::new();
        let mut words = text.split(' ').peekable();
        while let Some(word) = words.next() {
            let mut delta = word.to_owned();
            if words.peek().is_some() {
                delta.push(' ');
            }
            events.push(PresetEvent::MessageDelta(delta));
        }
        Self::with_events(events)
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    /// Marks the response as cut off by the token limit.
    #[inline]
    pub fn truncated(mut self) -> Self {
        self.finish_reason = ModelFinishReason::Length;
        self
    }
}
