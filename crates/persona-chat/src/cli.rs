//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use persona_chat_core::{Personas, RetryPolicy, Speaker};
use persona_chat_model::SamplingParams;
use persona_chat_openai_model::{OpenAIConfig, OpenAIConfigBuilder};

use crate::config::{self, ConfigError};

/// Two personas text each other, both voiced by one chat model.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Base URL of the OpenAI-compatible server
    #[arg(
        long,
        env = "OPENAI_BASE_URL",
        default_value = "http://localhost:8080/v1"
    )]
    pub base_url: String,

    /// Model name sent with each request
    #[arg(long, env = "OPENAI_MODEL", default_value = "llama-2-7b-chat")]
    pub model: String,

    /// API key, if the server requires one
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Sampling temperature, 0 is greedy
    #[arg(long, default_value_t = 0.8)]
    pub temperature: f32,

    /// Nucleus sampling probability mass, in (0, 1]
    #[arg(long, default_value_t = 0.9)]
    pub top_p: f32,

    /// Maximum number of tokens per reply
    #[arg(long)]
    pub max_gen_len: Option<u32>,

    /// Number of A/B exchanges
    #[arg(long, default_value_t = 5)]
    pub rounds: usize,

    /// Who opens the dialogue
    #[arg(long, value_enum, default_value_t = FirstSpeaker::A)]
    pub first_speaker: FirstSpeaker,

    /// TOML file overriding the personas and the opening turn
    #[arg(long)]
    pub personas: Option<PathBuf>,

    /// Seconds to keep retrying a rate-limited or unavailable server, 0
    /// disables retries
    #[arg(long, default_value_t = 30)]
    pub retry_timeout: u64,
}

/// Command-line spelling of [`Speaker`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FirstSpeaker {
    /// Persona A.
    A,
    /// Persona B.
    B,
}

impl From<FirstSpeaker> for Speaker {
    #[inline]
    fn from(value: FirstSpeaker) -> Self {
        match value {
            FirstSpeaker::A => Speaker::A,
            FirstSpeaker::B => Speaker::B,
        }
    }
}

/// Everything needed to run a dialogue, checked and resolved.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Provider configuration.
    pub openai: OpenAIConfig,
    /// Who says what.
    pub personas: Personas,
    /// Sampling parameters for every turn.
    pub sampling: SamplingParams,
    /// `None` disables retries.
    pub retry_policy: Option<RetryPolicy>,
    /// Who opens the dialogue.
    pub first_speaker: Speaker,
    /// Number of exchanges.
    pub rounds: usize,
}

impl Args {
    /// Validates the arguments and loads the persona file, if any.
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let sampling = self.sampling()?;
        let personas = match &self.personas {
            Some(path) => config::load_personas(path)?,
            None => Personas::default(),
        };
        let retry_policy = (self.retry_timeout > 0).then(|| {
            RetryPolicy::with_max_elapsed_time(Duration::from_secs(
                self.retry_timeout,
            ))
        });

        let builder = match self.api_key {
            Some(api_key) => OpenAIConfigBuilder::with_api_key(api_key),
            None => OpenAIConfigBuilder::without_api_key(),
        };
        let openai = builder
            .with_base_url(self.base_url)
            .with_model(self.model)
            .build();

        Ok(Settings {
            openai,
            personas,
            sampling,
            retry_policy,
            first_speaker: self.first_speaker.into(),
            rounds: self.rounds,
        })
    }

    fn sampling(&self) -> Result<SamplingParams, ConfigError> {
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(ConfigError::InvalidSampling(format!(
                "temperature must be a non-negative number, got {}",
                self.temperature
            )));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(ConfigError::InvalidSampling(format!(
                "top-p must be in (0, 1], got {}",
                self.top_p
            )));
        }
        if self.max_gen_len == Some(0) {
            return Err(ConfigError::InvalidSampling(
                "max-gen-len must be positive".to_owned(),
            ));
        }
        Ok(SamplingParams {
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_gen_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["persona-chat", "--base-url", "http://gpu:8000/v1"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = parse(&[]).into_settings().unwrap();
        assert_eq!(settings.sampling, SamplingParams::default());
        assert_eq!(settings.rounds, 5);
        assert_eq!(settings.first_speaker, Speaker::A);
        assert_eq!(settings.personas, Personas::default());
        assert_eq!(
            settings.retry_policy.map(|p| p.max_elapsed_time),
            Some(Duration::from_secs(30))
        );
        assert_eq!(settings.openai.base_url(), "http://gpu:8000/v1");
    }

    #[test]
    fn test_overrides() {
        let settings = parse(&[
            "--model",
            "mistral-7b-instruct",
            "--temperature",
            "0.2",
            "--top-p",
            "0.5",
            "--max-gen-len",
            "128",
            "--rounds",
            "2",
            "--first-speaker",
            "b",
            "--retry-timeout",
            "0",
        ])
        .into_settings()
        .unwrap();
        assert_eq!(settings.openai.model(), "mistral-7b-instruct");
        assert_eq!(
            settings.sampling,
            SamplingParams {
                temperature: 0.2,
                top_p: 0.5,
                max_tokens: Some(128),
            }
        );
        assert_eq!(settings.rounds, 2);
        assert_eq!(settings.first_speaker, Speaker::B);
        assert_eq!(settings.retry_policy, None);
    }

    #[test]
    fn test_invalid_sampling() {
        for extra in [
            &["--temperature=-1"][..],
            &["--top-p", "0"][..],
            &["--top-p", "1.5"][..],
            &["--max-gen-len", "0"][..],
        ] {
            let err = parse(extra).into_settings().unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidSampling(_)),
                "{extra:?}"
            );
        }
    }

    #[test]
    fn test_rejects_unknown_speaker() {
        assert!(
            Args::try_parse_from(["persona-chat", "--first-speaker", "c"])
                .is_err()
        );
    }
}
