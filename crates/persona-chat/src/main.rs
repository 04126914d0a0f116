//! Runs a dialogue between persona A and persona B against an
//! OpenAI-compatible chat-completion server, printing each turn.

#[macro_use]
extern crate tracing;

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use persona_chat::cli::Args;
use persona_chat::display;
use persona_chat_core::{DialogueBuilder, Speaker};
use persona_chat_openai_model::OpenAIProvider;

/// The spinner for the reply being generated, if any.
#[derive(Default)]
struct Typing {
    progress_bar: Option<ProgressBar>,
    streamed_chars: usize,
}

#[derive(Clone)]
struct TypingIndicator {
    state: Arc<Mutex<Typing>>,
    style: ProgressStyle,
}

impl TypingIndicator {
    fn new(style: ProgressStyle) -> Self {
        Self {
            state: Default::default(),
            style,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Typing> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start(&self, speaker: Speaker) {
        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(self.style.clone());
        progress_bar.set_message(display::typing_message(speaker, 0));
        progress_bar.enable_steady_tick(Duration::from_millis(100));

        let mut typing = self.lock();
        typing.progress_bar = Some(progress_bar);
        typing.streamed_chars = 0;
    }

    fn advance(&self, speaker: Speaker, delta: &str) {
        let mut typing = self.lock();
        typing.streamed_chars += delta.chars().count();
        let message = display::typing_message(speaker, typing.streamed_chars);
        if let Some(progress_bar) = &typing.progress_bar {
            progress_bar.set_message(message);
        }
    }

    fn finish(&self) {
        // Finish the progress bar before printing anything else.
        if let Some(progress_bar) = self.lock().progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let settings = args.into_settings()?;
    debug!("using provider {:?}", settings.openai);

    let style = ProgressStyle::with_template("{spinner} {wide_msg}")?
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let typing = TypingIndicator::new(style);
    let colored = io::stdout().is_terminal();

    let mut builder =
        DialogueBuilder::with_model_provider(OpenAIProvider::new(
            settings.openai,
        ))
        .with_personas(settings.personas)
        .with_sampling(settings.sampling)
        .with_first_speaker(settings.first_speaker)
        .on_turn_start({
            let typing = typing.clone();
            move |speaker| typing.start(speaker)
        })
        .on_delta({
            let typing = typing.clone();
            move |speaker, delta| typing.advance(speaker, delta)
        })
        .on_turn({
            let typing = typing.clone();
            move |turn| {
                typing.finish();
                let mut stdout = io::stdout().lock();
                if let Err(err) = display::write_turn(&mut stdout, turn, colored)
                {
                    error!("error writing turn: {err}");
                }
            }
        });
    if let Some(retry_policy) = settings.retry_policy {
        builder = builder.with_retry_policy(retry_policy);
    }
    let mut dialogue = builder.build();

    let result = dialogue.run(settings.rounds).await;
    typing.finish();
    result.with_context(|| {
        format!(
            "dialogue stopped after {} turns",
            dialogue.transcript().len()
        )
    })
}
