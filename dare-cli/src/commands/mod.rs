//! Command implementations for dare
//!
//! Both modes end the same way: a [`Job`] goes to the model, the reply is
//! echoed and extracted, the script is saved, then optionally run.

use std::io;

use anyhow::{Context, Result};
use dare_core::Settings;
use dare_llm::{OpenAiModel, PromptRequest};
use dare_script::{save_artifact, Runner};
use tracing::info;

pub mod fix;
pub mod generate;
mod pipeline;

pub use fix::prepare_fix;
pub use generate::prepare_generate;

use crate::ui::{self, DisplaySink};

/// A system prompt plus user message, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub system: String,
    pub prompt: String,
}

/// What to do once the script is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterSave {
    /// Confirm interactively (prints the command when stdin is not a terminal)
    Ask,
    Run,
    Skip,
}

/// Send the job, save the extracted script, then run or print the command.
pub async fn run_job(settings: &Settings, job: Job, after: AfterSave) -> Result<()> {
    // Runner and key problems should surface before any tokens are spent
    let runner = Runner::parse(&settings.runner)?;
    let model = OpenAiModel::from_env(&settings.api_base, &settings.model)
        .context("Cannot reach the model (set OPENAI_API_KEY, e.g. in a .env file)")?;

    let request = PromptRequest {
        system: job.system,
        prompt: job.prompt,
        stream: !settings.no_stream,
        max_tokens: settings.max_tokens,
    };
    info!(model = %model.model(), stream = request.stream, "requesting script");

    let stdout = io::stdout();
    let mut display = DisplaySink::new(
        stdout.lock(),
        ui::spinner(format!("Waiting for {}...", model.model())),
    );
    let artifact = pipeline::generate_artifact(&model, &request, &mut display).await?;
    drop(display);

    let path = save_artifact(&settings.output_dir, &artifact)?;
    pipeline::report_metadata(&artifact);

    pipeline::offer_run(&runner, &path, after, &mut io::stdout())
}
