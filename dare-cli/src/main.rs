//! dare CLI - generate a runnable Python script from a prompt
//!
//! The model's reply is echoed line by line as it streams in. The first code
//! block opened with ``` py title="name.py" is saved as `name.py` and, after
//! confirmation, run with `uv run`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

mod commands;
mod config;
mod tracing_setup;
mod ui;

use commands::AfterSave;
use tracing_setup::{init_tracing, TracingConfig};

#[derive(Parser, Debug)]
#[command(
    name = "dare",
    author,
    version,
    about = "Generate a runnable Python script from a prompt",
    long_about = "Ask a chat model for a single-file Python tool, save it, and run it with \
                  `uv run`. Text piped to stdin is appended to the prompt."
)]
pub struct Cli {
    /// Describe the script you want (words are joined with spaces)
    #[arg(value_name = "PROMPT")]
    pub prompt: Vec<String>,

    /// Chat model to use (overrides config and DARE_MODEL)
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    /// Maximum number of tokens for the model response
    #[arg(long, value_name = "N")]
    pub max_tokens: Option<u32>,

    /// Disable streaming of the model response
    #[arg(long)]
    pub no_stream: bool,

    /// Show the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Fix errors in a Python script (format: "<PY_FILEPATH [ARGS...]>")
    #[arg(long, value_name = "PY_FILEPATH [ARGS...]", conflicts_with = "prompt")]
    pub fix: Option<String>,

    /// Directory to save the generated script in
    #[arg(long = "out", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Run the saved script without asking
    #[arg(long, short = 'y', conflicts_with = "no_run")]
    pub yes: bool,

    /// Save the script but do not run it
    #[arg(long)]
    pub no_run: bool,

    /// Suppress the progress spinner
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    fn after_save(&self) -> AfterSave {
        if self.no_run {
            AfterSave::Skip
        } else if self.yes {
            AfterSave::Run
        } else {
            AfterSave::Ask
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before settings so OPENAI_API_KEY and DARE_* can come from it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&TracingConfig { debug: cli.debug }).ok();
    ui::init_quiet_mode(cli.quiet);

    let settings = config::effective_settings(&cli)?;
    if cli.show_config {
        return config::show_config(&settings);
    }

    let job = match &cli.fix {
        Some(command) => match commands::prepare_fix(command, &settings).await? {
            Some(job) => job,
            None => return Ok(()),
        },
        None => commands::prepare_generate(&cli.prompt)?,
    };

    commands::run_job(&settings, job, cli.after_save()).await
}
