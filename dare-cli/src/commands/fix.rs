//! Fix mode: run an existing script and, if it fails, ask for a corrected one.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use dare_core::prompts::{fix_prompt, script_fix};
use dare_core::Settings;
use dare_script::{read_script, RunOutcome, Runner};
use tracing::{debug, info};

use super::Job;

/// Returns `None` when the script already runs cleanly.
pub async fn prepare_fix(command: &str, settings: &Settings) -> Result<Option<Job>> {
    let args = shlex::split(command)
        .ok_or_else(|| anyhow!("Invalid --fix command: {}", command))?;
    let script = args
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("--fix needs a script path"))?;
    let contents = read_script(Path::new(&script))?;

    let runner = Runner::parse(&settings.runner)?;
    info!("Running {} to capture the error", runner.command_line(Path::new(&script)));
    let outcome = tokio::task::spawn_blocking(move || runner.run_captured(&args))
        .await
        .context("Script runner task failed")??;

    if outcome.success {
        println!("Script ran successfully, no fixes needed.");
        return Ok(None);
    }

    debug!(stderr_len = outcome.stderr.len(), "script failed");
    Ok(Some(Job {
        system: script_fix(),
        prompt: fix_prompt(&script, failure_text(&outcome), &contents),
    }))
}

/// The error report for the model: stderr, or stdout when stderr is silent.
fn failure_text(outcome: &RunOutcome) -> &str {
    if outcome.stderr.trim().is_empty() {
        &outcome.stdout
    } else {
        &outcome.stderr
    }
}
