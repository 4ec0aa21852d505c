use std::io::{self, IsTerminal, Write};
use std::path::Path;

use anyhow::{Context, Result};
use dare_core::{Artifact, Extractor};
use dare_llm::{drain, Model, PromptRequest};
use dare_script::{parse_script_metadata, Runner};
use inquire::Confirm;
use tracing::{debug, info, warn};

use super::AfterSave;
use crate::ui::DisplaySink;

/// Prompt the model, echo the reply to `display`, and extract the script.
pub async fn generate_artifact<W: Write>(
    model: &dyn Model,
    request: &PromptRequest,
    display: &mut DisplaySink<W>,
) -> Result<Artifact> {
    let reply = model.prompt(request).await.context("Model request failed")?;

    let mut extractor = Extractor::new(&mut *display);
    let outcome = match drain(reply, &mut extractor).await {
        Ok(fragments) => {
            debug!(fragments, "reply complete");
            extractor.finalize().map_err(anyhow::Error::from)
        }
        Err(err) => {
            drop(extractor);
            Err(anyhow::Error::from(err).context("Model reply was interrupted"))
        }
    };

    display.end_line()?;
    outcome
}

/// Log the script's declared interpreter and dependencies, if any.
pub fn report_metadata(artifact: &Artifact) {
    match parse_script_metadata(&artifact.content) {
        Ok(Some(metadata)) => {
            if let Some(python) = &metadata.requires_python {
                info!("Requires Python {}", python);
            }
            if !metadata.dependencies.is_empty() {
                info!("Dependencies: {}", metadata.dependencies.join(", "));
            }
        }
        Ok(None) => debug!("{} has no inline script metadata", artifact.name),
        Err(err) => warn!("Ignoring script metadata in {}: {:#}", artifact.name, err),
    }
}

/// Run the saved script, ask first, or print how to run it to `out`.
pub fn offer_run<W: Write>(
    runner: &Runner,
    path: &Path,
    after: AfterSave,
    out: &mut W,
) -> Result<()> {
    let command_line = runner.command_line(path);

    let run = match after {
        AfterSave::Run => true,
        AfterSave::Skip => false,
        AfterSave::Ask if io::stdin().is_terminal() => {
            let confirmed = Confirm::new("Do you want to run the generated script?")
                .with_default(false)
                .with_help_message(&command_line)
                .prompt()
                .context("Failed to get run confirmation")?;
            if !confirmed {
                writeln!(out, "Script execution cancelled.")?;
                return Ok(());
            }
            true
        }
        AfterSave::Ask => false,
    };

    if run {
        runner.run(path)?;
    } else {
        writeln!(
            out,
            "To run the generated script, use the following command:\n{}",
            command_line
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dare_core::ExtractError;
    use dare_llm::MockModel;

    const FRAGMENTS: [&str; 5] = [
        "Here you go.\n``",
        "` py title=\"clock.py\"\nimport time\n",
        "print(time.ctime())\n",
        "```\n",
        "Run it with uv.",
    ];

    fn request(stream: bool) -> PromptRequest {
        PromptRequest {
            system: "system".to_string(),
            prompt: "show the time".to_string(),
            stream,
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn test_generate_artifact_streaming() {
        let model = MockModel::new();
        model.add_reply(FRAGMENTS);

        let mut out = Vec::new();
        let mut display = DisplaySink::new(&mut out, None);
        let artifact = generate_artifact(&model, &request(true), &mut display)
            .await
            .unwrap();
        drop(display);

        assert_eq!(artifact.name, "clock.py");
        assert_eq!(artifact.language.as_deref(), Some("py"));
        assert_eq!(artifact.content, "import time\nprint(time.ctime())\n");
        // Transcript echoed in full, with the dangling last line terminated
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", FRAGMENTS.concat()));
    }

    #[tokio::test]
    async fn test_generate_artifact_without_block() {
        let model = MockModel::new();
        model.add_reply(["Sorry, ", "I can't do that.\n"]);

        let mut out = Vec::new();
        let mut display = DisplaySink::new(&mut out, None);
        let err = generate_artifact(&model, &request(false), &mut display)
            .await
            .unwrap_err();
        drop(display);

        assert!(matches!(
            err.downcast_ref::<ExtractError>(),
            Some(ExtractError::MissingArtifactName)
        ));
        assert_eq!(out, b"Sorry, I can't do that.\n");
    }

    #[tokio::test]
    async fn test_model_failure_has_context() {
        let model = MockModel::new();
        let mut out = Vec::new();
        let mut display = DisplaySink::new(&mut out, None);

        let err = generate_artifact(&model, &request(true), &mut display)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Model request failed");
    }

    #[test]
    fn test_skip_prints_command() {
        let runner = Runner::parse("uv run").unwrap();
        let mut out = Vec::new();
        offer_run(&runner, Path::new("out dir/clock.py"), AfterSave::Skip, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "To run the generated script, use the following command:\nuv run 'out dir/clock.py'\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_executes_script() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let script = temp_dir.path().join("ok.sh");
        std::fs::write(&script, "exit 0\n").unwrap();

        let runner = Runner::parse("sh").unwrap();
        let mut out = Vec::new();
        offer_run(&runner, &script, AfterSave::Run, &mut out).unwrap();
        assert!(out.is_empty());
    }
}
