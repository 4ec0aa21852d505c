//! Running scripts through the configured runner command (`uv run` by default).

use anyhow::{anyhow, Context, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, ExitStatus};
use tracing::debug;

/// A runner command split into program and leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runner {
    program: String,
    args: Vec<String>,
}

/// Captured result of a run, for fix mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl Runner {
    /// Split a shell-style command line such as `uv run` or `python3 -u`.
    pub fn parse(command: &str) -> Result<Self> {
        let mut parts = shlex::split(command)
            .ok_or_else(|| anyhow!("Invalid runner command: {}", command))?
            .into_iter();
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("Runner command is empty"))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// The command a user would type to run `script`, quoted for a shell.
    pub fn command_line(&self, script: &Path) -> String {
        let script = script.to_string_lossy();
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .chain(std::iter::once(script.as_ref()))
            .map(|word| shlex::try_quote(word).map_or_else(|_| word.to_string(), |q| q.into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn command<I, S>(&self, script_args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command.args(&self.args).args(script_args);
        command
    }

    /// Run `script` with inherited stdio; a non-zero exit is an error.
    pub fn run(&self, script: &Path) -> Result<ExitStatus> {
        debug!(runner = %self.program, script = %script.display(), "running script");

        let status = self
            .command([script])
            .status()
            .with_context(|| self.spawn_hint())?;

        if !status.success() {
            return Err(anyhow!(
                "Script {} exited with {}",
                script.display(),
                status
            ));
        }
        Ok(status)
    }

    /// Run `script_args` (script path first) and capture its output.
    pub fn run_captured<S: AsRef<OsStr>>(&self, script_args: &[S]) -> Result<RunOutcome> {
        let output = self
            .command(script_args)
            .output()
            .with_context(|| self.spawn_hint())?;

        debug!(status = %output.status, "captured script run");
        Ok(RunOutcome {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn spawn_hint(&self) -> String {
        format!(
            "Failed to start '{}'. Is it installed and on PATH? (set runner in the config to change it)",
            self.program
        )
    }
}
