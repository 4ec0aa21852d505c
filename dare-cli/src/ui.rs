//! Terminal feedback for the dare CLI
//!
//! # Quiet Mode
//!
//! The spinner is suppressed when:
//! - `--quiet` flag is passed
//! - `DARE_QUIET=1` environment variable is set
//! - stderr is not a TTY (piped output)

use std::io::{self, IsTerminal, Write};
use std::sync::OnceLock;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Global quiet mode state
static QUIET_MODE: OnceLock<bool> = OnceLock::new();

/// Initialize quiet mode from the --quiet flag, DARE_QUIET and TTY status.
pub fn init_quiet_mode(quiet_flag: bool) {
    let is_quiet = quiet_flag
        || std::env::var("DARE_QUIET").map(|v| v == "1").unwrap_or(false)
        || !io::stderr().is_terminal();

    QUIET_MODE.set(is_quiet).ok();
}

pub fn is_quiet() -> bool {
    *QUIET_MODE.get().unwrap_or(&false)
}

/// Create a spinner that respects quiet mode
pub fn spinner(msg: impl Into<String>) -> Option<ProgressBar> {
    if is_quiet() {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.cyan} {msg}")
            .expect("valid template"),
    );
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_millis(80));
    Some(pb)
}

/// Where the transcript is echoed.
///
/// Clears the spinner before the first write and remembers whether output
/// stopped mid-line, so status messages after it start on a fresh line.
pub struct DisplaySink<W: Write> {
    inner: W,
    spinner: Option<ProgressBar>,
    at_line_start: bool,
}

impl<W: Write> DisplaySink<W> {
    pub fn new(inner: W, spinner: Option<ProgressBar>) -> Self {
        Self {
            inner,
            spinner,
            at_line_start: true,
        }
    }

    fn clear_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    /// Terminate a dangling last line and flush.
    pub fn end_line(&mut self) -> io::Result<()> {
        self.clear_spinner();
        if !self.at_line_start {
            self.inner.write_all(b"\n")?;
            self.at_line_start = true;
        }
        self.inner.flush()
    }
}

impl<W: Write> Write for DisplaySink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.clear_spinner();
        let written = self.inner.write(buf)?;
        if written > 0 {
            self.at_line_start = buf[written - 1] == b'\n';
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Drop for DisplaySink<W> {
    fn drop(&mut self) {
        self.clear_spinner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_line_terminates_dangling_line() {
        let mut out = Vec::new();
        let mut sink = DisplaySink::new(&mut out, None);
        sink.write_all(b"line\nDone.").unwrap();
        sink.end_line().unwrap();
        sink.end_line().unwrap();
        drop(sink);
        assert_eq!(out, b"line\nDone.\n");
    }

    #[test]
    fn test_end_line_after_complete_line() {
        let mut out = Vec::new();
        let mut sink = DisplaySink::new(&mut out, None);
        sink.write_all(b"all done\n").unwrap();
        sink.end_line().unwrap();
        drop(sink);
        assert_eq!(out, b"all done\n");
    }

    #[test]
    fn test_end_line_with_no_output() {
        let mut out = Vec::new();
        DisplaySink::new(&mut out, None).end_line().unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_spinner_cleared_on_first_write() {
        let pb = ProgressBar::hidden();
        let mut out = Vec::new();
        let mut sink = DisplaySink::new(&mut out, Some(pb.clone()));
        assert!(!pb.is_finished());
        sink.write_all(b"x").unwrap();
        assert!(pb.is_finished());
    }
}
