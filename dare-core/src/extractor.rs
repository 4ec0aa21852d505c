//! Incremental extraction of the titled code block from a streamed reply.
//!
//! # Architecture
//!
//! The model reply arrives as fragments with arbitrary boundaries: a fragment
//! can hold several lines, half a line, or half of the fence marker itself.
//! [`Extractor`] reassembles lines with a single accumulator (`pending` only
//! ever holds the unterminated suffix) and runs each complete line through a
//! three-stage machine:
//!
//! ```text
//! ┌──────────┐  ``` py title="x.py"   ┌──────────┐   ```   ┌──────────┐
//! │  Before  │ ─────────────────────▶ │ InBlock  │ ──────▶ │  After   │
//! └──────────┘                        └──────────┘         └──────────┘
//!                                      content lines        ignored
//! ```
//!
//! Every line is echoed to the display sink as soon as it is complete, whatever
//! the stage. Errors are only raised by [`Extractor::finalize`].
//!
//! ## Example
//!
//! ```
//! use dare_core::Extractor;
//!
//! let mut display = Vec::new();
//! let mut extractor = Extractor::new(&mut display);
//! for fragment in ["```", " py title=\"e", "cho.py\"\n", "print(\"hi\")\n", "```\nDone."] {
//!     extractor.feed(fragment)?;
//! }
//! let artifact = extractor.finalize()?;
//!
//! assert_eq!(artifact.name, "echo.py");
//! assert_eq!(artifact.content, "print(\"hi\")\n");
//! # Ok::<(), dare_core::ExtractError>(())
//! ```

use std::io::{self, Write};

use tracing::{debug, trace};

use crate::artifact::Artifact;
use crate::error::{ExtractError, Result};
use crate::fence::{classify, FenceLine};
use crate::utf8::Utf8Decoder;

/// Block captured once a titled opening fence has been seen.
#[derive(Debug)]
struct Capture {
    name: String,
    language: Option<String>,
    content: String,
}

#[derive(Debug)]
enum Stage {
    Before,
    InBlock(Capture),
    After(Capture),
}

/// Streaming extractor for one model reply. Build a fresh one per reply.
pub struct Extractor<W: Write> {
    sink: W,
    pending: String,
    /// Length of the `pending` prefix already searched for newlines
    scanned: usize,
    decoder: Utf8Decoder,
    stage: Stage,
    transcript: String,
}

impl<W: Write> Extractor<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            pending: String::new(),
            scanned: 0,
            decoder: Utf8Decoder::default(),
            stage: Stage::Before,
            transcript: String::new(),
        }
    }

    /// Accept the next text fragment.
    ///
    /// Complete lines are classified and echoed immediately; the unterminated
    /// rest stays pending. Only a failing display sink produces an error.
    pub fn feed(&mut self, fragment: &str) -> io::Result<()> {
        if fragment.is_empty() {
            return Ok(());
        }
        self.pending.push_str(fragment);
        self.drain_lines()
    }

    /// Accept a raw byte fragment that may end inside a UTF-8 sequence.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        let text = self.decoder.decode(bytes);
        self.feed(&text)
    }

    /// Flush the final partial line and validate the captured block.
    pub fn finalize(mut self) -> Result<Artifact> {
        let tail = self.decoder.finish();
        self.pending.push_str(&tail);
        self.drain_lines()?;

        if !self.pending.is_empty() {
            let last = std::mem::take(&mut self.pending);
            self.scanned = 0;
            self.transcript.push_str(&last);

            self.stage = match std::mem::replace(&mut self.stage, Stage::Before) {
                // A stream cut off inside the block keeps what it delivered
                Stage::InBlock(mut capture) if classify(&last) == FenceLine::Text => {
                    capture.content.push_str(&last);
                    Stage::InBlock(capture)
                }
                Stage::InBlock(capture) => Stage::After(capture),
                other => other,
            };

            self.echo(&last)?;
        }

        match self.stage {
            Stage::Before => Err(ExtractError::MissingArtifactName),
            Stage::InBlock(capture) | Stage::After(capture) => {
                if capture.content.trim().is_empty() {
                    return Err(ExtractError::EmptyArtifact { name: capture.name });
                }
                debug!(
                    name = %capture.name,
                    bytes = capture.content.len(),
                    "extracted script"
                );
                Ok(Artifact::new(capture.name, capture.language, capture.content))
            }
        }
    }

    /// Everything echoed so far (complete lines only until finalize).
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// The unterminated line currently held back.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Name from the opening fence, once one has been seen.
    pub fn artifact_name(&self) -> Option<&str> {
        match &self.stage {
            Stage::Before => None,
            Stage::InBlock(capture) | Stage::After(capture) => Some(&capture.name),
        }
    }

    pub fn is_in_block(&self) -> bool {
        matches!(self.stage, Stage::InBlock(_))
    }

    /// Peel complete lines off the front of `pending`.
    ///
    /// Only the bytes after `scanned` are searched, so the cost follows the
    /// new text rather than the length of the current line.
    fn drain_lines(&mut self) -> io::Result<()> {
        let mut buffer = std::mem::take(&mut self.pending);
        let mut search_from = self.scanned;
        let mut line_start = 0;
        let mut result = Ok(());

        while let Some(offset) = buffer[search_from..].find('\n') {
            let line_end = search_from + offset + 1;
            let echoed = self.take_line(&buffer[line_start..line_end]);
            line_start = line_end;
            search_from = line_end;
            if let Err(err) = echoed {
                result = Err(err);
                break;
            }
        }

        buffer.drain(..line_start);
        // After a sink failure the rest may still hold newlines
        self.scanned = if result.is_ok() { buffer.len() } else { 0 };
        self.pending = buffer;
        result
    }

    fn take_line(&mut self, line: &str) -> io::Result<()> {
        self.transcript.push_str(line);
        self.advance(line);
        self.echo(line)
    }

    fn advance(&mut self, line: &str) {
        let kind = classify(line);
        self.stage = match (std::mem::replace(&mut self.stage, Stage::Before), kind) {
            (Stage::Before, FenceLine::Titled { name, language }) => {
                debug!(name, ?language, "opening fence");
                Stage::InBlock(Capture {
                    name: name.to_string(),
                    language: language.map(str::to_string),
                    content: String::new(),
                })
            }
            (Stage::InBlock(capture), FenceLine::Marker) => {
                debug!(name = %capture.name, "closing fence");
                Stage::After(capture)
            }
            // Inside the block even a titled fence is literal content
            (Stage::InBlock(mut capture), _) => {
                capture.content.push_str(line);
                Stage::InBlock(capture)
            }
            (Stage::After(capture), FenceLine::Titled { name, .. }) => {
                trace!(name, "ignoring titled fence after first block");
                Stage::After(capture)
            }
            (stage, _) => stage,
        };
    }

    fn echo(&mut self, text: &str) -> io::Result<()> {
        self.sink.write_all(text.as_bytes())?;
        self.sink.flush()
    }
}

/// Non-streaming entry point: the whole reply as one fragment.
pub fn extract_text<W: Write>(text: &str, sink: W) -> Result<Artifact> {
    let mut extractor = Extractor::new(sink);
    extractor.feed(text)?;
    extractor.finalize()
}
