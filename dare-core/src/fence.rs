//! Fence line recognition for the ```` ``` py title="name.py" ```` convention.
//!
//! Only two shapes matter:
//! - an opening fence carrying a `title="..."` annotation, which names the script.
//!   The language tag is either `py` or absent; any other tag is not a script.
//! - any other line starting with three backticks, which can only close a block

use once_cell::sync::Lazy;
use regex::Regex;

pub const FENCE_MARKER: &str = "```";

static TITLED_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^```[ \t]*(?:(py)[ \t]+)?title="([^"]+)""#)
        .expect("titled fence regex")
});

/// How a single line is classified by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenceLine<'a> {
    /// Opening fence with a title; borrows the captured name and language tag
    Titled {
        name: &'a str,
        language: Option<&'a str>,
    },
    /// Any other line beginning with three backticks
    Marker,
    /// Everything else
    Text,
}

/// Classify a line (with or without its trailing newline).
pub fn classify(line: &str) -> FenceLine<'_> {
    if !line.starts_with(FENCE_MARKER) {
        return FenceLine::Text;
    }

    match TITLED_FENCE_RE.captures(line) {
        Some(caps) => match caps.get(2) {
            Some(name) => FenceLine::Titled {
                name: name.as_str(),
                language: caps.get(1).map(|m| m.as_str()),
            },
            None => FenceLine::Marker,
        },
        None => FenceLine::Marker,
    }
}
