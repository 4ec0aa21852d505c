//! Inline script metadata (PEP 723)
//!
//! Generated scripts carry their interpreter requirement and dependencies in
//! a comment block:
//!
//! ```text
//! # /// script
//! # requires-python = ">=3.11"
//! # dependencies = ["click"]
//! # ///
//! ```

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static METADATA_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^# /// (?P<type>[a-zA-Z0-9-]+)$\s(?P<content>(^#(| .*)$\s)+)^# ///$")
        .expect("valid metadata regex")
});

/// The `script` metadata table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScriptMetadata {
    #[serde(rename = "requires-python")]
    pub requires_python: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Parse the first `script` metadata block, if the script has one.
pub fn parse_script_metadata(source: &str) -> Result<Option<ScriptMetadata>> {
    let Some(caps) = METADATA_BLOCK
        .captures_iter(source)
        .find(|caps| &caps["type"] == "script")
    else {
        return Ok(None);
    };

    let toml_source: String = caps["content"]
        .lines()
        .map(|line| {
            line.strip_prefix("# ")
                .or_else(|| line.strip_prefix('#'))
                .unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let metadata = toml::from_str(&toml_source).context("Invalid script metadata block")?;
    Ok(Some(metadata))
}
