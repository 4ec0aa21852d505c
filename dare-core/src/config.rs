use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_RUNNER: &str = "uv run";

/// Effective settings for one `dare` invocation.
///
/// Layered lowest to highest: defaults, `[dare]` table of the config file,
/// `DARE_*` environment variables, command-line flags (applied by the CLI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Chat model identifier sent to the API
    pub model: String,
    /// Upper bound on generated tokens; provider default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Request one complete reply instead of a token stream
    pub no_stream: bool,
    /// Base URL of an OpenAI-compatible API
    pub api_base: String,
    /// Command prefix used to run the saved script
    pub runner: String,
    /// Directory the script is written to
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: None,
            no_stream: false,
            api_base: DEFAULT_API_BASE.to_string(),
            runner: DEFAULT_RUNNER.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    dare: Settings,
}

impl Settings {
    /// Load from the config file (if any) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!("no config file at {:?}, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };
        settings.apply_env(|key| env::var(key).ok())?;
        Ok(settings)
    }

    /// Config file path: `$DARE_CONFIG`, else `<config dir>/dare/dare.toml`
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = env::var("DARE_CONFIG") {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        dirs::config_dir().map(|dir| dir.join("dare").join("dare.toml"))
    }

    /// Parse the `[dare]` table of a TOML file; absent keys keep defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let file: ConfigFile = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("loaded config from {:?}", path);
        Ok(file.dare)
    }

    /// Apply `DARE_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = get("DARE_MODEL") {
            self.model = model;
        }
        if let Some(raw) = get("DARE_MAX_TOKENS") {
            let tokens = raw.trim().parse::<u32>().map_err(|_| {
                ConfigError::invalid_value("DARE_MAX_TOKENS", &raw, "expected a positive integer")
            })?;
            self.max_tokens = Some(tokens);
        }
        if let Some(raw) = get("DARE_NO_STREAM") {
            self.no_stream = parse_flag("DARE_NO_STREAM", &raw)?;
        }
        if let Some(api_base) = get("DARE_API_BASE") {
            self.api_base = api_base;
        }
        if let Some(runner) = get("DARE_RUNNER") {
            self.runner = runner;
        }
        if let Some(dir) = get("DARE_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Render as the `[dare]` table, the same shape the config file uses.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        #[derive(Serialize)]
        struct Wrapper<'a> {
            dare: &'a Settings,
        }

        toml::to_string_pretty(&Wrapper { dare: self })
            .map_err(|source| ConfigError::Serialize { source })
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid_value(key, raw, "expected true or false")),
    }
}
