/// Structured error types for dare-core.
///
/// Uses `thiserror` so callers can match on the terminal extraction failures.
/// The binary (dare-cli) wraps these in `anyhow` for reporting.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Terminal failures of [`crate::Extractor::finalize`].
#[derive(Error, Debug)]
pub enum ExtractError {
    /// No opening fence carrying a `title="..."` annotation was seen
    #[error("Script name not found in the response (no ``` py title=\"...\" fence)")]
    MissingArtifactName,

    /// The titled block was found but held only whitespace
    #[error("Script '{name}' is empty or whitespace-only")]
    EmptyArtifact { name: String },

    /// The display sink failed; passed through untouched
    #[error(transparent)]
    Sink(#[from] io::Error),
}

/// Result type alias for extraction
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Failures while loading [`crate::Settings`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse config file {path:?} (invalid TOML): {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to render config as TOML: {source}")]
    Serialize { source: toml::ser::Error },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtractError::EmptyArtifact {
            name: "a.py".to_string(),
        };
        assert_eq!(err.to_string(), "Script 'a.py' is empty or whitespace-only");

        let err = ConfigError::invalid_value("DARE_MAX_TOKENS", "lots", "expected an integer");
        assert!(err.to_string().contains("DARE_MAX_TOKENS"));
        assert!(err.to_string().contains("lots"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "closed");
        let err: ExtractError = io_err.into();

        assert!(matches!(err, ExtractError::Sink(_)));
        assert_eq!(err.to_string(), "closed");
    }
}
