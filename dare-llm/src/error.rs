use std::io;
use thiserror::Error;

/// Failures talking to the chat model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("OPENAI_API_KEY is not set or empty")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status, or an error object inside the stream
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed {context}: {source}")]
    Decode {
        context: &'static str,
        source: serde_json::Error,
    },

    #[error("Reply contained no message content")]
    EmptyReply,

    #[error("No mock reply queued")]
    MockExhausted,
}

impl ModelError {
    pub fn decode(context: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { context, source }
    }
}

/// Failures while pulling a reply through an extractor.
#[derive(Error, Debug)]
pub enum DrainError {
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The display sink failed; passed through untouched
    #[error(transparent)]
    Sink(#[from] io::Error),
}
