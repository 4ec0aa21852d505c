//! Chat model collaborator for dare
//!
//! A [`Model`] turns a prompt into a [`Reply`]: either a lazy stream of text
//! fragments or one complete string. [`drain`] pulls either form through a
//! [`dare_core::Extractor`] so both paths share one code path.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use dare_core::Extractor;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::debug;

pub mod error;
pub mod openai;
pub mod sse;

pub use error::{DrainError, ModelError};
pub use openai::OpenAiModel;

/// One prompt sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    /// System instructions (may be empty)
    pub system: String,
    /// The user's request
    pub prompt: String,
    /// Ask for incremental delivery
    pub stream: bool,
    pub max_tokens: Option<u32>,
}

/// Model output in either delivery mode.
pub enum Reply {
    Stream(BoxStream<'static, Result<String, ModelError>>),
    Complete(String),
}

impl Reply {
    /// View either form as a fragment stream; a complete reply is one fragment.
    pub fn into_fragments(self) -> BoxStream<'static, Result<String, ModelError>> {
        match self {
            Reply::Stream(fragments) => fragments,
            Reply::Complete(text) => stream::once(async move { Ok(text) }).boxed(),
        }
    }
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Stream(_) => f.write_str("Reply::Stream(..)"),
            Reply::Complete(text) => f.debug_tuple("Reply::Complete").field(text).finish(),
        }
    }
}

/// Trait for chat model access (testable)
#[async_trait]
pub trait Model: Send + Sync {
    async fn prompt(&self, request: &PromptRequest) -> Result<Reply, ModelError>;
}

/// Feed every fragment of `reply` to `extractor`, in order.
///
/// Returns the number of fragments received. The caller finalizes the
/// extractor; dropping the future part-way leaves it safe to discard.
pub async fn drain<W: Write>(reply: Reply, extractor: &mut Extractor<W>) -> Result<usize, DrainError> {
    let mut fragments = reply.into_fragments();
    let mut count = 0;

    while let Some(fragment) = fragments.next().await {
        let fragment = fragment?;
        extractor.feed(&fragment)?;
        count += 1;
    }

    debug!(fragments = count, "reply drained");
    Ok(count)
}

/// Mock model for testing: replays queued fragment lists.
///
/// A streaming request gets the fragments one by one; a non-streaming request
/// gets their concatenation.
#[derive(Default)]
pub struct MockModel {
    replies: Mutex<VecDeque<Vec<String>>>,
    requests: Mutex<Vec<PromptRequest>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next prompt
    pub fn add_reply<S: Into<String>>(&self, fragments: impl IntoIterator<Item = S>) {
        let fragments = fragments.into_iter().map(Into::into).collect();
        self.replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(fragments);
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<PromptRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Model for MockModel {
    async fn prompt(&self, request: &PromptRequest) -> Result<Reply, ModelError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        let fragments = self
            .replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .ok_or(ModelError::MockExhausted)?;

        if request.stream {
            Ok(Reply::Stream(stream::iter(fragments.into_iter().map(Ok)).boxed()))
        } else {
            Ok(Reply::Complete(fragments.concat()))
        }
    }
}
