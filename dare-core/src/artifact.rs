use serde::{Deserialize, Serialize};

/// The script pulled out of a model reply: the first titled fenced block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// File name taken verbatim from `title="..."`
    pub name: String,
    /// Language tag from the opening fence, if any (`py`)
    pub language: Option<String>,
    /// Block lines with their original newlines
    pub content: String,
}

impl Artifact {
    pub fn new(
        name: impl Into<String>,
        language: Option<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            language,
            content: content.into(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}
