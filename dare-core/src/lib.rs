pub mod artifact;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fence;
pub mod prompts;
mod utf8;

pub use artifact::Artifact;
pub use config::Settings;
pub use error::{ConfigError, ExtractError};
pub use extractor::{extract_text, Extractor};
pub use fence::{classify, FenceLine};
