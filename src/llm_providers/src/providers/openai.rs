//! OpenAI-compatible REST provider (chat completions and embeddings).

pub mod params;
pub mod provider;
pub mod response;

pub use provider::{API_KEY_VAR, OpenAiConfig, OpenAiProvider};
