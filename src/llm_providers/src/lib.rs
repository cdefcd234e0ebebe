//! Text-completion and embedding providers.
//!
//! The engine depends only on the [`CompletionProvider`] and [`EmbeddingProvider`]
//! traits; [`openai::OpenAiProvider`] is the one REST implementation shipped.

pub mod models;
pub mod providers;

pub use models::CompletionRequest;
pub use providers::openai;
pub use providers::{CompletionProvider, EmbeddingProvider, ProviderError, ProviderInitError};
