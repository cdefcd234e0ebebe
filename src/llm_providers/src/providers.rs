//! Provider abstraction for language-model services.
//!
//! Two capabilities are modelled separately because deployments often have one
//! without the other:
//! - [`CompletionProvider`]: prompt in, text out;
//! - [`EmbeddingProvider`]: texts in, one vector per text out.
//!
//! Both traits are async and object safe, so callers hold them as
//! `Arc<dyn CompletionProvider>` and pick the implementation at runtime.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use llm_providers::{CompletionProvider, CompletionRequest, ProviderError};
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl CompletionProvider for Echo {
//!     async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
//!         Ok(request.prompt.clone())
//!     }
//! }
//! ```

pub mod openai;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::CompletionRequest;

/// A black-box text-completion service.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the completion text for `request`.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

/// A text-embedding service.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds every text; the output has one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// API key contains characters not allowed in a header.
    #[snafu(display("Invalid API key format: {source}"))]
    InvalidApiKey {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },

    /// A numeric setting that must be positive was zero.
    #[snafu(display("Invalid provider setting: {message}"))]
    InvalidSetting {
        message: String,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a provider call.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// Network failure, client-side timeout or undecodable body.
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The service answered with a non-success status.
    #[snafu(display("API error ({status}): {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The request was rejected before being sent.
    #[snafu(display("Invalid request for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// The service answered, but not with anything usable.
    #[snafu(display("Internal provider error: {message}"))]
    Internal {
        message: String,
        backtrace: Backtrace,
    },

    /// An error during provider configuration or initialization.
    #[snafu(display("Provider initialization error: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: ProviderInitError,
    },
}
