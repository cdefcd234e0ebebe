use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use shared_utils::env::get_env_var;
use snafu::{ResultExt, ensure};
use tracing::debug;

use crate::models::CompletionRequest;
use crate::providers::openai::params::{ChatCompletionParams, EmbeddingParams};
use crate::providers::openai::response::{ChatResponse, EmbeddingResponse, ErrorEnvelope};
use crate::providers::{
    ApiSnafu, ClientBuildSnafu, CompletionProvider, EmbeddingProvider, InternalSnafu,
    InvalidApiKeySnafu, InvalidSettingSnafu, MissingEnvVarSnafu, ProviderError,
    ProviderInitError, ReqwestSnafu, ValidationSnafu,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable holding the bearer key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Connection settings for [`OpenAiProvider`]. The key is passed separately.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiConfig {
    /// API root, e.g. `https://api.openai.com/v1`. No trailing slash needed.
    pub base_url: String,
    /// Model used for chat completions.
    pub completion_model: String,
    /// Model used for embeddings.
    pub embedding_model: String,
    /// Client-side request budget shared by both endpoints.
    pub requests_per_minute: NonZeroU32,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            completion_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            requests_per_minute: nonzero!(60u32),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
    limiter: DefaultDirectRateLimiter,
    _api_key: SecretString,
}

impl OpenAiProvider {
    /// Creates a provider with an explicit key.
    pub fn new(api_key: SecretString, config: OpenAiConfig) -> Result<Self, ProviderInitError> {
        ensure!(
            !config.timeout.is_zero(),
            InvalidSettingSnafu {
                message: "timeout must be positive",
            }
        );

        let mut auth =
            header::HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
                .context(InvalidApiKeySnafu)?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context(ClientBuildSnafu)?;

        let limiter = RateLimiter::direct(Quota::per_minute(config.requests_per_minute));

        Ok(Self {
            client,
            config,
            limiter,
            _api_key: api_key,
        })
    }

    /// Creates a provider reading the key from the `OPENAI_API_KEY` environment variable.
    pub fn from_env(config: OpenAiConfig) -> Result<Self, ProviderInitError> {
        let api_key = SecretString::new(get_env_var(API_KEY_VAR).context(MissingEnvVarSnafu)?.into());
        Self::new(api_key, config)
    }

    /// The settings this provider was built with.
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ProviderError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        self.limiter.until_ready().await;

        let url = self.endpoint(path);
        debug!(%url, "provider request");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return ApiSnafu {
                status: status.as_u16(),
                message,
            }
            .fail();
        }

        response.json::<R>().await.context(ReqwestSnafu)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        ensure!(
            !request.prompt.trim().is_empty(),
            ValidationSnafu {
                message: "prompt is empty",
            }
        );

        let body = ChatCompletionParams::single_prompt(
            &self.config.completion_model,
            &request.prompt,
            request.temperature,
            request.max_tokens,
        );
        let response: ChatResponse = self.post_json("chat/completions", &body).await?;

        match response.first_text() {
            Some(text) => Ok(text),
            None => InternalSnafu {
                message: "completion returned no text",
            }
            .fail(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbeddingParams {
            model: &self.config.embedding_model,
            input: texts,
        };
        let response: EmbeddingResponse = self.post_json("embeddings", &body).await?;
        let vectors = response.into_vectors();

        ensure!(
            vectors.len() == texts.len(),
            InternalSnafu {
                message: format!("expected {} embeddings, got {}", texts.len(), vectors.len()),
            }
        );
        Ok(vectors)
    }
}
