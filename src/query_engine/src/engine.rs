//! The two public operations, wired from configuration.

use std::sync::Arc;

use anyhow::Context;
use llm_providers::openai::OpenAiProvider;
use llm_providers::{CompletionProvider, EmbeddingProvider};
use match_store::Corpus;
use tracing::{info, warn};

use crate::config::{EngineConfig, RuntimeConfig};
use crate::error::EngineError;
use crate::patterns::{Pattern, PatternEngine};
use crate::retrieval::build_retriever;
use crate::schema_catalog::SchemaCatalog;
use crate::synthesis::{LlmGenerator, QueryGenerator, QueryResult, Synthesizer, TemplateGenerator};

pub struct Engine {
    synthesizer: Synthesizer,
    patterns: PatternEngine,
}

impl Engine {
    /// Builds the engine, using the OpenAI-compatible provider when a key is
    /// available and the offline paths otherwise.
    pub fn from_config(runtime: RuntimeConfig, corpus: Arc<dyn Corpus>) -> anyhow::Result<Self> {
        let RuntimeConfig {
            engine,
            current_season,
            api_key,
        } = runtime;

        let provider = match api_key {
            Some(key) => match OpenAiProvider::new(key, engine.providers.openai()) {
                Ok(p) => {
                    info!(
                        base_url = %engine.providers.base_url,
                        model = %engine.providers.completion_model,
                        "using OpenAI-compatible provider"
                    );
                    Some(Arc::new(p))
                }
                Err(e) => {
                    warn!(error = %e, "provider init failed, falling back to offline mode");
                    None
                }
            },
            None => {
                info!("no provider key, running offline");
                None
            }
        };

        let completion = provider
            .clone()
            .map(|p| p as Arc<dyn CompletionProvider>);
        let embedding = provider.map(|p| p as Arc<dyn EmbeddingProvider>);
        Self::with_providers(&engine, current_season, corpus, completion, embedding)
    }

    /// Builds the engine around explicit providers. `None` selects the
    /// template generator and lexical retrieval respectively.
    pub fn with_providers(
        cfg: &EngineConfig,
        current_season: Option<String>,
        corpus: Arc<dyn Corpus>,
        completion: Option<Arc<dyn CompletionProvider>>,
        embedding: Option<Arc<dyn EmbeddingProvider>>,
    ) -> anyhow::Result<Self> {
        let catalog = match &cfg.retrieval.catalog_path {
            Some(path) => SchemaCatalog::from_path(path)
                .with_context(|| format!("load schema catalog {}", path.display()))?,
            None => SchemaCatalog::builtin().context("load built-in schema catalog")?,
        };
        let catalog = Arc::new(catalog);

        let retriever = build_retriever(
            Arc::clone(&catalog),
            embedding,
            cfg.providers.openai().timeout,
        );

        let generator: Arc<dyn QueryGenerator> = match completion {
            Some(provider) => Arc::new(LlmGenerator::new(
                provider,
                cfg.synthesis.temperature,
                cfg.synthesis.max_tokens,
                cfg.synthesis.timeout(),
            )),
            None => Arc::new(TemplateGenerator::new(cfg.synthesis.row_limit)),
        };

        let synthesizer = Synthesizer::new(
            retriever,
            generator,
            cfg.retrieval.top_k,
            cfg.synthesis.row_limit,
        )
        .with_current_season(current_season);

        let patterns = PatternEngine::from_config(corpus, &cfg.patterns, cfg.corpus.scan_limit);
        info!(detectors = ?patterns.detector_names(), "pattern engine ready");

        Ok(Self {
            synthesizer,
            patterns,
        })
    }

    /// Turns a natural-language question into a read-only SQL query.
    pub async fn synthesize_query(&self, question: &str) -> Result<QueryResult, EngineError> {
        self.synthesizer.synthesize(question).await
    }

    /// Runs every detector over the corpus, most significant findings first.
    pub async fn discover_patterns(&self) -> Vec<Pattern> {
        self.patterns.discover_patterns().await
    }
}
