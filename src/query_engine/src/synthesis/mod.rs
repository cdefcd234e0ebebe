//! Natural-language question to SQL.
//!
//! Flow for one question: schema retrieval, terminology mapping, generation
//! (provider or template), then static analysis of the SQL. A generator failure
//! is never surfaced; the generic template answers instead with low confidence.

pub mod analysis;
pub mod generator;
pub mod prompt;
pub mod templates;
pub mod terms;

use std::num::{NonZeroU32, NonZeroUsize};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::EngineError;
use crate::retrieval::SchemaRetriever;

pub use analysis::{PerformanceTier, QueryFeatures};
pub use generator::{GenerationContext, Generated, LlmGenerator, QueryGenerator};
pub use templates::TemplateGenerator;
pub use terms::TermMapper;

/// Confidence of template answers.
pub const TEMPLATE_CONFIDENCE: f64 = 0.7;
/// Confidence of the failure fallback.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;
/// Upper bound of any confidence.
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Who wrote the SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuerySource {
    Provider,
    Template,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub sql: String,
    pub explanation: String,
    /// 0.0 to 0.95.
    pub confidence: f64,
    pub relevant_tables: Vec<String>,
    pub suggestions: Vec<String>,
    pub performance: PerformanceTier,
    /// Football phrases recognised in the question and their SQL fragments.
    pub mappings: IndexMap<String, String>,
    pub source: QuerySource,
}

/// Provider-path confidence from how much schema backed the answer.
pub fn provider_confidence(schema_matches: usize, relevant_tables: usize) -> f64 {
    let schema = (0.1 * schema_matches as f64).min(0.3);
    let tables = (0.1 * relevant_tables as f64).min(0.2);
    (0.5 + schema + tables).min(MAX_CONFIDENCE)
}

pub struct Synthesizer {
    retriever: Arc<dyn SchemaRetriever>,
    generator: Arc<dyn QueryGenerator>,
    terms: TermMapper,
    top_k: NonZeroUsize,
    row_limit: NonZeroU32,
    current_season: Option<String>,
}

impl Synthesizer {
    pub fn new(
        retriever: Arc<dyn SchemaRetriever>,
        generator: Arc<dyn QueryGenerator>,
        top_k: NonZeroUsize,
        row_limit: NonZeroU32,
    ) -> Self {
        info!(
            retriever = retriever.name(),
            generator = generator.name(),
            "query synthesizer ready"
        );
        Self {
            retriever,
            generator,
            terms: TermMapper::builtin(),
            top_k,
            row_limit,
            current_season: None,
        }
    }

    pub fn with_current_season(mut self, season: Option<String>) -> Self {
        self.current_season = season;
        self
    }

    pub fn with_terms(mut self, terms: TermMapper) -> Self {
        self.terms = terms;
        self
    }

    /// Only a bad question is an error; every downstream failure degrades.
    pub async fn synthesize(&self, question: &str) -> Result<QueryResult, EngineError> {
        let question = EngineError::check_question(question)?;

        let retrieval = self.retriever.retrieve(question, self.top_k.get()).await;
        let mappings = self.terms.map(question);
        let ctx = GenerationContext {
            question,
            retrieval: &retrieval,
            mappings: &mappings,
            current_season: self.current_season.as_deref(),
        };

        let generated = match self.generator.generate(&ctx).await {
            Ok(generated) => generated,
            Err(e) => {
                warn!(
                    error = %e,
                    generator = self.generator.name(),
                    "query generation failed, using fallback template"
                );
                templates::fallback(self.row_limit)
            }
        };

        let features = QueryFeatures::detect(&generated.sql);
        let relevant_tables = if retrieval.tables.is_empty() {
            features.tables.clone()
        } else {
            retrieval.tables.clone()
        };
        let confidence = match generated.source {
            QuerySource::Provider => {
                provider_confidence(retrieval.fragments.len(), retrieval.tables.len())
            }
            QuerySource::Template => TEMPLATE_CONFIDENCE,
            QuerySource::Fallback => FALLBACK_CONFIDENCE,
        };

        Ok(QueryResult {
            suggestions: analysis::suggestions(&features),
            performance: PerformanceTier::classify(&features),
            sql: generated.sql,
            explanation: generated.explanation,
            confidence,
            relevant_tables,
            mappings,
            source: generated.source,
        })
    }
}
