//! Embedding-based retrieval with a lexical safety net.
//!
//! The catalog is embedded lazily, on the first question, and at most once per
//! process: a failed build is remembered and every later question goes straight
//! to the lexical fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use llm_providers::{EmbeddingProvider, ProviderError};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::retrieval::index::{IndexError, VectorIndex};
use crate::retrieval::lexical::LexicalRetriever;
use crate::retrieval::{Retrieval, RetrievedFragment, SchemaRetriever};
use crate::schema_catalog::SchemaCatalog;

#[derive(Debug, Error)]
pub enum SemanticError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("embedding request timed out after {0:?}")]
    Timeout(Duration),
    #[error("provider returned no vector for the question")]
    MissingVector,
    #[error(transparent)]
    Index(#[from] IndexError),
}

pub struct SemanticRetriever {
    catalog: Arc<SchemaCatalog>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: OnceCell<Option<VectorIndex>>,
    fallback: LexicalRetriever,
    timeout: Duration,
}

impl SemanticRetriever {
    pub fn new(
        catalog: Arc<SchemaCatalog>,
        embedder: Arc<dyn EmbeddingProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            fallback: LexicalRetriever::new(catalog.clone()),
            catalog,
            embedder,
            index: OnceCell::new(),
            timeout,
        }
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        tokio::time::timeout(self.timeout, self.embedder.embed(texts))
            .await
            .map_err(|_| SemanticError::Timeout(self.timeout))?
            .map_err(SemanticError::from)
    }

    async fn build_index(&self) -> Result<VectorIndex, SemanticError> {
        let bodies: Vec<String> = self
            .catalog
            .documents()
            .iter()
            .map(|d| d.body.clone())
            .collect();
        let vectors = self.embed(&bodies).await?;
        if vectors.len() != bodies.len() {
            return Err(SemanticError::MissingVector);
        }
        Ok(VectorIndex::new(vectors)?)
    }

    async fn index(&self) -> Option<&VectorIndex> {
        self.index
            .get_or_init(|| async {
                match self.build_index().await {
                    Ok(index) => {
                        info!(documents = index.len(), dims = index.dims(), "schema embedding index built");
                        Some(index)
                    }
                    Err(e) => {
                        warn!(error = %e, "schema embedding index unavailable, using lexical retrieval");
                        None
                    }
                }
            })
            .await
            .as_ref()
    }

    async fn search(
        &self,
        index: &VectorIndex,
        question: &str,
        k: usize,
    ) -> Result<Retrieval, SemanticError> {
        let vector = self
            .embed(&[question.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(SemanticError::MissingVector)?;
        let hits = index.nearest(&vector, k)?;

        let docs = self.catalog.documents();
        Ok(Retrieval::from_fragments(
            hits.into_iter()
                .map(|(idx, score)| RetrievedFragment {
                    document: docs[idx].clone(),
                    score,
                })
                .collect(),
        ))
    }
}

#[async_trait]
impl SchemaRetriever for SemanticRetriever {
    fn name(&self) -> &'static str {
        "semantic"
    }

    async fn retrieve(&self, question: &str, k: usize) -> Retrieval {
        if k == 0 {
            return Retrieval::default();
        }
        let Some(index) = self.index().await else {
            return self.fallback.rank(question, k);
        };
        match self.search(index, question, k).await {
            Ok(retrieval) => retrieval,
            Err(e) => {
                warn!(error = %e, "question embedding failed, using lexical retrieval");
                self.fallback.rank(question, k)
            }
        }
    }
}
