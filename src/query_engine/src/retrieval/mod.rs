//! Schema retrieval: question in, the k most relevant schema fragments out.
//!
//! Two implementations sit behind [`SchemaRetriever`]:
//! - [`semantic::SemanticRetriever`] embeds the catalog once and ranks by cosine
//!   similarity; any embedding failure degrades to lexical scoring.
//! - [`lexical::LexicalRetriever`] scores keyword overlap and needs nothing external.
//!
//! The choice is made once, in [`build_retriever`]. Retrieval never errors; the
//! worst case is an empty [`Retrieval`].

pub mod index;
pub mod lexical;
pub mod semantic;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use llm_providers::EmbeddingProvider;
use serde::Serialize;
use tracing::info;

use crate::schema_catalog::{SchemaCatalog, SchemaDocument};

pub use lexical::LexicalRetriever;
pub use semantic::SemanticRetriever;

/// One ranked schema fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedFragment {
    #[serde(flatten)]
    pub document: SchemaDocument,
    /// Lexical points or cosine similarity, depending on the retriever.
    pub score: f64,
}

/// Ranked fragments and the distinct tables they touch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Retrieval {
    pub fragments: Vec<RetrievedFragment>,
    /// Table names in order of first appearance among `fragments`.
    pub tables: Vec<String>,
}

impl Retrieval {
    pub fn from_fragments(fragments: Vec<RetrievedFragment>) -> Self {
        let mut tables: Vec<String> = Vec::new();
        for table in fragments.iter().flat_map(|f| &f.document.tables) {
            if !tables.contains(table) {
                tables.push(table.clone());
            }
        }
        Self { fragments, tables }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Fragment bodies, one per line, as handed to prompts.
    pub fn context(&self) -> String {
        self.fragments
            .iter()
            .map(|f| format!("- {}", f.document.body))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
pub trait SchemaRetriever: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Returns at most `k` fragments, best first.
    async fn retrieve(&self, question: &str, k: usize) -> Retrieval;
}

/// Picks the retriever for this process.
///
/// With an embedding provider the semantic retriever is used (and falls back to
/// lexical scoring on its own when embeddings fail); without one, lexical.
pub fn build_retriever(
    catalog: Arc<SchemaCatalog>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    embed_timeout: Duration,
) -> Arc<dyn SchemaRetriever> {
    match embedder {
        Some(embedder) => {
            info!(retriever = "semantic", "schema retriever selected");
            Arc::new(SemanticRetriever::new(catalog, embedder, embed_timeout))
        }
        None => {
            info!(
                retriever = "lexical",
                "no embedding provider configured, using lexical schema retrieval"
            );
            Arc::new(LexicalRetriever::new(catalog))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_catalog::DocumentKind;

    fn frag(id: &str, tables: &[&str]) -> RetrievedFragment {
        RetrievedFragment {
            document: SchemaDocument {
                id: id.into(),
                kind: DocumentKind::Concept,
                tables: tables.iter().map(|t| t.to_string()).collect(),
                body: format!("body of {id}"),
                metadata: String::new(),
            },
            score: 1.0,
        }
    }

    #[test]
    fn tables_are_distinct_in_first_appearance_order() {
        let retrieval = Retrieval::from_fragments(vec![
            frag("a", &["seasons"]),
            frag("b", &["matches", "seasons"]),
            frag("c", &["matches"]),
        ]);
        assert_eq!(retrieval.tables, ["seasons", "matches"]);
        assert_eq!(retrieval.context(), "- body of a\n- body of b\n- body of c");
    }

    #[tokio::test]
    async fn without_embedder_lexical_is_chosen() {
        let catalog = Arc::new(SchemaCatalog::builtin().unwrap());
        let retriever = build_retriever(catalog, None, Duration::from_secs(1));
        assert_eq!(retriever.name(), "lexical");
    }
}
