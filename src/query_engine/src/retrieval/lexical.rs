//! Keyword-overlap retrieval.
//!
//! Score per document: 3 points per question word found in the body, 2 per word
//! found in the metadata, and 5 more if the whole question appears in the body.
//! Words are lowercase runs of letters, digits and `_` longer than two characters.

use std::sync::Arc;

use async_trait::async_trait;

use crate::retrieval::{Retrieval, RetrievedFragment, SchemaRetriever};
use crate::schema_catalog::SchemaCatalog;

const BODY_WEIGHT: u32 = 3;
const METADATA_WEIGHT: u32 = 2;
const PHRASE_BONUS: u32 = 5;
const MIN_WORD_LEN: usize = 3;

/// Splits a question into distinct lowercase words, in order of appearance.
pub fn tokenize(question: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in question
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| w.chars().count() >= MIN_WORD_LEN)
    {
        if !words.iter().any(|w| w == word) {
            words.push(word.to_string());
        }
    }
    words
}

struct Indexed {
    body: String,
    metadata: String,
}

pub struct LexicalRetriever {
    catalog: Arc<SchemaCatalog>,
    lowered: Vec<Indexed>,
}

impl LexicalRetriever {
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        let lowered = catalog
            .documents()
            .iter()
            .map(|d| Indexed {
                body: d.body.to_lowercase(),
                metadata: d.metadata.to_lowercase(),
            })
            .collect();
        Self { catalog, lowered }
    }

    /// Synchronous ranking, shared with the semantic retriever's fallback.
    pub fn rank(&self, question: &str, k: usize) -> Retrieval {
        if k == 0 {
            return Retrieval::default();
        }
        let phrase = question.trim().to_lowercase();
        let words = tokenize(&phrase);

        let mut scored: Vec<(usize, u32)> = self
            .lowered
            .iter()
            .enumerate()
            .map(|(idx, doc)| (idx, score(&phrase, &words, doc)))
            .filter(|(_, s)| *s > 0)
            .collect();
        // stable: ties keep catalog order
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.truncate(k);

        let docs = self.catalog.documents();
        Retrieval::from_fragments(
            scored
                .into_iter()
                .map(|(idx, s)| RetrievedFragment {
                    document: docs[idx].clone(),
                    score: f64::from(s),
                })
                .collect(),
        )
    }
}

fn score(phrase: &str, words: &[String], doc: &Indexed) -> u32 {
    let body_hits = words.iter().filter(|w| doc.body.contains(w.as_str())).count() as u32;
    let meta_hits = words
        .iter()
        .filter(|w| doc.metadata.contains(w.as_str()))
        .count() as u32;
    let bonus = if phrase.chars().count() >= MIN_WORD_LEN && doc.body.contains(phrase) {
        PHRASE_BONUS
    } else {
        0
    };
    BODY_WEIGHT * body_hits + METADATA_WEIGHT * meta_hits + bonus
}

#[async_trait]
impl SchemaRetriever for LexicalRetriever {
    fn name(&self) -> &'static str {
        "lexical"
    }

    async fn retrieve(&self, question: &str, k: usize) -> Retrieval {
        self.rank(question, k)
    }
}
