use std::time::Duration;

use llm_providers::ProviderError;
use match_store::CorpusError;
use thiserror::Error;

/// Longest question accepted by [`crate::engine::Engine::synthesize_query`].
pub const MAX_QUESTION_CHARS: usize = 2000;

/// Errors surfaced to callers of the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The caller passed something unusable; nothing was attempted.
    #[error("invalid question: {0}")]
    Validation(String),
}

impl EngineError {
    /// Checks a question before any work is done.
    pub fn check_question(question: &str) -> Result<&str, EngineError> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(EngineError::Validation("question is empty".into()));
        }
        let len = trimmed.chars().count();
        if len > MAX_QUESTION_CHARS {
            return Err(EngineError::Validation(format!(
                "question is {len} characters, limit is {MAX_QUESTION_CHARS}"
            )));
        }
        Ok(trimmed)
    }
}

/// Why a query generator produced nothing usable. Always recovered by the
/// fallback template.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),
    #[error("generated SQL is not read-only: {0}")]
    NotReadOnly(String),
}

/// A single detector failed; the engine logs it and moves on.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("corpus scan failed: {0}")]
    Corpus(#[from] CorpusError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn questions_are_trimmed_and_bounded() {
        assert_eq!(EngineError::check_question("  most goals ").unwrap(), "most goals");
        assert!(matches!(
            EngineError::check_question(" \n\t"),
            Err(EngineError::Validation(_))
        ));

        let long = "a".repeat(MAX_QUESTION_CHARS + 1);
        let err = EngineError::check_question(&long).unwrap_err();
        assert!(err.to_string().contains("limit is 2000"));
        assert!(EngineError::check_question(&"é".repeat(MAX_QUESTION_CHARS)).is_ok());
    }
}
