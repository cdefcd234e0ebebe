use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use llm_providers::{CompletionProvider, CompletionRequest};
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::retrieval::Retrieval;
use crate::synthesis::QuerySource;
use crate::synthesis::prompt::{self, CANNED_EXPLANATION};

/// Everything a generator may look at for one question.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    pub question: &'a str,
    pub retrieval: &'a Retrieval,
    pub mappings: &'a IndexMap<String, String>,
    pub current_season: Option<&'a str>,
}

/// A generator's answer, before analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub sql: String,
    pub explanation: String,
    pub source: QuerySource,
}

#[async_trait]
pub trait QueryGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, ctx: &GenerationContext<'_>) -> Result<Generated, GenerationError>;
}

/// Asks a completion provider for SQL, then for an explanation of that SQL.
pub struct LlmGenerator {
    provider: Arc<dyn CompletionProvider>,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl LlmGenerator {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        temperature: f32,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
            timeout,
        }
    }

    async fn complete(&self, prompt: String) -> Result<String, GenerationError> {
        let request =
            CompletionRequest::new(prompt, self.max_tokens).with_temperature(self.temperature);
        tokio::time::timeout(self.timeout, self.provider.complete(&request))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))?
            .map_err(GenerationError::from)
    }
}

#[async_trait]
impl QueryGenerator for LlmGenerator {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn generate(&self, ctx: &GenerationContext<'_>) -> Result<Generated, GenerationError> {
        let raw = self.complete(prompt::sql_prompt(ctx)).await?;
        let sql = prompt::clean_sql(&raw);
        prompt::ensure_read_only(&sql)?;
        debug!(%sql, "provider produced sql");

        let explanation = match self
            .complete(prompt::explanation_prompt(ctx.question, &sql, ctx.mappings))
            .await
        {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => CANNED_EXPLANATION.to_string(),
            Err(e) => {
                warn!(error = %e, "explanation request failed, using canned explanation");
                CANNED_EXPLANATION.to_string()
            }
        };

        Ok(Generated {
            sql,
            explanation,
            source: QuerySource::Provider,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use llm_providers::ProviderError;
    use llm_providers::providers::ApiSnafu;

    use super::*;

    /// Replays scripted answers and records prompts.
    struct Script {
        answers: Mutex<Vec<Result<String, u16>>>,
        prompts: Mutex<Vec<CompletionRequest>>,
    }

    impl Script {
        fn new(answers: Vec<Result<&str, u16>>) -> Self {
            Self {
                answers: Mutex::new(
                    answers.into_iter().rev().map(|a| a.map(str::to_string)).collect(),
                ),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for Script {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(request.clone());
            let next = self.answers.lock().unwrap().pop();
            let status = match next {
                Some(Ok(text)) => return Ok(text),
                Some(Err(status)) => status,
                None => 500,
            };
            ApiSnafu {
                status,
                message: "scripted failure",
            }
            .fail()
        }
    }

    /// Answers the first `answered` requests, then never returns.
    struct Stalls {
        answered: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionProvider for Stalls {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, ProviderError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.answered {
                return Ok("SELECT COUNT(*) FROM matches".to_string());
            }
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    fn ctx<'a>(
        retrieval: &'a Retrieval,
        mappings: &'a IndexMap<String, String>,
    ) -> GenerationContext<'a> {
        GenerationContext {
            question: "how many home wins",
            retrieval,
            mappings,
            current_season: Some("2024-2025"),
        }
    }

    fn generator(script: Arc<Script>) -> LlmGenerator {
        LlmGenerator::new(script, 0.2, 256, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn sql_then_explanation() {
        let script = Arc::new(Script::new(vec![
            Ok("```sql\nSELECT COUNT(*) FROM matches WHERE result = 'H'\n```"),
            Ok("  Counts home wins.  "),
        ]));
        let (retrieval, mappings) = (Retrieval::default(), IndexMap::new());

        let out = generator(script.clone()).generate(&ctx(&retrieval, &mappings)).await.unwrap();
        assert_eq!(out.sql, "SELECT COUNT(*) FROM matches WHERE result = 'H';");
        assert_eq!(out.explanation, "Counts home wins.");
        assert_eq!(out.source, QuerySource::Provider);

        let prompts = script.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0].temperature, 0.2);
        assert_eq!(prompts[0].max_tokens, 256);
        assert!(prompts[0].prompt.contains("Current season: 2024-2025"));
        assert!(prompts[1].prompt.contains("SQL: SELECT COUNT(*) FROM matches WHERE result = 'H';"));
    }

    #[tokio::test]
    async fn failed_explanation_keeps_the_sql() {
        let script = Arc::new(Script::new(vec![Ok("SELECT 1"), Err(503)]));
        let (retrieval, mappings) = (Retrieval::default(), IndexMap::new());

        let out = generator(script).generate(&ctx(&retrieval, &mappings)).await.unwrap();
        assert_eq!(out.sql, "SELECT 1;");
        assert_eq!(out.explanation, CANNED_EXPLANATION);
    }

    #[tokio::test]
    async fn writes_are_rejected_before_explaining() {
        let script = Arc::new(Script::new(vec![Ok("DELETE FROM matches")]));
        let (retrieval, mappings) = (Retrieval::default(), IndexMap::new());

        let err = generator(script.clone())
            .generate(&ctx(&retrieval, &mappings))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::NotReadOnly(_)));
        assert_eq!(script.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let script = Arc::new(Script::new(vec![Err(429)]));
        let (retrieval, mappings) = (Retrieval::default(), IndexMap::new());

        let err = generator(script).generate(&ctx(&retrieval, &mappings)).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Provider(ProviderError::Api { status: 429, .. })
        ));
    }

    #[tokio::test]
    async fn stalled_sql_request_times_out() {
        let stalls = Arc::new(Stalls {
            answered: 0,
            calls: AtomicUsize::new(0),
        });
        let (retrieval, mappings) = (Retrieval::default(), IndexMap::new());
        let limit = Duration::from_millis(50);

        let started = Instant::now();
        let err = LlmGenerator::new(stalls, 0.2, 256, limit)
            .generate(&ctx(&retrieval, &mappings))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Timeout(d) if d == limit), "{err}");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn stalled_explanation_keeps_the_sql() {
        let stalls = Arc::new(Stalls {
            answered: 1,
            calls: AtomicUsize::new(0),
        });
        let (retrieval, mappings) = (Retrieval::default(), IndexMap::new());

        let out = LlmGenerator::new(stalls.clone(), 0.2, 256, Duration::from_millis(50))
            .generate(&ctx(&retrieval, &mappings))
            .await
            .unwrap();
        assert_eq!(out.sql, "SELECT COUNT(*) FROM matches;");
        assert_eq!(out.explanation, CANNED_EXPLANATION);
        assert_eq!(stalls.calls.load(Ordering::SeqCst), 2);
    }
}
