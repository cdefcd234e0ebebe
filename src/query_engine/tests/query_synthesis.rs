use std::sync::Arc;
use std::time::{Duration, Instant};

use llm_providers::{CompletionProvider, EmbeddingProvider};
use match_store::MemoryCorpus;
use proptest::prelude::*;
use query_engine::config::{EngineConfig, load_config_str};
use query_engine::{Engine, EngineError, QuerySource, RuntimeConfig};

mod common;

use common::{KeywordEmbedder, ScriptedCompletion, Stalled, played};

fn corpus() -> Arc<MemoryCorpus> {
    Arc::new(MemoryCorpus::new(vec![played(1, "Ipswich", "Liverpool", 0, 4)]))
}

fn offline() -> Engine {
    Engine::with_providers(&EngineConfig::default(), None, corpus(), None, None).unwrap()
}

fn with_completion(provider: Arc<ScriptedCompletion>) -> Engine {
    let completion: Arc<dyn CompletionProvider> = provider;
    Engine::with_providers(
        &EngineConfig::default(),
        Some("2024-2025".into()),
        corpus(),
        Some(completion),
        None,
    )
    .unwrap()
}

#[tokio::test]
async fn most_goals_without_a_provider_uses_the_template() {
    let result = offline().synthesize_query("show me the most goals").await.unwrap();

    assert_eq!(result.source, QuerySource::Template);
    assert_eq!(result.confidence, 0.7);
    assert!(result.sql.contains("ORDER BY total_goals DESC"), "{}", result.sql);
    assert!(result.sql.ends_with("LIMIT 10;"));
    assert!(!result.sql.contains("{limit}"));
    assert_eq!(
        result.mappings.get("most goals").map(String::as_str),
        Some("ORDER BY (home_goals + away_goals) DESC")
    );
    assert!(result.relevant_tables.contains(&"matches".to_string()));
}

#[tokio::test]
async fn runtime_without_a_key_runs_offline() {
    let runtime = RuntimeConfig::with_key(EngineConfig::default(), None, None);
    let engine = Engine::from_config(runtime, corpus()).unwrap();

    let result = engine.synthesize_query("latest results").await.unwrap();
    assert_eq!(result.source, QuerySource::Template);
    assert!(result.sql.contains("WHERE result IS NOT NULL"));
}

#[tokio::test]
async fn provider_sql_is_cleaned_and_scored() {
    let provider = Arc::new(ScriptedCompletion::new(vec![
        Ok("```sql\nSELECT referee, COUNT(*) FROM matches GROUP BY referee WHERE home_red_cards > 0\n```"),
        Ok("Counts matches with a home red card per referee."),
    ]));
    let result = with_completion(provider.clone())
        .synthesize_query("Which referee sent off home players?")
        .await
        .unwrap();

    assert_eq!(provider.calls(), 2);
    assert_eq!(result.source, QuerySource::Provider);
    assert_eq!(
        result.sql,
        "SELECT referee, COUNT(*) FROM matches WHERE home_red_cards > 0 GROUP BY referee;"
    );
    assert_eq!(result.explanation, "Counts matches with a home red card per referee.");
    assert!(result.confidence >= 0.5 && result.confidence <= 0.95);
    assert!(result.relevant_tables.contains(&"matches".to_string()));
}

#[tokio::test]
async fn failing_provider_falls_back() {
    let provider = Arc::new(ScriptedCompletion::failing());
    let result = with_completion(provider)
        .synthesize_query("how many home wins this season")
        .await
        .unwrap();

    assert_eq!(result.source, QuerySource::Fallback);
    assert_eq!(result.confidence, 0.3);
    assert_eq!(result.sql, "SELECT * FROM matches ORDER BY kickoff DESC LIMIT 10;");
    assert!(result.relevant_tables.contains(&"matches".to_string()));
    assert!(
        result
            .suggestions
            .iter()
            .any(|s| s.contains("instead of SELECT *"))
    );
}

#[tokio::test]
async fn stalled_providers_fall_back_within_the_timeout() {
    let cfg = load_config_str("[synthesis]\ntimeout_secs = 1\n\n[providers]\ntimeout_secs = 1\n")
        .unwrap();
    let completion: Arc<dyn CompletionProvider> = Arc::new(Stalled);
    let embedding: Arc<dyn EmbeddingProvider> = Arc::new(Stalled);
    let engine =
        Engine::with_providers(&cfg, None, corpus(), Some(completion), Some(embedding)).unwrap();

    let started = Instant::now();
    let result = engine
        .synthesize_query("how many home wins this season")
        .await
        .unwrap();

    // one embedding budget plus one completion budget
    assert!(started.elapsed() < Duration::from_secs(10), "{:?}", started.elapsed());
    assert_eq!(result.source, QuerySource::Fallback);
    assert_eq!(result.confidence, 0.3);
    assert_eq!(result.sql, "SELECT * FROM matches ORDER BY kickoff DESC LIMIT 10;");
    assert!(result.relevant_tables.contains(&"matches".to_string()));
}

#[tokio::test]
async fn write_statements_from_the_provider_are_never_returned() {
    for answer in ["DELETE FROM matches", "SELECT 1; DROP TABLE matches"] {
        let provider = Arc::new(ScriptedCompletion::new(vec![Ok(answer)]));
        let result = with_completion(provider.clone())
            .synthesize_query("clear out old matches")
            .await
            .unwrap();

        assert_eq!(result.source, QuerySource::Fallback, "{answer}");
        assert_eq!(result.confidence, 0.3);
        // no explanation request for rejected SQL
        assert_eq!(provider.calls(), 1);
    }
}

#[tokio::test]
async fn blank_and_oversized_questions_are_rejected() {
    let engine = offline();
    for question in ["", "   \n\t"] {
        let err = engine.synthesize_query(question).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)), "{err}");
    }
    let long = "goals ".repeat(500);
    assert!(matches!(
        engine.synthesize_query(&long).await,
        Err(EngineError::Validation(_))
    ));
}

#[tokio::test]
async fn semantic_retrieval_feeds_the_result() {
    let embedding: Arc<dyn EmbeddingProvider> = Arc::new(KeywordEmbedder {
        words: &["flagged"],
    });
    let cfg = load_config_str("[retrieval]\ntop_k = 2\n").unwrap();
    let engine = Engine::with_providers(&cfg, None, corpus(), None, Some(embedding)).unwrap();

    let result = engine
        .synthesize_query("which season is flagged as current")
        .await
        .unwrap();
    assert_eq!(result.relevant_tables.first().map(String::as_str), Some("seasons"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn confidence_stays_in_range(question in "[a-z ]{1,60}", fail in any::<bool>()) {
        prop_assume!(!question.trim().is_empty());
        let rt = tokio::runtime::Runtime::new().unwrap();
        let provider = if fail {
            ScriptedCompletion::failing()
        } else {
            ScriptedCompletion::new(vec![Ok("SELECT COUNT(*) FROM matches"), Ok("Counts.")])
        };
        let result = rt
            .block_on(with_completion(Arc::new(provider)).synthesize_query(&question))
            .unwrap();
        prop_assert!((0.0..=0.95).contains(&result.confidence));
        prop_assert!(result.sql.ends_with(';'));
    }
}
