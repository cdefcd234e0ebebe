#![cfg(test)]
use llm_providers::{
    CompletionProvider, CompletionRequest, EmbeddingProvider,
    openai::{OpenAiConfig, OpenAiProvider},
};
use serial_test::serial;

fn live_provider() -> Option<OpenAiProvider> {
    let _ = dotenvy::dotenv();
    if std::env::var("OPENAI_API_KEY").is_err() {
        println!("Skipping live provider test: OPENAI_API_KEY not set.");
        return None;
    }
    Some(OpenAiProvider::from_env(OpenAiConfig::default()).expect("Failed to create OpenAiProvider"))
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_openai_completion_returns_sql() {
    let Some(provider) = live_provider() else {
        return;
    };

    let request = CompletionRequest::new(
        "Reply with exactly this SQL and nothing else: SELECT 1;",
        32,
    );
    let result = provider.complete(&request).await;
    assert!(result.is_ok(), "complete returned an error: {:?}", result.err());
    assert!(result.unwrap().to_uppercase().contains("SELECT"));
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_openai_embeddings_match_input_count() {
    let Some(provider) = live_provider() else {
        return;
    };

    let texts = vec!["home goals".to_string(), "referee cards".to_string()];
    let vectors = provider.embed(&texts).await.expect("embed");
    assert_eq!(vectors.len(), 2);
    assert!(!vectors[0].is_empty());
    assert_eq!(vectors[0].len(), vectors[1].len());
}

#[test]
#[serial]
fn from_env_fails_without_key() {
    if std::env::var("OPENAI_API_KEY").is_ok() {
        return;
    }
    assert!(OpenAiProvider::from_env(OpenAiConfig::default()).is_err());
}
