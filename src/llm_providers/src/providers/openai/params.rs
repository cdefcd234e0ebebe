use serde::Serialize;

/// One chat message.
#[derive(Clone, Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Body of `POST /chat/completions`.
#[derive(Clone, Debug, Serialize)]
pub struct ChatCompletionParams<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Body of `POST /embeddings`.
#[derive(Clone, Debug, Serialize)]
pub struct EmbeddingParams<'a> {
    pub model: &'a str,
    pub input: &'a [String],
}

impl<'a> ChatCompletionParams<'a> {
    /// A single user-message conversation.
    pub fn single_prompt(model: &'a str, prompt: &'a str, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
            max_tokens,
        }
    }
}
