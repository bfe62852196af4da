//! Answer synthesis providers.
//!
//! `Generator` turns a question plus retrieved passages into answer text.
//! `ChatCompletionsGenerator` implements it against any OpenAI-compatible
//! `/chat/completions` endpoint (OpenAI, Ollama, llama.cpp server, vLLM).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::UpstreamError;

/// Reply a generator gives when the passages do not answer the question.
pub const NO_ANSWER: &str = "INFO NOT FOUND";

/// A retrieved passage handed to the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextPassage {
    pub document_id: String,
    pub text: String,
    pub relevance: f64,
}

/// Synthesizes an answer from a question and context passages.
///
/// The engine drops the returned future on cancellation or deadline, which
/// aborts an in-flight HTTP request.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        question: &str,
        context: &[ContextPassage],
    ) -> Result<String, UpstreamError>;
}

/// Render passages and question into a single grounded prompt.
pub fn build_prompt(question: &str, context: &[ContextPassage]) -> String {
    let mut facts = String::new();
    for passage in context {
        facts.push_str("==== ");
        facts.push_str(&passage.document_id);
        facts.push('\n');
        facts.push_str(passage.text.trim());
        facts.push('\n');
    }

    format!(
        "Facts:\n{facts}======\n\
         Using only the facts above, answer the question about this person. \
         If the facts do not contain the answer, reply exactly with '{NO_ANSWER}'.\n\
         Question: {question}\n\
         Answer: "
    )
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// `Generator` backed by an OpenAI-compatible chat completions API.
#[derive(Debug, Clone)]
pub struct ChatCompletionsGenerator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatCompletionsGenerator {
    /// `base_url` is the API root, e.g. `http://localhost:11434/v1`.
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl Generator for ChatCompletionsGenerator {
    async fn generate(
        &self,
        question: &str,
        context: &[ContextPassage],
    ) -> Result<String, UpstreamError> {
        let prompt = build_prompt(question, context);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            temperature: 0.0,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::with_source("generation request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(UpstreamError::new(format!(
                "generation endpoint returned {status}: {}",
                detail.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::with_source("malformed generation response", e))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| UpstreamError::new("generation response had no content"))
    }
}
