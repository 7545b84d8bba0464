//! Embedding and text generation backends

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::AssistantConfig;

const GENERATION_TEMPERATURE: f32 = 0.3;
const GENERATION_MAX_TOKENS: u32 = 1000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("model API returned no {0}")]
    EmptyResponse(&'static str),

    #[error("failed to read knowledge base: {0}")]
    KnowledgeBase(#[from] std::io::Error),

    #[error("knowledge base contains no text")]
    EmptyKnowledgeBase,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError>;

    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// One OpenAI-style endpoint
#[derive(Debug, Clone)]
struct Endpoint {
    base_url: String,
    api_key: String,
    model: String,
}

impl Endpoint {
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Client for any service speaking the OpenAI `/embeddings` and
/// `/chat/completions` protocol (OpenAI, Groq, local gateways)
pub struct OpenAiCompatibleModel {
    http: reqwest::Client,
    generation: Endpoint,
    embedding: Endpoint,
}

impl OpenAiCompatibleModel {
    pub fn new(config: &AssistantConfig) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            generation: Endpoint {
                base_url: config.generation_base_url.clone(),
                api_key: config.generation_api_key.clone(),
                model: config.generation_model.clone(),
            },
            embedding: Endpoint {
                base_url: config.embedding_base_url.clone(),
                api_key: config.embedding_api_key.clone(),
                model: config.embedding_model.clone(),
            },
        })
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &Endpoint,
        path: &str,
        body: &B,
    ) -> Result<R, ModelError> {
        let response = self
            .http
            .post(endpoint.url(path))
            .bearer_auth(&endpoint.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        let request = EmbeddingRequest {
            model: &self.embedding.model,
            input: text,
        };
        let response: EmbeddingResponse =
            self.post(&self.embedding, "embeddings", &request).await?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(ModelError::EmptyResponse("embedding"))
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let request = ChatRequest {
            model: &self.generation.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: GENERATION_TEMPERATURE,
            max_tokens: GENERATION_MAX_TOKENS,
        };
        let response: ChatResponse = self
            .post(&self.generation, "chat/completions", &request)
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ModelError::EmptyResponse("completion"))
    }
}
