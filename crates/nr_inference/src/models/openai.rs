use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use nr_core::{CompletionOptions, EmbeddingModel, Error, InferenceModel, Result, Settings};

/// Output size of `text-embedding-3-small`, used for models of unknown size.
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

/// Native output size of the OpenAI embedding models.
pub fn known_embedding_dimensions(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
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
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// OpenAI-compatible chat and embedding client.
pub struct OpenAiModel {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
    model: String,
    embedding_model: String,
    embedding_dimensions: usize,
    default_max_tokens: u32,
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiModel {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::InvalidConfig("OpenAI API key is required".to_string()))?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            default_max_tokens: 2000,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut model = Self::new(
            settings.openai_api_key.clone(),
            settings.openai_base_url.clone(),
            settings.default_model.clone(),
            settings.request_timeout(),
        )?;
        model.default_max_tokens = settings.max_tokens;
        Ok(model.with_embedding_model(&settings.embedding_model, settings.embedding_dimensions))
    }

    /// Switches the embedding model. Without explicit `dimensions` the size is
    /// looked up from the model name.
    pub fn with_embedding_model(mut self, model: &str, dimensions: Option<usize>) -> Self {
        self.embedding_dimensions = dimensions
            .or_else(|| known_embedding_dimensions(model))
            .unwrap_or_else(|| {
                tracing::warn!(
                    "Unknown embedding model '{}', assuming {} dimensions; set EMBEDDING_DIMENSIONS to override",
                    model,
                    DEFAULT_EMBEDDING_DIMENSIONS
                );
                DEFAULT_EMBEDDING_DIMENSIONS
            });
        self.embedding_model = model.to_string();
        self
    }
}

#[async_trait]
impl InferenceModel for OpenAiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
            max_tokens: Some(options.max_tokens.unwrap_or(self.default_max_tokens)),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::Generation("completion returned no choices".to_string()))
    }
}

#[async_trait]
impl EmbeddingModel for OpenAiModel {
    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            input: text,
            model: &self.embedding_model,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<EmbeddingResponse>()
            .await?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Generation("embedding response was empty".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.embedding_dimensions
    }
}
