//! Embedding clients for turning text into vectors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EmbeddingError;
use crate::models::{EmbeddingConfig, EmbeddingDriver};

/// Pinecone inference API version the request/response shapes follow.
const PINECONE_API_VERSION: &str = "2024-10";

/// Whether a text is stored or used to search.
///
/// Asymmetric models (e5 family) embed the two differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Text being indexed
    Passage,
    /// Search query
    Query,
}

impl InputKind {
    fn prefix(self) -> &'static str {
        match self {
            InputKind::Passage => "passage: ",
            InputKind::Query => "query: ",
        }
    }
}

/// Embedding capability.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str, kind: InputKind) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed several texts; the default implementation calls [`Embedder::embed`]
    /// sequentially.
    async fn embed_batch(
        &self,
        texts: &[&str],
        kind: InputKind,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text, kind).await?);
        }
        Ok(results)
    }

    fn model_id(&self) -> &str;
}

/// Create an embedder for the configured driver.
pub fn create_embedder(
    config: &EmbeddingConfig,
    model_id: &str,
    api_key: &str,
) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    match config.driver {
        EmbeddingDriver::Pinecone => Ok(Arc::new(PineconeEmbedder::new(config, model_id, api_key)?)),
        EmbeddingDriver::OpenAi => Ok(Arc::new(OpenAiEmbedder::new(config, model_id, api_key)?)),
    }
}

fn build_client(timeout_secs: u64) -> Result<Client, EmbeddingError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))
}

fn map_send_error(provider: &'static str, e: reqwest::Error) -> EmbeddingError {
    debug!(provider, error = %e, "embedding request failed");
    if e.is_timeout() {
        EmbeddingError::Timeout
    } else if e.is_connect() {
        EmbeddingError::ConnectionError(e.to_string())
    } else {
        EmbeddingError::RequestError(e)
    }
}

async fn check_status(provider: &'static str, response: Response) -> Result<Response, EmbeddingError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    debug!(provider, %status, "embedding API error");
    Err(EmbeddingError::ServerError(format!("status {}: {}", status, body)))
}

fn expect_count(vectors: Vec<Vec<f32>>, expected: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if vectors.len() != expected {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected {} embeddings, got {}",
            expected,
            vectors.len()
        )));
    }
    Ok(vectors)
}

// Pinecone inference

#[derive(Debug, Serialize)]
struct PineconeEmbedRequest<'a> {
    model: &'a str,
    parameters: PineconeParameters,
    inputs: Vec<PineconeInput<'a>>,
}

#[derive(Debug, Serialize)]
struct PineconeParameters {
    input_type: InputKind,
    truncate: &'static str,
}

#[derive(Debug, Serialize)]
struct PineconeInput<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PineconeEmbedResponse {
    data: Vec<PineconeEmbedding>,
}

#[derive(Debug, Deserialize)]
struct PineconeEmbedding {
    values: Vec<f32>,
}

/// Client for Pinecone's hosted inference `/embed` endpoint.
#[derive(Debug, Clone)]
pub struct PineconeEmbedder {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl PineconeEmbedder {
    pub fn new(config: &EmbeddingConfig, model: &str, api_key: &str) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Embedder for PineconeEmbedder {
    async fn embed(&self, text: &str, kind: InputKind) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(&[text], kind)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }

    async fn embed_batch(
        &self,
        texts: &[&str],
        kind: InputKind,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "pinecone", batch_size = texts.len(), model = %self.model, ?kind, "embedding batch");

        let request = PineconeEmbedRequest {
            model: &self.model,
            parameters: PineconeParameters {
                input_type: kind,
                truncate: "END",
            },
            inputs: texts.iter().map(|&text| PineconeInput { text }).collect(),
        };

        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error("pinecone", e))?;

        let response: PineconeEmbedResponse = check_status("pinecone", response)
            .await?
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        expect_count(
            response.data.into_iter().map(|d| d.values).collect(),
            texts.len(),
        )
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// OpenAI-compatible /embeddings

#[derive(Debug, Serialize)]
struct OpenAiEmbedRequest<'a> {
    model: &'a str,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Client for any OpenAI-compatible `/embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    input_prefixes: bool,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig, model: &str, api_key: &str) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            input_prefixes: config.input_prefixes,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn prepare(&self, text: &str, kind: InputKind) -> String {
        if self.input_prefixes {
            format!("{}{}", kind.prefix(), text)
        } else {
            text.to_string()
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str, kind: InputKind) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(&[text], kind)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }

    async fn embed_batch(
        &self,
        texts: &[&str],
        kind: InputKind,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "openai", batch_size = texts.len(), model = %self.model, ?kind, "embedding batch");

        let request = OpenAiEmbedRequest {
            model: &self.model,
            input: texts.iter().map(|text| self.prepare(text, kind)).collect(),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error("openai", e))?;

        let mut response: OpenAiEmbedResponse = check_status("openai", response)
            .await?
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        response.data.sort_by_key(|d| d.index);
        expect_count(
            response.data.into_iter().map(|d| d.embedding).collect(),
            texts.len(),
        )
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trimming() {
        let config = EmbeddingConfig {
            url: Some("http://localhost:8080/v1/".to_string()),
            ..Default::default()
        };
        let embedder = OpenAiEmbedder::new(&config, "e5", "key").unwrap();
        assert_eq!(embedder.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_input_prefixes() {
        let config = EmbeddingConfig {
            driver: EmbeddingDriver::OpenAi,
            input_prefixes: true,
            ..Default::default()
        };
        let embedder = OpenAiEmbedder::new(&config, "e5", "key").unwrap();
        assert_eq!(embedder.prepare("sky", InputKind::Query), "query: sky");
        assert_eq!(embedder.prepare("sky", InputKind::Passage), "passage: sky");
    }

    #[test]
    fn test_pinecone_request_shape() {
        let request = PineconeEmbedRequest {
            model: "multilingual-e5-large",
            parameters: PineconeParameters {
                input_type: InputKind::Passage,
                truncate: "END",
            },
            inputs: vec![PineconeInput { text: "hello" }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["parameters"]["input_type"], "passage");
        assert_eq!(json["inputs"][0]["text"], "hello");
    }

    #[test]
    fn test_factory_uses_driver() {
        let config = EmbeddingConfig::default();
        let embedder = create_embedder(&config, "multilingual-e5-large", "key").unwrap();
        assert_eq!(embedder.model_id(), "multilingual-e5-large");
    }

    #[test]
    fn test_expect_count() {
        assert!(expect_count(vec![vec![1.0]], 2).is_err());
        assert_eq!(expect_count(vec![vec![1.0]], 1).unwrap().len(), 1);
    }
}
