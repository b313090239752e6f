#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ragent::error::{EmbeddingError, ExtractError, GenerationError};
use ragent::models::{ChatMessage, Credentials, PipelineConfig};
use ragent::services::{
    ContentExtractor, Embedder, Generator, InputKind, MemoryIndex, PageReader, RagPipeline,
};

pub const TOPICS: [&str; 4] = ["sky", "grass", "sea", "sun"];

/// One dimension per topic word, plus a constant so no vector is all zeros.
pub struct TopicEmbedder;

#[async_trait]
impl Embedder for TopicEmbedder {
    async fn embed(&self, text: &str, _kind: InputKind) -> Result<Vec<f32>, EmbeddingError> {
        let text = text.to_lowercase();
        let mut vector: Vec<f32> = TOPICS
            .iter()
            .map(|topic| text.matches(topic).count() as f32)
            .collect();
        vector.push(0.05);
        Ok(vector)
    }

    fn model_id(&self) -> &str {
        "topic"
    }
}

pub const TOPIC_DIMENSION: u64 = TOPICS.len() as u64 + 1;

/// Records every message list it receives and answers with a fixed string.
#[derive(Default)]
pub struct RecordingGenerator {
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl RecordingGenerator {
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        Ok("stub answer".to_string())
    }

    fn model_id(&self) -> &str {
        "recording"
    }
}

pub struct PanickingEmbedder;

#[async_trait]
impl Embedder for PanickingEmbedder {
    async fn embed(&self, _text: &str, _kind: InputKind) -> Result<Vec<f32>, EmbeddingError> {
        panic!("embedder must not be called");
    }

    fn model_id(&self) -> &str {
        "panicking"
    }
}

pub struct PanickingGenerator;

#[async_trait]
impl Generator for PanickingGenerator {
    async fn generate(&self, _messages: &[ChatMessage]) -> Result<String, GenerationError> {
        panic!("generator must not be called");
    }

    fn model_id(&self) -> &str {
        "panicking"
    }
}

/// Embedder whose service is never reachable.
pub struct UnreachableEmbedder;

#[async_trait]
impl Embedder for UnreachableEmbedder {
    async fn embed(&self, _text: &str, _kind: InputKind) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::ConnectionError("connection refused".to_string()))
    }

    fn model_id(&self) -> &str {
        "unreachable"
    }
}

pub struct UnreachableGenerator;

#[async_trait]
impl Generator for UnreachableGenerator {
    async fn generate(&self, _messages: &[ChatMessage]) -> Result<String, GenerationError> {
        Err(GenerationError::ConnectionError("connection refused".to_string()))
    }

    fn model_id(&self) -> &str {
        "unreachable"
    }
}

/// Page reader that returns fixed pages, or fails for files named `broken.pdf`.
pub struct FixedPages(pub Vec<&'static str>);

impl PageReader for FixedPages {
    fn read_pages(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        if path.file_name().is_some_and(|name| name == "broken.pdf") {
            return Err(ExtractError::Unreadable {
                path: path.to_path_buf(),
                message: "corrupt xref table".to_string(),
            });
        }
        Ok(self.0.iter().map(ToString::to_string).collect())
    }
}

pub fn credentials() -> Credentials {
    Credentials::new("embedding-key", "generation-key", "index-key")
}

pub fn config(chunk_size: usize, chunk_overlap: usize) -> PipelineConfig {
    PipelineConfig::new("test-index")
        .with_embedding("topic", TOPIC_DIMENSION)
        .with_chunking(chunk_size, chunk_overlap)
        .with_retrieval_k(2)
}

pub async fn pipeline_with(
    config: PipelineConfig,
    index: Arc<MemoryIndex>,
    generator: Arc<RecordingGenerator>,
    extractor: ContentExtractor,
) -> RagPipeline {
    RagPipeline::builder()
        .config(config)
        .credentials(credentials())
        .embedder(Arc::new(TopicEmbedder))
        .generator(generator)
        .index(index)
        .extractor(extractor)
        .build()
        .await
        .unwrap()
}

pub async fn pipeline(generator: Arc<RecordingGenerator>) -> RagPipeline {
    pipeline_with(
        config(1000, 200),
        Arc::new(MemoryIndex::new()),
        generator,
        ContentExtractor::text_only(),
    )
    .await
}
