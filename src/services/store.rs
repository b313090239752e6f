//! Vector store adapter: embeds chunks and keeps them in a vector index.

use std::sync::Arc;

use tracing::{debug, info};

use super::embedding::{Embedder, InputKind};
use super::vector_store::{IndexInfo, IndexRecord, IndexSpec, VectorIndex};
use crate::error::{ConfigError, EmbeddingError, Result};
use crate::models::{Chunk, Credentials, PipelineConfig, ScoredChunk};

/// Default number of chunk texts sent per embedding request.
pub const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 32;

/// Index-side settings for one adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub index_name: String,
    pub namespace: Option<String>,
    pub dimension: u64,
    pub embedding_model: String,
    pub embedding_batch_size: usize,
}

impl StoreSettings {
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self {
            index_name: config.index_name.clone(),
            namespace: config.effective_namespace().map(str::to_string),
            dimension: config.embedding_dimension,
            embedding_model: config.embedding_model_id.clone(),
            embedding_batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.embedding_batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.index_name.trim().is_empty() {
            return Err(ConfigError::Invalid("index_name must not be empty".into()));
        }
        if self.dimension == 0 {
            return Err(ConfigError::Invalid("embedding_dimension must be at least 1".into()));
        }
        if self.embedding_batch_size == 0 {
            return Err(ConfigError::Invalid("embedding batch size must be at least 1".into()));
        }
        Ok(())
    }

    fn spec(&self) -> IndexSpec {
        IndexSpec {
            name: self.index_name.clone(),
            dimension: self.dimension,
            embedding_model: self.embedding_model.clone(),
        }
    }
}

/// Couples an embedder with a vector index under one index name and namespace.
///
/// `delete_index` must not run concurrently with other calls on the same index.
pub struct VectorStoreAdapter {
    settings: StoreSettings,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl std::fmt::Debug for VectorStoreAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStoreAdapter")
            .field("settings", &self.settings)
            .field("embedder", &self.embedder.model_id())
            .field("index", &self.index.backend())
            .finish()
    }
}

impl VectorStoreAdapter {
    /// Validate settings and credentials, then ensure the index exists.
    ///
    /// Nothing is sent to either capability unless the embedding and index
    /// credentials are present.
    pub async fn connect(
        settings: StoreSettings,
        credentials: &Credentials,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
    ) -> Result<Self> {
        settings.validate()?;
        credentials.embedding_key()?;
        credentials.index_key()?;

        index.create_if_absent(&settings.spec()).await?;
        info!(
            index = %settings.index_name,
            namespace = settings.namespace.as_deref().unwrap_or(""),
            backend = index.backend(),
            "vector store ready"
        );

        Ok(Self {
            settings,
            embedder,
            index,
        })
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    fn namespace(&self) -> Option<&str> {
        self.settings.namespace.as_deref()
    }

    /// Embed and store `chunks`, returning how many were stored.
    pub async fn add(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut stored = 0;
        for batch in chunks.chunks(self.settings.embedding_batch_size) {
            let texts: Vec<&str> = batch.iter().map(Chunk::content).collect();
            let vectors = self.embedder.embed_batch(&texts, InputKind::Passage).await?;

            if vectors.len() != batch.len() {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                ))
                .into());
            }
            for vector in &vectors {
                self.check_dimension(vector)?;
            }

            let records: Vec<IndexRecord> = vectors
                .into_iter()
                .zip(batch.iter().cloned())
                .map(|(vector, chunk)| IndexRecord::new(vector, chunk))
                .collect();

            self.index
                .upsert(&self.settings.index_name, self.namespace(), records)
                .await?;
            stored += batch.len();
            debug!(stored, total = chunks.len(), "upserted batch");
        }

        info!(count = stored, index = %self.settings.index_name, "added chunks");
        Ok(stored)
    }

    /// The `k` chunks most similar to `query`, most similar first.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
        Ok(self
            .search_scored(query, k)
            .await?
            .into_iter()
            .map(|scored| scored.chunk)
            .collect())
    }

    pub async fn search_scored(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(query, InputKind::Query).await?;
        self.check_dimension(&vector)?;

        let matches = self
            .index
            .query(&self.settings.index_name, self.namespace(), &vector, k)
            .await?;

        Ok(matches
            .into_iter()
            .take(k)
            .map(|m| {
                let score = m.score;
                ScoredChunk {
                    chunk: m.into_chunk(),
                    score,
                }
            })
            .collect())
    }

    /// Delete the whole index, every namespace included.
    pub async fn delete_index(&self) -> Result<()> {
        self.index.delete_index(&self.settings.index_name).await?;
        info!(index = %self.settings.index_name, "deleted index");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<bool> {
        Ok(self.index.health_check().await?)
    }

    pub async fn info(&self) -> Result<Option<IndexInfo>> {
        Ok(self.index.info(&self.settings.index_name).await?)
    }

    pub fn backend(&self) -> &'static str {
        self.index.backend()
    }

    fn check_dimension(&self, vector: &[f32]) -> std::result::Result<(), EmbeddingError> {
        if vector.len() as u64 != self.settings.dimension {
            return Err(EmbeddingError::InvalidResponse(format!(
                "embedding has {} dimensions, index expects {}",
                vector.len(),
                self.settings.dimension
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagError;
    use crate::models::Metadata;
    use crate::services::vector_store::MemoryIndex;
    use async_trait::async_trait;

    /// Two-dimensional embedding: [contains "sky", contains "grass"].
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(
            &self,
            text: &str,
            _kind: InputKind,
        ) -> std::result::Result<Vec<f32>, EmbeddingError> {
            let text = text.to_lowercase();
            Ok(vec![
                if text.contains("sky") { 1.0 } else { 0.0 },
                if text.contains("grass") { 1.0 } else { 0.1 },
            ])
        }

        fn model_id(&self) -> &str {
            "keyword"
        }
    }

    fn settings() -> StoreSettings {
        StoreSettings {
            index_name: "docs".into(),
            namespace: None,
            dimension: 2,
            embedding_model: "keyword".into(),
            embedding_batch_size: 1,
        }
    }

    async fn adapter() -> VectorStoreAdapter {
        VectorStoreAdapter::connect(
            settings(),
            &Credentials::new("e", "g", "i"),
            Arc::new(KeywordEmbedder),
            Arc::new(MemoryIndex::new()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_add_and_search() {
        let store = adapter().await;
        let chunks = vec![
            Chunk::new("Grass is green.", Metadata::new()),
            Chunk::new("The sky is blue.", Metadata::new()),
        ];
        assert_eq!(store.add(&chunks).await.unwrap(), 2);

        let results = store.search("What color is the sky?", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content(), "The sky is blue.");
    }

    #[tokio::test]
    async fn test_empty_inputs() {
        let store = adapter().await;
        assert_eq!(store.add(&[]).await.unwrap(), 0);
        assert!(store.search("sky", 4).await.unwrap().is_empty());
        assert!(store.search("sky", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_index_credential() {
        let credentials = Credentials {
            index_api_key: None,
            ..Credentials::new("e", "g", "i")
        };
        let err = VectorStoreAdapter::connect(
            settings(),
            &credentials,
            Arc::new(KeywordEmbedder),
            Arc::new(MemoryIndex::new()),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RagError::Config(ConfigError::MissingCredential(_))));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_reported() {
        let store = VectorStoreAdapter::connect(
            StoreSettings {
                dimension: 3,
                ..settings()
            },
            &Credentials::new("e", "g", "i"),
            Arc::new(KeywordEmbedder),
            Arc::new(MemoryIndex::new()),
        )
        .await
        .unwrap();

        let err = store
            .add(&[Chunk::new("sky", Metadata::new())])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Embedding(EmbeddingError::InvalidResponse(_))));
    }

    #[test]
    fn test_settings_from_pipeline() {
        let config = PipelineConfig::default().with_namespace("  ");
        let settings = StoreSettings::from_pipeline(&config);
        assert_eq!(settings.namespace, None);
        assert_eq!(settings.dimension, 1024);
        assert!(settings.with_batch_size(0).validate().is_err());
    }
}
