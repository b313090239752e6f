//! Vector index abstraction layer.
//!
//! This module provides a trait-based abstraction over vector index backends
//! (Qdrant, in-process memory) so the store adapter never depends on a
//! concrete service.

mod memory;
mod qdrant;

pub use memory::MemoryIndex;
pub use qdrant::QdrantIndex;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::VectorStoreError;
use crate::models::{Chunk, Metadata, VectorDriver, VectorStoreConfig};

/// Parameters for creating an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: u64,
    /// Embedding model the vectors come from; informational for most backends.
    pub embedding_model: String,
}

/// One stored vector with the chunk it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub content: String,
    pub metadata: Metadata,
}

impl IndexRecord {
    /// Record with a fresh random id, so re-ingesting the same text adds a new record.
    pub fn new(vector: Vec<f32>, chunk: Chunk) -> Self {
        let (content, metadata) = chunk.into_parts();
        Self {
            id: Uuid::new_v4().to_string(),
            vector,
            content,
            metadata,
        }
    }
}

/// A query hit, most similar first when returned in a list.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    pub content: String,
    pub metadata: Metadata,
    pub score: f32,
}

impl IndexMatch {
    pub fn into_chunk(self) -> Chunk {
        Chunk::new(self.content, self.metadata)
    }
}

/// Index statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    pub name: String,
    pub dimension: Option<u64>,
    pub vector_count: u64,
}

/// Vector index capability.
///
/// `namespace` partitions records inside one index; `None` is the default
/// namespace.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Check if the index service is reachable.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Statistics for `name`, or `None` if the index doesn't exist.
    async fn info(&self, name: &str) -> Result<Option<IndexInfo>, VectorStoreError>;

    /// Create the index unless it already exists with the same dimension.
    async fn create_if_absent(&self, spec: &IndexSpec) -> Result<(), VectorStoreError>;

    async fn upsert(
        &self,
        name: &str,
        namespace: Option<&str>,
        records: Vec<IndexRecord>,
    ) -> Result<(), VectorStoreError>;

    /// Up to `k` nearest records by cosine similarity, most similar first.
    async fn query(
        &self,
        name: &str,
        namespace: Option<&str>,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<IndexMatch>, VectorStoreError>;

    /// Delete the index and every namespace in it.
    async fn delete_index(&self, name: &str) -> Result<(), VectorStoreError>;

    /// Backend name for status output.
    fn backend(&self) -> &'static str;
}

/// Create an index backend based on configuration.
pub fn create_index(
    config: &VectorStoreConfig,
    api_key: Option<&str>,
) -> Result<Arc<dyn VectorIndex>, VectorStoreError> {
    match config.driver {
        VectorDriver::Qdrant => Ok(Arc::new(QdrantIndex::new(&config.url, api_key)?)),
        VectorDriver::Memory => Ok(Arc::new(MemoryIndex::new())),
    }
}

/// Cosine similarity; 0.0 when either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_get_unique_ids() {
        let chunk = Chunk::new("same", Metadata::new());
        let a = IndexRecord::new(vec![1.0], chunk.clone());
        let b = IndexRecord::new(vec![1.0], chunk);
        assert_ne!(a.id, b.id);
        assert_eq!(a.content, b.content);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_factory_memory_driver() {
        let config = VectorStoreConfig {
            driver: VectorDriver::Memory,
            ..Default::default()
        };
        let index = create_index(&config, None).unwrap();
        assert_eq!(index.backend(), "memory");
    }
}
