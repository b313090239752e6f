//! In-process vector index using cosine similarity.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{IndexInfo, IndexMatch, IndexRecord, IndexSpec, VectorIndex, cosine_similarity};
use crate::error::VectorStoreError;

#[derive(Debug)]
struct Collection {
    dimension: u64,
    // Insertion order keeps equal-score results stable.
    records: Vec<(String, IndexRecord)>,
}

/// Vector index held in memory; contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_dimension(expected: u64, vector: &[f32]) -> Result<(), VectorStoreError> {
    let actual = vector.len() as u64;
    if actual != expected {
        return Err(VectorStoreError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(true)
    }

    async fn info(&self, name: &str) -> Result<Option<IndexInfo>, VectorStoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(name).map(|c| IndexInfo {
            name: name.to_string(),
            dimension: Some(c.dimension),
            vector_count: c.records.len() as u64,
        }))
    }

    async fn create_if_absent(&self, spec: &IndexSpec) -> Result<(), VectorStoreError> {
        let mut collections = self.collections.write().await;
        match collections.get(&spec.name) {
            Some(existing) if existing.dimension != spec.dimension => {
                Err(VectorStoreError::DimensionMismatch {
                    expected: existing.dimension,
                    actual: spec.dimension,
                })
            }
            Some(_) => Ok(()),
            None => {
                collections.insert(
                    spec.name.clone(),
                    Collection {
                        dimension: spec.dimension,
                        records: Vec::new(),
                    },
                );
                Ok(())
            }
        }
    }

    async fn upsert(
        &self,
        name: &str,
        namespace: Option<&str>,
        records: Vec<IndexRecord>,
    ) -> Result<(), VectorStoreError> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| VectorStoreError::MissingIndex(name.to_string()))?;

        for record in &records {
            check_dimension(collection.dimension, &record.vector)?;
        }

        let namespace = namespace.unwrap_or_default().to_string();
        collection
            .records
            .extend(records.into_iter().map(|r| (namespace.clone(), r)));
        Ok(())
    }

    async fn query(
        &self,
        name: &str,
        namespace: Option<&str>,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<IndexMatch>, VectorStoreError> {
        let collections = self.collections.read().await;
        let collection = collections
            .get(name)
            .ok_or_else(|| VectorStoreError::MissingIndex(name.to_string()))?;
        check_dimension(collection.dimension, vector)?;

        let namespace = namespace.unwrap_or_default();
        let mut matches: Vec<IndexMatch> = collection
            .records
            .iter()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, record)| IndexMatch {
                content: record.content.clone(),
                metadata: record.metadata.clone(),
                score: cosine_similarity(&record.vector, vector),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(k);
        Ok(matches)
    }

    async fn delete_index(&self, name: &str) -> Result<(), VectorStoreError> {
        let mut collections = self.collections.write().await;
        collections
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| VectorStoreError::MissingIndex(name.to_string()))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Chunk, Metadata};

    fn spec(dimension: u64) -> IndexSpec {
        IndexSpec {
            name: "docs".to_string(),
            dimension,
            embedding_model: "test".to_string(),
        }
    }

    fn record(text: &str, vector: Vec<f32>) -> IndexRecord {
        IndexRecord::new(vector, Chunk::new(text, Metadata::new()))
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let index = MemoryIndex::new();
        index.create_if_absent(&spec(2)).await.unwrap();
        index.create_if_absent(&spec(2)).await.unwrap();

        let err = index.create_if_absent(&spec(3)).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::DimensionMismatch { expected: 2, actual: 3 }));
    }

    #[tokio::test]
    async fn test_query_orders_and_limits() {
        let index = MemoryIndex::new();
        index.create_if_absent(&spec(2)).await.unwrap();
        index
            .upsert(
                "docs",
                None,
                vec![
                    record("far", vec![0.0, 1.0]),
                    record("near", vec![1.0, 0.0]),
                    record("mid", vec![1.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        let matches = index.query("docs", None, &[1.0, 0.0], 2).await.unwrap();
        let contents: Vec<&str> = matches.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["near", "mid"]);
        assert!(matches[0].score >= matches[1].score);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let index = MemoryIndex::new();
        index.create_if_absent(&spec(2)).await.unwrap();
        index
            .upsert("docs", Some("team-a"), vec![record("a", vec![1.0, 0.0])])
            .await
            .unwrap();

        assert!(index.query("docs", None, &[1.0, 0.0], 4).await.unwrap().is_empty());
        assert_eq!(
            index.query("docs", Some("team-a"), &[1.0, 0.0], 4).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_missing_index_and_delete() {
        let index = MemoryIndex::new();
        let err = index.query("docs", None, &[1.0], 1).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::MissingIndex(_)));

        index.create_if_absent(&spec(1)).await.unwrap();
        index.upsert("docs", None, vec![record("x", vec![1.0])]).await.unwrap();
        assert_eq!(index.info("docs").await.unwrap().unwrap().vector_count, 1);

        index.delete_index("docs").await.unwrap();
        assert!(index.info("docs").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_rejects_wrong_dimension() {
        let index = MemoryIndex::new();
        index.create_if_absent(&spec(2)).await.unwrap();
        let err = index
            .upsert("docs", None, vec![record("x", vec![1.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::DimensionMismatch { expected: 2, actual: 1 }));
    }
}
