//! Qdrant vector index backend implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, PointStruct, SearchPointsBuilder, Struct,
    UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use tracing::debug;

use super::{IndexInfo, IndexMatch, IndexRecord, IndexSpec, VectorIndex};
use crate::error::VectorStoreError;
use crate::models::Metadata;

const CONTENT_FIELD: &str = "content";
const NAMESPACE_FIELD: &str = "namespace";
const METADATA_FIELD: &str = "metadata";
const INGESTED_AT_FIELD: &str = "ingested_at";

/// Qdrant vector index. Each index is a collection with cosine distance.
pub struct QdrantIndex {
    client: Qdrant,
    url: String,
}

impl QdrantIndex {
    pub fn new(url: &str, api_key: Option<&str>) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(url);

        if let Some(api_key) = api_key {
            builder = builder.api_key(api_key.to_string());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn namespace_filter(namespace: Option<&str>) -> Filter {
        Filter::must([Condition::matches(
            NAMESPACE_FIELD,
            namespace.unwrap_or_default().to_string(),
        )])
    }

    fn to_point(record: IndexRecord, namespace: &str, ingested_at: &str) -> PointStruct {
        let metadata: HashMap<String, Value> = record
            .metadata
            .into_iter()
            .map(|(k, v)| (k, v.into()))
            .collect();

        let mut payload: HashMap<String, Value> = HashMap::new();
        payload.insert(CONTENT_FIELD.to_string(), record.content.into());
        payload.insert(NAMESPACE_FIELD.to_string(), namespace.to_string().into());
        payload.insert(
            METADATA_FIELD.to_string(),
            Value {
                kind: Some(Kind::StructValue(Struct { fields: metadata })),
            },
        );
        payload.insert(INGESTED_AT_FIELD.to_string(), ingested_at.to_string().into());

        PointStruct::new(record.id, record.vector, payload)
    }

    fn extract_string(value: &Value) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn extract_metadata(value: &Value) -> Metadata {
        match &value.kind {
            Some(Kind::StructValue(s)) => s
                .fields
                .iter()
                .filter_map(|(k, v)| Self::extract_string(v).map(|s| (k.clone(), s)))
                .collect(),
            _ => Metadata::new(),
        }
    }
}

fn is_not_found(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    msg.contains("not found") || msg.contains("doesn't exist") || msg.contains("does not exist")
}

fn is_already_exists(msg: &str) -> bool {
    msg.to_lowercase().contains("already exists")
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn info(&self, name: &str) -> Result<Option<IndexInfo>, VectorStoreError> {
        match self.client.collection_info(name).await {
            Ok(response) => {
                let info = response.result;
                let vector_count = info.as_ref().and_then(|r| r.points_count).unwrap_or(0);
                let dimension = info
                    .and_then(|r| r.config)
                    .and_then(|c| c.params)
                    .and_then(|p| p.vectors_config)
                    .and_then(|v| v.config)
                    .and_then(|config| match config {
                        VectorsConfigKind::Params(params) => Some(params.size),
                        VectorsConfigKind::ParamsMap(_) => None,
                    });

                Ok(Some(IndexInfo {
                    name: name.to_string(),
                    dimension,
                    vector_count,
                }))
            }
            Err(e) => {
                let msg = e.to_string();
                if is_not_found(&msg) {
                    Ok(None)
                } else {
                    Err(VectorStoreError::CollectionError(msg))
                }
            }
        }
    }

    async fn create_if_absent(&self, spec: &IndexSpec) -> Result<(), VectorStoreError> {
        if let Some(existing) = self.info(&spec.name).await? {
            return match existing.dimension {
                Some(dimension) if dimension != spec.dimension => {
                    Err(VectorStoreError::DimensionMismatch {
                        expected: dimension,
                        actual: spec.dimension,
                    })
                }
                _ => {
                    debug!(collection = %spec.name, "qdrant collection already exists");
                    Ok(())
                }
            };
        }

        let create_collection = CreateCollectionBuilder::new(&spec.name)
            .vectors_config(VectorParamsBuilder::new(spec.dimension, Distance::Cosine));

        if let Err(e) = self.client.create_collection(create_collection).await {
            let msg = e.to_string();
            if is_already_exists(&msg) {
                // Another writer created it between the lookup and the create
                debug!(collection = %spec.name, "qdrant collection created concurrently");
                return Ok(());
            }
            return Err(VectorStoreError::CollectionError(msg));
        }

        debug!(
            collection = %spec.name,
            dimension = spec.dimension,
            model = %spec.embedding_model,
            "created qdrant collection"
        );
        Ok(())
    }

    async fn upsert(
        &self,
        name: &str,
        namespace: Option<&str>,
        records: Vec<IndexRecord>,
    ) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let count = records.len();
        let namespace = namespace.unwrap_or_default();
        let ingested_at = chrono::Utc::now().to_rfc3339();
        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|record| Self::to_point(record, namespace, &ingested_at))
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(name, points).wait(true))
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if is_not_found(&msg) {
                    VectorStoreError::MissingIndex(name.to_string())
                } else {
                    VectorStoreError::UpsertError(msg)
                }
            })?;

        debug!(collection = name, namespace, count, "upserted points");
        Ok(())
    }

    async fn query(
        &self,
        name: &str,
        namespace: Option<&str>,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<IndexMatch>, VectorStoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let search = SearchPointsBuilder::new(name, vector.to_vec(), k as u64)
            .filter(Self::namespace_filter(namespace))
            .with_payload(true);

        let response = self.client.search_points(search).await.map_err(|e| {
            let msg = e.to_string();
            if is_not_found(&msg) {
                VectorStoreError::MissingIndex(name.to_string())
            } else {
                VectorStoreError::SearchError(msg)
            }
        })?;

        let matches = response
            .result
            .into_iter()
            .map(|point| IndexMatch {
                content: point
                    .payload
                    .get(CONTENT_FIELD)
                    .and_then(Self::extract_string)
                    .unwrap_or_default(),
                metadata: point
                    .payload
                    .get(METADATA_FIELD)
                    .map(Self::extract_metadata)
                    .unwrap_or_default(),
                score: point.score,
            })
            .collect();

        Ok(matches)
    }

    async fn delete_index(&self, name: &str) -> Result<(), VectorStoreError> {
        if self.info(name).await?.is_none() {
            return Err(VectorStoreError::MissingIndex(name.to_string()));
        }

        self.client
            .delete_collection(name)
            .await
            .map_err(|e| VectorStoreError::DeleteError(e.to_string()))?;

        debug!(collection = name, "deleted qdrant collection");
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "qdrant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Chunk, metadata_from};

    #[test]
    fn test_point_payload_layout() {
        let chunk = Chunk::new("hello", metadata_from([("source", "a.pdf"), ("page", "2")]));
        let record = IndexRecord::new(vec![0.1, 0.2], chunk);
        let point = QdrantIndex::to_point(record, "team", "2026-01-01T00:00:00Z");

        assert_eq!(
            point.payload.get(CONTENT_FIELD).and_then(QdrantIndex::extract_string),
            Some("hello".to_string())
        );
        assert_eq!(
            point.payload.get(NAMESPACE_FIELD).and_then(QdrantIndex::extract_string),
            Some("team".to_string())
        );
        let metadata = point
            .payload
            .get(METADATA_FIELD)
            .map(QdrantIndex::extract_metadata)
            .unwrap();
        assert_eq!(metadata.get("page").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_not_found_detection() {
        assert!(is_not_found("Collection `docs` doesn't exist!"));
        assert!(is_not_found("Not found: collection docs"));
        assert!(!is_not_found("connection refused"));
    }

    #[test]
    fn test_already_exists_detection() {
        assert!(is_already_exists(
            "Wrong input: Collection `docs` already exists!"
        ));
        assert!(!is_already_exists("Collection `docs` doesn't exist!"));
        assert!(!is_already_exists("connection refused"));
    }

    #[test]
    fn test_client_creation() {
        let index = QdrantIndex::new("http://localhost:6334", Some("key")).unwrap();
        assert_eq!(index.url(), "http://localhost:6334");
        assert_eq!(index.backend(), "qdrant");
    }
}
