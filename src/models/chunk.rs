use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata attached to a chunk. Ordered so that payloads and output are stable.
pub type Metadata = BTreeMap<String, String>;

/// Metadata key identifying where a chunk came from.
pub const SOURCE_KEY: &str = "source";

/// Metadata key holding the 0-based page index of a chunk from a paged document.
pub const PAGE_KEY: &str = "page";

/// Source label used when text is ingested without one.
pub const DEFAULT_SOURCE: &str = "direct input";

/// A bounded span of source text plus provenance metadata.
///
/// Chunks are immutable once built; the only way to change one is to build a
/// new chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    content: String,
    metadata: Metadata,
}

impl Chunk {
    /// Build a chunk, filling in [`DEFAULT_SOURCE`] when `metadata` has no source.
    pub fn new(content: impl Into<String>, mut metadata: Metadata) -> Self {
        metadata
            .entry(SOURCE_KEY.to_string())
            .or_insert_with(|| DEFAULT_SOURCE.to_string());
        Self {
            content: content.into(),
            metadata,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn source(&self) -> &str {
        self.metadata
            .get(SOURCE_KEY)
            .map_or(DEFAULT_SOURCE, String::as_str)
    }

    pub fn page(&self) -> Option<usize> {
        self.metadata.get(PAGE_KEY).and_then(|p| p.parse().ok())
    }

    /// Length in Unicode scalar values, the unit chunk sizes are measured in.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn into_parts(self) -> (String, Metadata) {
        (self.content, self.metadata)
    }
}

/// A retrieved chunk with its similarity score (higher is closer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Build metadata from `(key, value)` pairs.
pub fn metadata_from<K, V, I>(pairs: I) -> Metadata
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
