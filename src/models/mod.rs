mod chunk;
mod config;
mod message;
mod search;

pub use chunk::{
    Chunk, DEFAULT_SOURCE, Metadata, PAGE_KEY, SOURCE_KEY, ScoredChunk, metadata_from,
};
pub use config::{
    Config, Credentials, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_EMBEDDING_DIMENSION,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_GENERATION_MODEL, DEFAULT_INDEX_NAME, DEFAULT_RETRIEVAL_K,
    DEFAULT_SYSTEM_PROMPT, EmbeddingConfig, EmbeddingDriver, GenerationConfig, PipelineConfig,
    ResolvedConfig, SearchConfig, VectorDriver, VectorStoreConfig, validate_chunking,
};
pub use message::{ChatMessage, Role};
pub use search::{Answer, IngestStats, OutputFormat, SearchResults};
