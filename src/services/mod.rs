mod chunker;
mod embedding;
mod extractor;
mod generation;
mod pipeline;
mod prompt;
mod store;
mod vector_store;

pub use chunker::{DEFAULT_SEPARATORS, TextChunker, stitch_spans};
pub use embedding::{Embedder, InputKind, OpenAiEmbedder, PineconeEmbedder, create_embedder};
#[cfg(feature = "pdf")]
pub use extractor::LopdfPageReader;
pub use extractor::{
    BatchExtraction, ContentExtractor, ExtractFailure, ExtractedDocument, PageReader, Section,
};
pub use generation::{ChatCompletionsGenerator, Generator, create_generator};
pub use pipeline::{DEFAULT_EXTENSIONS, RagPipeline, RagPipelineBuilder};
pub use prompt::{CONTEXT_SEPARATOR, PromptTemplate};
pub use store::{DEFAULT_EMBEDDING_BATCH_SIZE, StoreSettings, VectorStoreAdapter};
pub use vector_store::{
    IndexInfo, IndexMatch, IndexRecord, IndexSpec, MemoryIndex, QdrantIndex, VectorIndex,
    create_index,
};
