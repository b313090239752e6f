//! Retrieval-augmented pipeline: ingest documents, answer questions from them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use super::chunker::TextChunker;
use super::embedding::Embedder;
use super::extractor::{ContentExtractor, ExtractedDocument, PageReader};
use super::generation::Generator;
use super::prompt::PromptTemplate;
use super::store::{StoreSettings, VectorStoreAdapter};
use super::vector_store::{IndexInfo, VectorIndex};
use crate::error::{ConfigError, ExtractError, RagError, Result};
use crate::models::{
    Answer, ChatMessage, Chunk, Credentials, IngestStats, Metadata, PAGE_KEY, PipelineConfig,
    SOURCE_KEY, ScoredChunk,
};

/// File suffixes picked up by a directory ingest when none are given.
pub const DEFAULT_EXTENSIONS: [&str; 3] = [".txt", ".md", ".pdf"];

/// The retrieval-augmented question answering pipeline.
///
/// All methods take `&self` and keep no state between calls, so one pipeline
/// can be shared behind an `Arc`.
pub struct RagPipeline {
    config: PipelineConfig,
    chunker: TextChunker,
    extractor: ContentExtractor,
    prompt: PromptTemplate,
    store: VectorStoreAdapter,
    generator: Arc<dyn Generator>,
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("generator", &self.generator.model_id())
            .finish()
    }
}

impl RagPipeline {
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &VectorStoreAdapter {
        &self.store
    }

    /// Chunk `text` and store it. Without metadata the chunks get the
    /// `direct input` source.
    pub async fn ingest_text(&self, text: &str, metadata: Option<Metadata>) -> Result<usize> {
        let metadata = metadata.unwrap_or_default();
        let chunks = self.chunker.split(text, &metadata);
        let count = self.store.add(&chunks).await.map_err(logged)?;
        info!(chunks = count, "ingested text");
        Ok(count)
    }

    /// Extract, chunk and store one file. Chunks carry the path as `source`
    /// and, for paged documents, the 0-based `page`.
    pub async fn ingest_file(&self, path: &Path) -> Result<usize> {
        let extractor = self.extractor.clone();
        let owned = path.to_path_buf();
        let document = tokio::task::spawn_blocking(move || extractor.extract_document(&owned))
            .await
            .map_err(|e| join_error(path, e))??;

        let chunks = self.chunk_document(&document);
        let count = self.store.add(&chunks).await.map_err(logged)?;
        info!(path = %path.display(), chunks = count, "ingested file");
        Ok(count)
    }

    /// Ingest every matching file under `dir` in one `add`.
    ///
    /// Files that fail to extract are skipped and counted; embedding and
    /// index failures abort the whole ingest.
    pub async fn ingest_directory<S: AsRef<str>>(
        &self,
        dir: &Path,
        extensions: &[S],
    ) -> Result<IngestStats> {
        let start = Instant::now();
        let extractor = self.extractor.clone();
        let owned = dir.to_path_buf();
        let extensions: Vec<String> = extensions.iter().map(|e| e.as_ref().to_string()).collect();

        let batch = tokio::task::spawn_blocking(move || extractor.extract_all(&owned, &extensions))
            .await
            .map_err(|e| join_error(dir, e))??;

        let chunks: Vec<Chunk> = batch
            .documents
            .iter()
            .flat_map(|document| self.chunk_document(document))
            .collect();
        let stored = self.store.add(&chunks).await.map_err(logged)?;

        let stats = IngestStats {
            files_scanned: batch.files_scanned() as u64,
            files_indexed: batch.documents.len() as u64,
            files_skipped: batch.failures.len() as u64,
            chunks_created: stored as u64,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            path = %dir.display(),
            files = stats.files_indexed,
            skipped = stats.files_skipped,
            chunks = stats.chunks_created,
            "ingested directory"
        );
        Ok(stats)
    }

    fn chunk_document(&self, document: &ExtractedDocument) -> Vec<Chunk> {
        let source = document.path.display().to_string();
        document
            .sections
            .iter()
            .flat_map(|section| {
                let mut metadata = Metadata::new();
                metadata.insert(SOURCE_KEY.to_string(), source.clone());
                if let Some(page) = section.page {
                    metadata.insert(PAGE_KEY.to_string(), page.to_string());
                }
                self.chunker.split(&section.text, &metadata)
            })
            .collect()
    }

    /// Answer `question` from the indexed documents.
    pub async fn query(&self, question: &str) -> Result<String> {
        let chunks = self.retrieve(question).await?;
        let messages = self.assemble(question, &chunks);
        self.generate(&messages).await
    }

    /// Like [`RagPipeline::query`], also returning the chunks the answer used.
    pub async fn query_with_context(&self, question: &str) -> Result<Answer> {
        let chunks = self.retrieve(question).await?;
        let messages = self.assemble(question, &chunks);
        let answer = self.generate(&messages).await?;
        Ok(Answer {
            question: question.to_string(),
            answer,
            context: chunks,
        })
    }

    /// Retrieval stage: the `retrieval_k` most similar chunks.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<Chunk>> {
        let chunks = self
            .store
            .search(question, self.config.retrieval_k)
            .await
            .map_err(logged)?;
        info!("Found {} documents", chunks.len());
        Ok(chunks)
    }

    /// Assembly stage. An empty chunk list yields an empty context block.
    pub fn assemble(&self, question: &str, chunks: &[Chunk]) -> Vec<ChatMessage> {
        self.prompt.render(question, chunks)
    }

    /// Generation stage: a single call, output returned as is.
    pub async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        self.generator
            .generate(messages)
            .await
            .map_err(|e| logged(RagError::from(e)))
    }

    /// Retrieval without generation, with similarity scores.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        self.store.search_scored(query, k).await.map_err(logged)
    }

    /// Delete the whole index. Callers must not run this alongside other calls.
    pub async fn delete_index(&self) -> Result<()> {
        self.store.delete_index().await.map_err(logged)
    }

    pub async fn index_info(&self) -> Result<Option<IndexInfo>> {
        self.store.info().await.map_err(logged)
    }
}

/// Log a capability failure once, where it leaves the pipeline.
fn logged(e: RagError) -> RagError {
    match &e {
        RagError::Embedding(inner) => error!(error = %inner, "embedding failed"),
        RagError::Generation(inner) => error!(error = %inner, "generation failed"),
        RagError::VectorStore(inner) => error!(error = %inner, "vector index operation failed"),
        RagError::Config(_) | RagError::Extract(_) => {}
    }
    e
}

fn join_error(path: &Path, e: tokio::task::JoinError) -> ExtractError {
    ExtractError::Unreadable {
        path: PathBuf::from(path),
        message: format!("extraction task failed: {e}"),
    }
}

/// Builder for [`RagPipeline`].
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<PipelineConfig>,
    credentials: Option<Credentials>,
    embedder: Option<Arc<dyn Embedder>>,
    generator: Option<Arc<dyn Generator>>,
    index: Option<Arc<dyn VectorIndex>>,
    extractor: Option<ContentExtractor>,
    separators: Option<Vec<String>>,
    embedding_batch_size: Option<usize>,
}

impl RagPipelineBuilder {
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Reader used for `.pdf` files.
    pub fn page_reader(mut self, reader: Arc<dyn PageReader>) -> Self {
        self.extractor = Some(ContentExtractor::with_page_reader(reader));
        self
    }

    pub fn extractor(mut self, extractor: ContentExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = Some(separators.into_iter().map(Into::into).collect());
        self
    }

    pub fn embedding_batch_size(mut self, batch_size: usize) -> Self {
        self.embedding_batch_size = Some(batch_size);
        self
    }

    /// Validate everything, then connect to the index.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an invalid config, a missing capability or
    /// a missing credential; none of these touch a capability.
    pub async fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let embedder = self
            .embedder
            .ok_or_else(|| ConfigError::Invalid("embedder is required".to_string()))?;
        let generator = self
            .generator
            .ok_or_else(|| ConfigError::Invalid("generator is required".to_string()))?;
        let index = self
            .index
            .ok_or_else(|| ConfigError::Invalid("vector index is required".to_string()))?;
        let credentials = self.credentials.unwrap_or_default();
        credentials.generation_key()?;

        let mut chunker = TextChunker::from_config(&config)?;
        if let Some(separators) = self.separators {
            chunker = chunker.with_separators(separators);
        }

        let mut settings = StoreSettings::from_pipeline(&config);
        if let Some(batch_size) = self.embedding_batch_size {
            settings = settings.with_batch_size(batch_size);
        }
        let store = VectorStoreAdapter::connect(settings, &credentials, embedder, index).await?;

        Ok(RagPipeline {
            prompt: PromptTemplate::new(config.system_prompt.clone()),
            chunker,
            extractor: self
                .extractor
                .unwrap_or_else(ContentExtractor::with_default_readers),
            store,
            generator,
            config,
        })
    }
}
