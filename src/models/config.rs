use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::search::OutputFormat;
use crate::error::ConfigError;

pub const DEFAULT_INDEX_NAME: &str = "langchain-rag-demo";
pub const DEFAULT_EMBEDDING_MODEL: &str = "multilingual-e5-large";
pub const DEFAULT_EMBEDDING_DIMENSION: u64 = 1024;
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_RETRIEVAL_K: usize = 4;

pub const DEFAULT_PINECONE_URL: &str = "https://api.pinecone.io";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GENERATION_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GENERATION_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

pub const EMBEDDING_API_KEY_ENV: &str = "EMBEDDING_API_KEY";
pub const PINECONE_API_KEY_ENV: &str = "PINECONE_API_KEY";
pub const GENERATION_API_KEY_ENV: &str = "GENERATION_API_KEY";
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";
pub const INDEX_API_KEY_ENV: &str = "QDRANT_API_KEY";

/// Default instruction given to the model ahead of the retrieved context.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions based on the provided context.
If you don't know the answer or can't find it in the context, say so instead of making up information.
Always cite your sources when possible.";

const CONFIG_DIR_NAME: &str = "ragent";
const PROJECT_CONFIG_DIR: &str = ".ragent";
const CONFIG_FILE_NAME: &str = "config.toml";

/// File-backed configuration for the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

/// A loaded configuration plus the files it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: Config,
    pub project_path: Option<PathBuf>,
    pub global_path: Option<PathBuf>,
}

impl Config {
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn project_config_dir() -> Option<PathBuf> {
        std::env::current_dir()
            .ok()
            .map(|p| p.join(PROJECT_CONFIG_DIR))
    }

    pub fn project_path() -> Option<PathBuf> {
        Self::project_config_dir().map(|p| p.join(CONFIG_FILE_NAME))
    }

    /// Load the project config if present, else the global one, else defaults.
    pub fn load() -> Result<ResolvedConfig, ConfigError> {
        let project_path = Self::project_path().filter(|p| p.exists());
        let global_path = Self::global_path().filter(|p| p.exists());

        let config = match project_path.as_ref().or(global_path.as_ref()) {
            Some(path) => Self::load_from(path)?,
            None => Self::default(),
        };

        Ok(ResolvedConfig {
            config,
            project_path,
            global_path,
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn init_global() -> Result<PathBuf, ConfigError> {
        let path = Self::global_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;
        Self::default().save_to(&path)?;
        Ok(path)
    }

    pub fn init_project() -> Result<PathBuf, ConfigError> {
        let path = Self::project_path().ok_or_else(|| {
            ConfigError::PathError("could not determine current directory".to_string())
        })?;
        Self::default().save_to(&path)?;
        Ok(path)
    }
}

/// Settings fixed for the lifetime of one pipeline instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_index_name")]
    pub index_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: u64,

    #[serde(default = "default_embedding_model")]
    pub embedding_model_id: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,
}

fn default_index_name() -> String {
    DEFAULT_INDEX_NAME.to_string()
}

fn default_embedding_dimension() -> u64 {
    DEFAULT_EMBEDDING_DIMENSION
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_retrieval_k() -> usize {
    DEFAULT_RETRIEVAL_K
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            index_name: default_index_name(),
            namespace: None,
            embedding_dimension: default_embedding_dimension(),
            embedding_model_id: default_embedding_model(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            system_prompt: default_system_prompt(),
            retrieval_k: default_retrieval_k(),
        }
    }
}

impl PipelineConfig {
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    pub fn with_embedding(mut self, model_id: impl Into<String>, dimension: u64) -> Self {
        self.embedding_model_id = model_id.into();
        self.embedding_dimension = dimension;
        self
    }

    pub fn with_retrieval_k(mut self, k: usize) -> Self {
        self.retrieval_k = k;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Namespace used for index calls; an unset or blank namespace is the default one.
    pub fn effective_namespace(&self) -> Option<&str> {
        self.namespace
            .as_deref()
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index_name.trim().is_empty() {
            return Err(ConfigError::Invalid("index_name must not be empty".into()));
        }
        if self.embedding_model_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "embedding_model_id must not be empty".into(),
            ));
        }
        if self.embedding_dimension == 0 {
            return Err(ConfigError::Invalid(
                "embedding_dimension must be at least 1".into(),
            ));
        }
        if self.retrieval_k == 0 {
            return Err(ConfigError::Invalid("retrieval_k must be at least 1".into()));
        }
        validate_chunking(self.chunk_size, self.chunk_overlap)
    }
}

/// Chunk sizes must leave a positive stride between consecutive chunks.
pub fn validate_chunking(chunk_size: usize, chunk_overlap: usize) -> Result<(), ConfigError> {
    if chunk_size == 0 {
        return Err(ConfigError::Invalid("chunk_size must be at least 1".into()));
    }
    if chunk_overlap >= chunk_size {
        return Err(ConfigError::Invalid(format!(
            "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingDriver {
    /// Pinecone hosted inference (`/embed`)
    #[default]
    Pinecone,
    /// Any OpenAI-compatible `/embeddings` endpoint
    OpenAi,
}

impl std::fmt::Display for EmbeddingDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingDriver::Pinecone => write!(f, "pinecone"),
            EmbeddingDriver::OpenAi => write!(f, "openai"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub driver: EmbeddingDriver,

    /// Base URL; defaults depend on the driver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Prefix inputs with `query: ` / `passage: ` (e5-family models on OpenAI-compatible servers).
    #[serde(default)]
    pub input_prefixes: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_timeout() -> u64 {
    120
}

fn default_batch_size() -> usize {
    32
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            driver: EmbeddingDriver::default(),
            url: None,
            timeout_secs: default_timeout(),
            batch_size: default_batch_size(),
            input_prefixes: false,
            api_key: None,
        }
    }
}

impl EmbeddingConfig {
    pub fn base_url(&self) -> &str {
        match (&self.url, self.driver) {
            (Some(url), _) => url,
            (None, EmbeddingDriver::Pinecone) => DEFAULT_PINECONE_URL,
            (None, EmbeddingDriver::OpenAi) => DEFAULT_OPENAI_URL,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_url")]
    pub url: String,

    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_generation_url() -> String {
    DEFAULT_GENERATION_URL.to_string()
}

fn default_generation_model() -> String {
    DEFAULT_GENERATION_MODEL.to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            url: default_generation_url(),
            model: default_generation_model(),
            temperature: None,
            max_tokens: None,
            timeout_secs: default_timeout(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorDriver {
    #[default]
    Qdrant,
    /// Process-local index; contents vanish when the process exits.
    Memory,
}

impl std::fmt::Display for VectorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorDriver::Qdrant => write!(f, "qdrant"),
            VectorDriver::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub driver: VectorDriver,

    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            driver: VectorDriver::default(),
            url: default_qdrant_url(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub default_format: OutputFormat,
}

/// Secrets the pipeline needs at construction time.
///
/// The core never reads the environment itself; the CLI resolves these with
/// [`Credentials::resolve`] and hands them over explicitly.
#[derive(Clone, Default)]
pub struct Credentials {
    pub embedding_api_key: Option<String>,
    pub generation_api_key: Option<String>,
    pub index_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn mask(value: &Option<String>) -> &'static str {
            if value.is_some() { "<set>" } else { "<unset>" }
        }
        f.debug_struct("Credentials")
            .field("embedding_api_key", &mask(&self.embedding_api_key))
            .field("generation_api_key", &mask(&self.generation_api_key))
            .field("index_api_key", &mask(&self.index_api_key))
            .finish()
    }
}

impl Credentials {
    pub fn new(
        embedding_api_key: impl Into<String>,
        generation_api_key: impl Into<String>,
        index_api_key: impl Into<String>,
    ) -> Self {
        Self {
            embedding_api_key: Some(embedding_api_key.into()),
            generation_api_key: Some(generation_api_key.into()),
            index_api_key: Some(index_api_key.into()),
        }
    }

    /// Resolve credentials from the config file, then the process environment.
    pub fn resolve(config: &Config) -> Self {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    /// Same as [`Credentials::resolve`] with an injectable variable lookup.
    pub fn resolve_with(config: &Config, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let first = |names: &[&str]| names.iter().find_map(|name| lookup(name));

        Self {
            embedding_api_key: non_blank(
                config
                    .embedding
                    .api_key
                    .clone()
                    .or_else(|| first(&[EMBEDDING_API_KEY_ENV, PINECONE_API_KEY_ENV])),
            ),
            generation_api_key: non_blank(
                config
                    .generation
                    .api_key
                    .clone()
                    .or_else(|| first(&[GENERATION_API_KEY_ENV, GROQ_API_KEY_ENV])),
            ),
            index_api_key: non_blank(
                config
                    .vector_store
                    .api_key
                    .clone()
                    .or_else(|| first(&[INDEX_API_KEY_ENV])),
            ),
        }
    }

    pub fn embedding_key(&self) -> Result<&str, ConfigError> {
        require(&self.embedding_api_key, EMBEDDING_API_KEY_ENV)
    }

    pub fn generation_key(&self) -> Result<&str, ConfigError> {
        require(&self.generation_api_key, GENERATION_API_KEY_ENV)
    }

    pub fn index_key(&self) -> Result<&str, ConfigError> {
        require(&self.index_api_key, INDEX_API_KEY_ENV)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn require<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingCredential(name))
}
