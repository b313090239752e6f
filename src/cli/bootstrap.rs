//! Builds a pipeline from configuration and the environment.

use anyhow::{Context, Result};

use crate::models::{Config, Credentials, OutputFormat};
use crate::services::{RagPipeline, create_embedder, create_generator, create_index};

/// Settings shared by every command of one invocation.
#[derive(Debug, Clone)]
pub struct Session {
    pub config: Config,
    pub format: OutputFormat,
    pub verbose: bool,
}

impl Session {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn new(
        mut config: Config,
        format: Option<OutputFormat>,
        verbose: bool,
        index: Option<String>,
        namespace: Option<String>,
    ) -> Self {
        if let Some(index) = index {
            config.pipeline.index_name = index;
        }
        if let Some(namespace) = namespace {
            config.pipeline.namespace = Some(namespace);
        }
        let format = format.unwrap_or(config.search.default_format);

        Self {
            config,
            format,
            verbose,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::resolve(&self.config)
    }

    /// Construct the pipeline. Missing credentials surface as configuration
    /// errors before any provider is contacted.
    pub async fn pipeline(&self) -> Result<RagPipeline> {
        let config = &self.config;
        let credentials = self.credentials();

        let embedder = create_embedder(
            &config.embedding,
            &config.pipeline.embedding_model_id,
            credentials.embedding_api_key.as_deref().unwrap_or_default(),
        )
        .context("failed to create embedding client")?;
        let generator = create_generator(
            &config.generation,
            credentials.generation_api_key.as_deref().unwrap_or_default(),
        )
        .context("failed to create generation client")?;
        let index = create_index(&config.vector_store, credentials.index_api_key.as_deref())
            .context("failed to create vector index client")?;

        RagPipeline::builder()
            .config(config.pipeline.clone())
            .credentials(credentials)
            .embedder(embedder)
            .generator(generator)
            .index(index)
            .embedding_batch_size(config.embedding.batch_size)
            .build()
            .await
            .context("failed to initialize pipeline")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let session = Session::new(
            Config::default(),
            None,
            false,
            Some("docs".to_string()),
            Some("team".to_string()),
        );
        assert_eq!(session.config.pipeline.index_name, "docs");
        assert_eq!(session.config.pipeline.effective_namespace(), Some("team"));
        assert_eq!(session.format, OutputFormat::Text);
    }

    #[test]
    fn test_format_falls_back_to_config() {
        let mut config = Config::default();
        config.search.default_format = OutputFormat::Json;
        let session = Session::new(config, None, false, None, None);
        assert_eq!(session.format, OutputFormat::Json);
    }
}
