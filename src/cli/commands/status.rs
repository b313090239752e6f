use anyhow::Result;

use crate::cli::bootstrap::Session;
use crate::cli::output::{StatusInfo, get_formatter};
use crate::error::ConfigError;
use crate::models::VectorDriver;
use crate::services::create_index;

pub async fn handle_status(session: &Session) -> Result<()> {
    let config = &session.config;
    let formatter = get_formatter(session.format);
    let credentials = session.credentials();

    let (vector_store_connected, index_info) =
        match create_index(&config.vector_store, credentials.index_api_key.as_deref()) {
            Ok(index) => {
                let connected = index.health_check().await.unwrap_or(false);
                let info = if connected {
                    index
                        .info(&config.pipeline.index_name)
                        .await
                        .ok()
                        .flatten()
                } else {
                    None
                };
                (connected, info)
            }
            Err(_) => (false, None),
        };

    let status = StatusInfo {
        index_name: config.pipeline.index_name.clone(),
        namespace: config.pipeline.effective_namespace().map(str::to_string),
        embedding_driver: config.embedding.driver.to_string(),
        embedding_model: config.pipeline.embedding_model_id.clone(),
        generation_model: config.generation.model.clone(),
        vector_store_driver: config.vector_store.driver.to_string(),
        vector_store_url: config.vector_store.url.clone(),
        vector_store_connected,
        index_exists: index_info.is_some(),
        vector_count: index_info.map_or(0, |info| info.vector_count),
    };

    print!("{}", formatter.format_status(&status));

    let missing: Vec<&str> = [
        credentials.embedding_key().err(),
        credentials.generation_key().err(),
        credentials.index_key().err(),
    ]
    .into_iter()
    .flatten()
    .map(|e| match e {
        ConfigError::MissingCredential(name) => name,
        _ => "credential",
    })
    .collect();

    if !vector_store_connected || !missing.is_empty() {
        eprintln!();
        if !vector_store_connected && config.vector_store.driver == VectorDriver::Qdrant {
            eprintln!("Warning: Qdrant not reachable at {}", config.vector_store.url);
        }
        if !missing.is_empty() {
            eprintln!("Warning: missing credentials: {}", missing.join(", "));
        }
    }

    Ok(())
}
