use anyhow::{Context, Result};

use crate::cli::bootstrap::Session;
use crate::cli::output::get_formatter;
use crate::error::VectorStoreError;
use crate::services::create_index;

pub async fn handle_reset(force: bool, session: &Session) -> Result<()> {
    let formatter = get_formatter(session.format);
    let index_name = &session.config.pipeline.index_name;

    if !force {
        println!(
            "This will delete index '{}' and every vector stored in it. Continue? [y/N]",
            index_name
        );
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("{}", formatter.format_message("Cancelled."));
            return Ok(());
        }
    }

    let credentials = session.credentials();
    let index = create_index(
        &session.config.vector_store,
        credentials.index_api_key.as_deref(),
    )
    .context("failed to create vector index client")?;

    match index.delete_index(index_name).await {
        Ok(()) => println!(
            "{}",
            formatter.format_message(&format!("Index '{}' has been deleted.", index_name))
        ),
        Err(VectorStoreError::MissingIndex(name)) => println!(
            "{}",
            formatter.format_message(&format!("Index '{}' does not exist.", name))
        ),
        Err(e) => return Err(e).context("failed to delete index"),
    }

    Ok(())
}
