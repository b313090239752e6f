use anyhow::{Context, Result};
use clap::Args;
use std::time::Instant;

use crate::cli::bootstrap::Session;
use crate::cli::output::get_formatter;
use crate::models::SearchResults;

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(required = true, help = "Search query text")]
    pub query: String,

    #[arg(
        long,
        short = 'k',
        help = "Maximum number of results to return (defaults to retrieval_k)"
    )]
    pub limit: Option<usize>,
}

pub async fn handle_search(args: SearchArgs, session: &Session) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("search query cannot be empty");
    }

    let limit = args.limit.unwrap_or(session.config.pipeline.retrieval_k);
    if limit == 0 {
        anyhow::bail!("limit must be at least 1");
    }

    let formatter = get_formatter(session.format);
    let pipeline = session.pipeline().await?;

    if session.verbose {
        eprintln!("Query: \"{query}\"");
        eprintln!("  Limit: {limit}");
    }

    let start_time = Instant::now();
    let results = pipeline
        .search(query, limit)
        .await
        .context("search failed")?;
    let duration_ms = start_time.elapsed().as_millis() as u64;

    let search_results = SearchResults::new(query.to_string(), results, duration_ms);
    print!("{}", formatter.format_search_results(&search_results));

    Ok(())
}
