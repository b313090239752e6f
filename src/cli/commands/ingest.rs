//! Ingest command implementation.

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::PathBuf;

use crate::cli::bootstrap::Session;
use crate::cli::output::get_formatter;
use crate::models::{Metadata, SOURCE_KEY};
use crate::services::DEFAULT_EXTENSIONS;

#[derive(Debug, Subcommand)]
pub enum IngestCommand {
    /// Add raw text
    Text {
        #[arg(required = true, help = "Text to add")]
        text: String,

        /// Source label stored with the chunks
        #[arg(long, short = 's')]
        source: Option<String>,
    },

    /// Add one or more files (.txt, .md, .pdf or any text file)
    File {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Add every matching file under a directory
    Dir {
        #[arg(required = true)]
        path: PathBuf,

        /// File extensions to include (can be specified multiple times)
        #[arg(long, short = 'e')]
        ext: Vec<String>,
    },
}

pub async fn handle_ingest(cmd: IngestCommand, session: &Session) -> Result<()> {
    match cmd {
        IngestCommand::Text { text, source } => handle_text(text, source, session).await,
        IngestCommand::File { paths } => handle_files(paths, session).await,
        IngestCommand::Dir { path, ext } => handle_dir(path, ext, session).await,
    }
}

async fn handle_text(text: String, source: Option<String>, session: &Session) -> Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("text cannot be empty");
    }

    let formatter = get_formatter(session.format);
    let pipeline = session.pipeline().await?;

    let metadata = source.map(|source| Metadata::from([(SOURCE_KEY.to_string(), source)]));
    let label = metadata
        .as_ref()
        .and_then(|m| m.get(SOURCE_KEY).cloned())
        .unwrap_or_else(|| "text input".to_string());

    let count = pipeline
        .ingest_text(&text, metadata)
        .await
        .context("failed to add text")?;

    println!("{}", formatter.format_ingested(&label, count));
    Ok(())
}

async fn handle_files(paths: Vec<PathBuf>, session: &Session) -> Result<()> {
    let formatter = get_formatter(session.format);
    let pipeline = session.pipeline().await?;

    let mut failed = 0usize;
    for path in &paths {
        match pipeline.ingest_file(path).await {
            Ok(count) => {
                println!("{}", formatter.format_ingested(&path.display().to_string(), count));
            }
            Err(e) => {
                failed += 1;
                let message = formatter.format_error(&format!("{}: {}", path.display(), e));
                eprintln!("{}", message.trim_end());
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} files could not be added", failed, paths.len());
    }
    Ok(())
}

async fn handle_dir(path: PathBuf, ext: Vec<String>, session: &Session) -> Result<()> {
    if !path.is_dir() {
        anyhow::bail!("not a directory: {}", path.display());
    }

    let formatter = get_formatter(session.format);
    let pipeline = session.pipeline().await?;

    let extensions: Vec<String> = if ext.is_empty() {
        DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect()
    } else {
        ext
    };

    if session.verbose {
        eprintln!(
            "Scanning {} for: {}",
            path.display(),
            extensions.join(", ")
        );
    }

    let stats = pipeline
        .ingest_directory(&path, &extensions)
        .await
        .with_context(|| format!("failed to ingest {}", path.display()))?;

    print!("{}", formatter.format_ingest_stats(&stats));
    Ok(())
}
