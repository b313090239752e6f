//! CLI module for the question answering pipeline.

pub mod bootstrap;
pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Ask questions about your documents, answered from a vector index.
#[derive(Debug, Parser)]
#[command(name = "ragent")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(long, short = 'f', global = true, help = "Output format: text or json")]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        env = "RAGENT_INDEX",
        help = "Index name (overrides config)"
    )]
    pub index: Option<String>,

    #[arg(
        long,
        global = true,
        env = "RAGENT_NAMESPACE",
        help = "Namespace inside the index (overrides config)"
    )]
    pub namespace: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add text, files or directories to the index
    #[command(subcommand)]
    Ingest(commands::IngestCommand),

    /// Ask a question about the indexed documents
    Ask(commands::AskArgs),

    /// Show the chunks most similar to a query, without generating an answer
    Search(commands::SearchArgs),

    /// Ask questions interactively, one per line
    Chat,

    /// Check the vector index and show configuration in use
    Status,

    /// Delete the index and everything stored in it
    Reset {
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        force: bool,
    },

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_global_flags() {
        let cli = Cli::try_parse_from([
            "ragent",
            "ask",
            "What color is the sky?",
            "--show-context",
            "--retries",
            "2",
            "--format",
            "json",
            "--namespace",
            "team",
        ])
        .unwrap();

        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.namespace.as_deref(), Some("team"));
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.question, "What color is the sky?");
                assert!(args.show_context);
                assert_eq!(args.retries, 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_ingest_dir_extensions() {
        let cli = Cli::try_parse_from(["ragent", "ingest", "dir", "docs", "--ext", ".md", "--ext", "txt"])
            .unwrap();
        match cli.command {
            Commands::Ingest(commands::IngestCommand::Dir { path, ext }) => {
                assert_eq!(path.to_string_lossy(), "docs");
                assert_eq!(ext, vec![".md".to_string(), "txt".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
