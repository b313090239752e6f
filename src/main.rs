use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use ragent::cli::bootstrap::Session;
use ragent::cli::commands::{
    handle_ask, handle_chat, handle_config, handle_ingest, handle_reset, handle_search,
    handle_status,
};
use ragent::cli::{Cli, Commands};
use ragent::models::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match Config::load() {
        Ok(resolved) => resolved.config,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config file, using defaults");
            Config::default()
        }
    };
    let session = Session::new(config, cli.format, cli.verbose, cli.index, cli.namespace);

    tokio::select! {
        result = run_command(cli.command, &session) => {
            result?;
        }
        _ = shutdown_signal() => {
            eprintln!("\nReceived shutdown signal, cleaning up...");
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
    }

    Ok(())
}

/// Logs go to stderr so that stdout stays clean for answers and JSON.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "ragent=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_command(command: Commands, session: &Session) -> Result<()> {
    match command {
        Commands::Ingest(cmd) => handle_ingest(cmd, session).await,
        Commands::Ask(args) => handle_ask(args, session).await,
        Commands::Search(args) => handle_search(args, session).await,
        Commands::Chat => handle_chat(session).await,
        Commands::Status => handle_status(session).await,
        Commands::Reset { force } => handle_reset(force, session).await,
        Commands::Config(cmd) => handle_config(cmd, session).await,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
