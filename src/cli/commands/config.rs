use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::bootstrap::Session;
use crate::cli::output::{Formatter, get_formatter};
use crate::models::{Config, OutputFormat};

const MASK: &str = "********";

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Initialize configuration file")]
    Init {
        #[arg(
            long,
            short = 'g',
            help = "Create global config instead of project config"
        )]
        global: bool,
        #[arg(long, short = 'f', help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Show configuration file paths")]
    Path {
        #[arg(long, help = "Show all possible config paths")]
        all: bool,
    },
}

pub async fn handle_config(cmd: ConfigCommand, session: &Session) -> Result<()> {
    let formatter = get_formatter(session.format);

    match cmd {
        ConfigCommand::Init { global, force } => handle_init(global, force, formatter.as_ref()),
        ConfigCommand::Show => handle_show(session),
        ConfigCommand::Path { all } => handle_path(all),
    }
}

fn handle_init(global: bool, force: bool, formatter: &dyn Formatter) -> Result<()> {
    let (path, scope) = if global {
        let path = Config::global_path()
            .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;
        (path, "global")
    } else {
        let path = Config::project_path()
            .ok_or_else(|| anyhow::anyhow!("could not determine project directory"))?;
        (path, "project")
    };

    if path.exists() && !force {
        anyhow::bail!(
            "{} config already exists at: {}\nUse --force to overwrite.",
            scope,
            path.display()
        );
    }

    let created = if global {
        Config::init_global()
    } else {
        Config::init_project()
    }
    .with_context(|| format!("failed to create {scope} config"))?;

    println!(
        "{}",
        formatter.format_message(&format!("Created {} config at: {}", scope, created.display()))
    );
    Ok(())
}

/// Prints the effective configuration (file values plus command-line
/// overrides) with secrets masked.
fn handle_show(session: &Session) -> Result<()> {
    let config = masked(&session.config);

    if session.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if let Ok(resolved) = Config::load() {
        if let Some(ref path) = resolved.project_path {
            println!("# Project config: {}", path.display());
        }
        if let Some(ref path) = resolved.global_path {
            println!("# Global config: {}", path.display());
        }
    }
    println!();
    print!("{}", toml::to_string_pretty(&config)?);

    Ok(())
}

fn masked(config: &Config) -> Config {
    let mut config = config.clone();
    for key in [
        &mut config.embedding.api_key,
        &mut config.generation.api_key,
        &mut config.vector_store.api_key,
    ] {
        if key.is_some() {
            *key = Some(MASK.to_string());
        }
    }
    config
}

fn handle_path(show_all: bool) -> Result<()> {
    let project_path = Config::project_path();
    let global_path = Config::global_path();

    println!("Configuration paths:");
    println!();

    if let Some(ref path) = project_path {
        if path.exists() {
            println!("Project config (active): {}", path.display());
        } else if show_all {
            println!("Project config (would be): {}", path.display());
        }
    }

    if let Some(ref path) = global_path {
        if path.exists() {
            println!("Global config (active): {}", path.display());
        } else if show_all {
            println!("Global config (would be): {}", path.display());
        }
    }

    if show_all && let Ok(cwd) = std::env::current_dir() {
        let env_path = cwd.join(".env");
        if env_path.exists() {
            println!(".env file (active): {}", env_path.display());
        } else {
            println!(".env file (would be): {}", env_path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_hides_only_present_keys() {
        let mut config = Config::default();
        config.embedding.api_key = Some("pc-secret".to_string());
        config.vector_store.api_key = Some("qd-secret".to_string());

        let shown = masked(&config);
        assert_eq!(shown.embedding.api_key.as_deref(), Some(MASK));
        assert_eq!(shown.vector_store.api_key.as_deref(), Some(MASK));
        assert_eq!(shown.generation.api_key, None);
        assert_eq!(config.embedding.api_key.as_deref(), Some("pc-secret"));
    }
}
