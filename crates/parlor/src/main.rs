// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parlor - a streaming, tool-augmented chat proxy.
//!
//! This is the binary entry point for the Parlor server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parlor_config::ParlorConfig;

/// Parlor - a streaming, tool-augmented chat proxy.
#[derive(Parser, Debug)]
#[command(name = "parlor", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the chat proxy server.
    Serve,
    /// Query a running server's health endpoint.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Validate the configuration and print a summary.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> ParlorConfig {
    let result = match path {
        Some(path) => parlor_config::load_and_validate_path(path),
        None => parlor_config::load_and_validate(),
    };
    match result {
        Ok(config) => config,
        Err(errors) => {
            parlor_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

/// One line per setting worth checking before `serve`. Secrets are omitted.
fn config_summary(config: &ParlorConfig) -> Vec<String> {
    vec![
        format!("server:    {}:{}", config.server.host, config.server.port),
        format!("model:     {}", config.anthropic.default_model),
        format!(
            "api key:   {}",
            if config.anthropic.api_key.is_some() {
                "configured"
            } else {
                "from environment"
            }
        ),
        format!("tokens:    {}", config.auth.tokens.len()),
        format!(
            "tools:     {}",
            if config.tools.enabled { "enabled" } else { "disabled" }
        ),
        format!("database:  {}", config.storage.database_path),
        format!("encoding:  {:?}", config.gateway.default_encoding).to_lowercase(),
    ]
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Status { json }) => {
            if let Err(e) = status::run_status(&config, json).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            println!("parlor: config ok");
            for line in config_summary(&config) {
                println!("  {line}");
            }
        }
        None => {
            println!("parlor: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["parlor", "--config", "/tmp/p.toml", "serve"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.toml")));

        let cli = Cli::try_parse_from(["parlor", "status", "--json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Status { json: true })));
    }

    #[test]
    fn summary_omits_secrets() {
        let mut config = ParlorConfig::default();
        config.anthropic.api_key = Some("sk-ant-secret".into());
        let summary = config_summary(&config).join("\n");
        assert!(!summary.contains("sk-ant-secret"));
        assert!(summary.contains("api key:   configured"));
        assert!(summary.contains("encoding:  framed"));
    }
}
