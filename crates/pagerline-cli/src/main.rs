//! Command-line interface for the Pagerline escalation server.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use pagerline_api::AppConfig;
use pagerline_core::config::env_vars;

/// Pagerline - page the on-call chain until someone answers.
#[derive(Parser, Debug)]
#[command(name = "pagerline")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Start the API server, health monitor and escalation engine.
    Serve {
        /// TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Host to bind to (overrides the configuration).
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (overrides the configuration).
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the effective configuration and exit.
    CheckConfig {
        /// TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Serve { config, host, port } => {
            let mut config = AppConfig::load(config.as_deref())?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            pagerline_api::run(config).await
        }
        Command::CheckConfig { config } => {
            let config = AppConfig::load(config.as_deref())?;
            println!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "pagerline=debug" } else { "pagerline=info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    if env_vars::log_json() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .init();
    }
}
