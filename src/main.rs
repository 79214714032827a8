//! # coolify-mcp CLI
//!
//! ## Usage
//!
//! ```bash
//! coolify-mcp [--config ./config/coolify-mcp.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `coolify-mcp serve stdio` | Serve MCP over stdin/stdout |
//! | `coolify-mcp serve http` | Serve MCP Streamable HTTP + JSON API on `[server].bind` |
//! | `coolify-mcp docs search "<query>"` | Search the Coolify documentation |
//! | `coolify-mcp tools` | List available tools |
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use coolify_mcp::{config, docs, server, traits};

/// MCP tool server for the Coolify self-hosted PaaS.
#[derive(Parser)]
#[command(
    name = "coolify-mcp",
    about = "MCP tool server for the Coolify self-hosted PaaS, with built-in documentation search",
    version
)]
struct Cli {
    /// Path to a TOML configuration file.
    ///
    /// Defaults to `./config/coolify-mcp.toml` when that file exists,
    /// otherwise built-in defaults plus environment variables are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server.
    Serve {
        #[command(subcommand)]
        transport: ServeTransport,
    },

    /// Query the Coolify documentation.
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// List the tools exposed to MCP clients.
    Tools,
}

#[derive(Subcommand)]
enum ServeTransport {
    /// Speak MCP over stdin/stdout.
    Stdio,
    /// Bind `[server].bind` and serve `/mcp` plus the JSON tool API.
    Http,
}

#[derive(Subcommand)]
enum DocsAction {
    /// Fetch the docs corpus and run a ranked search.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    if let Commands::Tools = cli.command {
        traits::list_tools()?;
        return Ok(());
    }

    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { transport } => match transport {
            ServeTransport::Stdio => server::run_stdio(&cfg).await?,
            ServeTransport::Http => server::run_http(&cfg).await?,
        },
        Commands::Docs { action } => match action {
            DocsAction::Search { query, limit } => {
                docs::run_search(&cfg, &query, limit).await?;
            }
        },
        Commands::Tools => {
            // Handled above (does not need config)
        }
    }

    Ok(())
}
