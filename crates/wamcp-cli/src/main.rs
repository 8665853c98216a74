//! wamcp CLI - dispatch operations to configured MCP server endpoints
//!
//! Loads an endpoint configuration file, connects to the configured servers,
//! and either reports their status or dispatches a single operation.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use wamcp_client::{ConnectionManager, ConnectionState, Dispatcher, McpConnector};
use wamcp_common::{ClientConfig, Request};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the endpoint configuration file
    /// Supports .toml, .yaml, .yml, and .json formats
    /// See wamcp_config.toml.example for configuration examples
    #[arg(long, default_value = "wamcp.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the connection state of every configured endpoint
    Status,
    /// Dispatch one operation and print the response payload
    Call {
        /// Name of the remote operation to invoke
        op: String,

        /// JSON payload forwarded to the server unchanged
        #[arg(long, default_value = "{}")]
        payload: String,

        /// Target a specific endpoint instead of round-robin selection
        #[arg(long)]
        endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = ClientConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let manager = Arc::new(ConnectionManager::new(config, Arc::new(McpConnector)));

    let result = run(&args.command, &manager).await;

    if let Err(e) = manager.shutdown().await {
        log::warn!("Shutdown was not clean: {e}");
    }

    result
}

async fn run(command: &Command, manager: &Arc<ConnectionManager>) -> Result<()> {
    match command {
        Command::Status => {
            // Best-effort: show per-endpoint state even if some stay down.
            let _ = manager.connect_all().await;
            print_status(manager).await;
            Ok(())
        }
        Command::Call {
            op,
            payload,
            endpoint,
        } => {
            let payload: serde_json::Value =
                serde_json::from_str(payload).context("Payload is not valid JSON")?;

            manager
                .connect_all()
                .await
                .context("No endpoint could be connected")?;

            let dispatcher = Dispatcher::new(Arc::clone(manager));
            let request = Request::new(op, payload);

            match dispatcher.dispatch(request, endpoint.as_deref()).await {
                Ok(response) => {
                    println!("{}", serde_json::to_string_pretty(&response.payload)?);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("{} {e}", "error:".red().bold());
                    Err(e.into())
                }
            }
        }
    }
}

async fn print_status(manager: &Arc<ConnectionManager>) {
    let status = manager.status().await;
    for endpoint in manager.endpoints() {
        let state = status
            .get(&endpoint.id)
            .copied()
            .unwrap_or(ConnectionState::Disconnected);
        let label = match state {
            ConnectionState::Connected => state.as_str().green(),
            ConnectionState::Connecting => state.as_str().yellow(),
            ConnectionState::Disconnected | ConnectionState::Failed => state.as_str().red(),
        };
        println!("{:<16} {:<24} {label}", endpoint.id.bold(), endpoint.name);
    }
}
