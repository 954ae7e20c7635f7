//! represent - address to legislator resolution
//!
//! Subcommands:
//! - `serve` - HTTP service (`POST /representatives`, `GET /health`)
//! - `resolve` - one-shot lookup printed as JSON
//! - `refresh-dataset` - download the legislator dataset to the bundled path

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};

use represent_common::logging::init_tracing;
use represent_common::Config;
use represent_resolver::present::RepresentativeList;
use represent_resolver::services::build_http_client;
use represent_resolver::services::legislator_dataset::ProviderChain;
use represent_resolver::{AppState, Resolver};

#[derive(Parser, Debug)]
#[command(name = "represent")]
#[command(about = "Resolve a street address to its federal and state legislators")]
#[command(version)]
struct Args {
    /// Configuration file (overrides REPRESENT_CONFIG and the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Listen address, e.g. 127.0.0.1:5780
        #[arg(short, long, env = "REPRESENT_BIND")]
        bind: Option<String>,
    },

    /// Resolve one address and print the result as JSON
    Resolve {
        address: String,

        /// Print the flattened legislator list instead of offices/officials
        #[arg(long)]
        list: bool,
    },

    /// Download the legislator dataset from the mirrors and store it locally
    RefreshDataset {
        /// Destination file (defaults to dataset.bundled_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging.level);

    match args.command {
        Command::Serve { bind } => serve(config, bind).await,
        Command::Resolve { address, list } => resolve(config, &address, list).await,
        Command::RefreshDataset { output } => {
            let output = output.unwrap_or_else(|| config.dataset.bundled_path.clone());
            refresh_dataset(&config, &output).await
        }
    }
}

async fn serve(config: Config, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());

    info!("Starting represent v{} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));

    let resolver = Resolver::from_config(&config).context("Failed to build resolver")?;
    let app = represent_resolver::build_router(AppState::new(Arc::new(resolver)));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn resolve(config: Config, address: &str, list: bool) -> Result<()> {
    let resolver = Resolver::from_config(&config).context("Failed to build resolver")?;
    let result = resolver.resolve(address).await?;

    let json = if list {
        serde_json::to_string_pretty(&RepresentativeList::from(&result))?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{}", json);
    Ok(())
}

async fn refresh_dataset(config: &Config, output: &Path) -> Result<()> {
    let http_client = build_http_client(&config.http)?;
    let chain = ProviderChain::mirrors(&http_client, &config.dataset);

    let (source, entries) = chain
        .first_valid()
        .await
        .context("All legislator dataset mirrors failed")?;
    info!(source = %source, entries = entries.len(), "Downloaded legislator dataset");

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(&entries)?;
    tokio::fs::write(output, json)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Wrote {} legislators to {}", entries.len(), output.display());
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
