//! myip CLI
//!
//! Runs the myip HTTP server and offers one-shot lookups against the same
//! configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use myip_api::{ApiConfig, ApiResponse, ApiServer, AppState};
use myip_cache::RdapStore;
use myip_core::types::RecordSource;

mod logging;

/// myip - what is my IP, and what do registries know about it
#[derive(Parser)]
#[command(name = "myip")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Redis host:port (overrides REDIS)
    #[arg(long, global = true)]
    redis: Option<String>,

    /// RDAP URL template containing {REMOTE_IP} (overrides RDAP_API)
    #[arg(long, global = true)]
    rdap_api: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Listen address (overrides WEB)
        #[arg(short, long)]
        web: Option<String>,
    },

    /// Run one lookup and print the response
    Lookup {
        /// Address to look up
        address: String,
    },

    /// Check cache backend connectivity
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let web = match &cli.command {
        Commands::Serve { web } => web.clone(),
        _ => None,
    };
    let config = ApiConfig::from_env()
        .context("Failed to read configuration")?
        .with_web(web)
        .with_redis(cli.redis.clone())
        .with_rdap_api(cli.rdap_api.clone());
    config.validate().context("Invalid configuration")?;

    init_logging(cli.verbose, &config);

    match cli.command {
        Commands::Serve { .. } => cmd_serve(config).await,
        Commands::Lookup { address } => cmd_lookup(config, &address).await,
        Commands::Ping => cmd_ping(config).await,
    }
}

/// Installs the global subscriber with the output `LOG_TYPE` selects.
///
/// Falls back to console on stderr when the output cannot be set up.
fn init_logging(verbose: bool, config: &ApiConfig) {
    let filter = if verbose { "myip=debug,info" } else { "myip=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    let (output, fallback): (logging::BoxedLayer<Registry>, Option<String>) = match config.log_format() {
        Some(format) => match logging::output_layer(format, config.log_addr.as_deref()) {
            Ok(layer) => (layer, None),
            Err(reason) => (logging::console_layer(), Some(reason)),
        },
        None => (
            logging::console_layer(),
            Some(format!("unsupported LOG_TYPE '{}'", config.log_type)),
        ),
    };

    tracing_subscriber::registry().with(output).with(filter).init();

    if let Some(reason) = fallback {
        warn!(log_type = %config.log_type, %reason, "Logging to stderr instead");
    }
}

/// Run the HTTP server
async fn cmd_serve(config: ApiConfig) -> Result<()> {
    let addr = config.listen_addr().context("Cannot determine listen address")?;

    println!("{}", "Starting myip server...".cyan().bold());

    let state = AppState::from_config(config)
        .await
        .context("Failed to initialise server")?;
    state
        .service
        .store()
        .ping()
        .await
        .context("Cache backend is not reachable")?;

    println!("   {} http://{}", "Listening on:".green(), addr);
    println!("   {} http://{}/health", "Health check:".dimmed(), addr);
    if !state.service.lookup_enabled() {
        println!("   {}", "Registry lookups disabled (RDAP_API not set)".yellow());
    }
    println!("\n   Press Ctrl+C to stop.\n");

    ApiServer::new(state).run(addr).await?;

    Ok(())
}

/// Run one orchestration and print the result
async fn cmd_lookup(config: ApiConfig, address: &str) -> Result<()> {
    println!("{} {}", "Looking up:".cyan().bold(), address);

    let state = AppState::from_config(config)
        .await
        .context("Failed to initialise lookup")?;
    let response = state.service.fetch(address).await;

    let source = match response.source {
        RecordSource::Disabled => "lookup disabled".dimmed(),
        RecordSource::Cache => "cache".green(),
        RecordSource::Lookup => "registry".green(),
        RecordSource::StaleCache => "stale cache (registry unavailable)".yellow(),
        RecordSource::Unavailable => "none (registry unavailable)".red(),
    };
    println!("   {} {}", "Source:".dimmed(), source);
    if let Some(err) = &response.error {
        println!("   {} {}", "Warning:".yellow(), err);
    }

    println!("{}", serde_json::to_string_pretty(&ApiResponse::from(response))?);

    Ok(())
}

/// Check backend connectivity
async fn cmd_ping(config: ApiConfig) -> Result<()> {
    let backend = config
        .connect_backend()
        .await
        .context("Failed to connect cache backend")?;

    RdapStore::new(backend)
        .ping()
        .await
        .context("Cache backend did not answer")?;

    println!("{}", "Cache backend is reachable".green().bold());
    Ok(())
}
