// In app/src/main.rs

use anyhow::Result;
use api_client::BinanceMarketSource;
use app_config::Settings;
use clap::{Parser, Subcommand};
use engine::{Engine, EngineConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "An SMA long/short trading bot for Binance Futures.")]
struct Cli {
    /// Directory holding `base.toml` and the per-environment overrides.
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the market feed, the trading engine and the web server.
    Run,

    /// Loads and validates the configuration, then prints it.
    CheckConfig,
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = app_config::load_settings_from(&cli.config_dir)?;

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.app.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(environment = %settings.app.environment, "Starting application");

    match cli.command {
        Commands::Run => run_app(settings).await?,
        Commands::CheckConfig => {
            let parameters = settings.bot_parameters()?;
            println!("{settings:#?}");
            println!("{parameters:#?}");
            tracing::info!("Configuration is valid.");
        }
    }

    Ok(())
}

// --- "Run" Subcommand Logic ---

/// Wires the Binance feed into the engine and serves the web interface.
/// Runs until Ctrl-C or until one of the tasks terminates.
async fn run_app(settings: Settings) -> Result<()> {
    let engine_config = EngineConfig::from_settings(&settings)?;
    let source = Arc::new(BinanceMarketSource::new(&settings.binance)?);

    let (trading_engine, handle) = Engine::new(engine_config, source)?;
    tracing::info!(symbol = %settings.market.symbol, "Launching trading engine and web server...");

    let mut engine_task = tokio::spawn(trading_engine.run());
    let server_settings = settings.server.clone();
    let mut server_task = tokio::spawn(async move { web_server::run(&server_settings, handle).await });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested.");
            server_task.abort();
            engine_task.abort();
            Ok(())
        }
        engine_result = &mut engine_task => {
            tracing::error!(?engine_result, "Trading engine task has terminated unexpectedly.");
            server_task.abort();
            anyhow::bail!("The trading engine terminated. Shutting down.");
        }
        server_result = &mut server_task => {
            tracing::error!(?server_result, "Web server task has terminated unexpectedly.");
            engine_task.abort();
            match server_result {
                Ok(Err(e)) => Err(e.into()),
                _ => anyhow::bail!("The web server terminated. Shutting down."),
            }
        }
    }
}
