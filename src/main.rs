//! Craftwatch - watchdog that keeps a Minecraft client connected.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use craftwatch::captcha::{CaptchaMonitor, LogSink};
use craftwatch::config::{ConfigLoader, WatchConfig};
use craftwatch::game::GameClient;
use craftwatch::reconnect::Reconnector;
use craftwatch::window::NativePlatform;

#[derive(Parser)]
#[command(
    name = "craftwatch",
    about = "Watchdog that keeps a Minecraft client connected",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the client and recover from disconnects and crashes.
    Run {
        /// Path to a config file (overrides the default search).
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Also monitor the macro mod's captcha alerts file.
        #[arg(long)]
        captcha: bool,
    },
    /// Print the effective configuration as TOML and exit.
    PrintConfig {
        /// Path to a config file (overrides the default search).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<WatchConfig, craftwatch::config::ConfigError> {
    let loader = match path {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    loader.load()
}

async fn run(config_path: Option<PathBuf>, captcha: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    let platform = Arc::new(NativePlatform::new());
    let client = Arc::new(GameClient::new(platform, &config)?);

    let mut reconnector = Reconnector::new(client.clone(), &config);
    reconnector.keep_connected().await?;

    let mut monitor = if captcha {
        let mut monitor = CaptchaMonitor::new(client, Arc::new(LogSink), &config);
        monitor.start().await?;
        Some(monitor)
    } else {
        None
    };

    tracing::info!("Craftwatch running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    if let Some(monitor) = monitor.as_mut() {
        monitor.stop().await;
    }
    reconnector.stop().await;
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run { config, captcha } => run(config, captcha).await,
        Commands::PrintConfig { config } => load_config(config)
            .map_err(Into::into)
            .and_then(|config| {
                let rendered = toml::to_string_pretty(&config)?;
                println!("{rendered}");
                Ok(())
            }),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Craftwatch failed");
        std::process::exit(1);
    }
}
