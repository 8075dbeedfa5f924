//! Parking service CLI server
//!
//! ```sh
//! # Default config (~/.config/parking-service/config.toml)
//! parking-service
//!
//! # Custom config path and port
//! parking-service --config /etc/parking-service/config.toml --port 8080
//!
//! # Validate config without starting
//! parking-service --check
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use parking_service::config::AppConfig;
use parking_service::server::{init_tracing, ServerHandle, ServerOptions};

#[derive(Parser, Debug)]
#[command(
    name = "parking-service",
    version,
    about = "Parking spots, reservations and live availability",
    long_about = "REST API + websocket server for parking spot management.\n\n\
                  Default config: ~/.config/parking-service/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "PARKING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the HTTP listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(parking_service::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", config_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    init_tracing(&config);
    info!("Configuration loaded from {}", config_path.display());

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   HTTP address: {}", config.server.address());
        println!("   Database    : {}", config.database.redacted_url());
        println!(
            "   Pool        : {}..{} ({:?})",
            config.database.min_connections,
            config.database.max_connections,
            config.database.acquire_policy
        );
        println!("   Mapping     : {:?}", config.occupancy.mapping);
        println!("   Log level   : {}", config.logging.level);
        return ExitCode::SUCCESS;
    }

    let handle = match ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.skip_migrations,
    })
    .await
    {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    handle.install_signal_handler();
    info!("Press Ctrl+C to shut down gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    ExitCode::SUCCESS
}
