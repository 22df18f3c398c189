//! Contact Service
//!
//! Entry point for the Contact relay. Accepts customer messages over gRPC and
//! forwards each one to the Messaging service.
//!
//! # Flow
//! 1. Load and validate configuration
//! 2. Bind the listening port (failure aborts startup)
//! 3. Serve until Ctrl+C or SIGTERM
//! 4. Stop accepting connections and drain within the grace period

use contact_relay::config::Config;
use contact_relay::server;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes structured logging.
///
/// Log level comes from `RUST_LOG` and defaults to `info`.
fn setup_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stdout)
        .try_init()
        .map_err(|e| e.into())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging().map_err(|e| anyhow::anyhow!(e))?;
    info!("Contact service starting up...");

    info!("Loading configuration...");
    let config = Config::new()?;
    info!(
        port = config.server.port,
        mode = ?config.server.mode,
        messaging = %config.messaging.target(),
        "Configuration loaded"
    );

    server::run(config).await?;

    Ok(())
}
