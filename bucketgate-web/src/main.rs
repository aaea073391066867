//! Bucketgate Web Server
//!
//! Session-gated upload, listing, download and deletion of objects in an
//! S3-compatible bucket.

use anyhow::Context;
use bucketgate_core::{init_logging, CredentialStore, GatewayConfig, StoreBackend};
use bucketgate_web::GatewayServerBuilder;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Bucketgate - authenticated access to a shared object bucket
#[derive(Parser, Debug)]
#[command(name = "bucketgate-web")]
#[command(about = "Session-gated HTTP access to an S3-compatible bucket")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON credentials file
    #[arg(long, default_value = "config.json")]
    credentials: PathBuf,

    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory served under /static, /assets and /public
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Keep objects in process memory instead of S3
    #[arg(long)]
    memory_store: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Command line flags win over file and environment settings.
    fn apply_to(&self, config: &mut GatewayConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(static_dir) = &self.static_dir {
            config.server.static_dir = static_dir.clone();
        }
        if self.memory_store {
            config.storage.backend = StoreBackend::Memory;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::default(),
    };
    config.apply_env_overrides()?;
    args.apply_to(&mut config);

    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialise logging")?;

    let credentials = CredentialStore::from_file(&args.credentials)?;

    info!(
        address = %config.server.address(),
        backend = ?config.storage.backend,
        bucket = %config.storage.bucket,
        static_dir = %config.server.static_dir.display(),
        "Starting Bucketgate web server"
    );

    let server = GatewayServerBuilder::from_config(config)
        .credentials(credentials)
        .build()
        .await?;

    server.start().await?;
    Ok(())
}
