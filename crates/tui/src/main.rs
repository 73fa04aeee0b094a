mod app;
mod command;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    path::Path,
};

use rental_core::{
    config::{self, AppConfig},
    FlatFileStore, Registry, SharedRegistry,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config.log_dir)?;
    info!(
        config = %config_path.display(),
        data_dir = %config.data_dir.display(),
        "Starting rental desk"
    );

    let registry = SharedRegistry::new(Registry::open(FlatFileStore::from_config(&config)));
    let mut app = app::RentalApp::new(registry);
    app.run().await
}

fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("rental.log");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
