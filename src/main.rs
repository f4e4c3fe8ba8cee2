use std::{process, sync::Arc};

use cinematch_collab::{Catalog, CatalogError, Collab, StaticCatalog};
use cinematch_server::{run_server, spawn_event_forwarder, ConfigError, ServerConfig, ServerContext};
use colored::Colorize;
use log::{error, info};
use thiserror::Error;

mod logging;

#[derive(Debug, Error)]
enum CinematchError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not load movie catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Server failed: {0}")]
    Server(#[from] std::io::Error),
}

impl CinematchError {
    fn hint(&self) -> String {
        match self {
            CinematchError::Config(_) => "Check the CINEMATCH_* environment variables and try again.".to_string(),
            CinematchError::Catalog(_) => "CINEMATCH_CATALOG must point to a JSON array of movies with unique ids. Unset it to use the built-in list.".to_string(),
            CinematchError::Server(_) => "Make sure the port is free, or pick another one with CINEMATCH_PORT.".to_string(),
        }
    }
}

async fn run() -> Result<(), CinematchError> {
    let config = ServerConfig::from_env()?;

    let catalog = match &config.catalog_path {
        Some(path) => StaticCatalog::from_json_file(path)?,
        None => StaticCatalog::default(),
    };

    info!("Rooms will swipe through {} movies", catalog.len());

    let catalog: Arc<dyn Catalog> = Arc::new(catalog);
    let collab = Arc::new(Collab::new(config.collab.clone(), catalog));
    let _sweeper = collab.spawn_sweeper();

    let context = ServerContext::new(collab.clone());
    spawn_event_forwarder(collab, context.sse.clone());

    info!("Initialized successfully.");
    run_server(context, &config).await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = logging::init_logger() {
        eprintln!("Could not initialize logging: {e}");
    }

    if let Err(error) = run().await {
        error!("{} Read the error below to troubleshoot the issue.", "cinematch failed to start!".bold().red());
        error!("{}", error);
        error!("{}", format!("Hint: {}", error.hint()).bright_black().italic());

        process::exit(1);
    }
}
