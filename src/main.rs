use std::sync::Arc;

use tracing::{info, warn};

use depot::file::{BlobStore, ChunkAssembler};
use depot::{Config, Database, WebServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = depot::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        depot::logging::init_console_only(&config.logging.level);
    }

    info!("Depot - Self-hosted file depot");

    // Open the metadata store and run the one-time legacy import
    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database: {e}");
            std::process::exit(1);
        }
    };

    match depot::db::legacy::import_if_empty(db.pool(), &config.database.legacy_json_path).await {
        Ok(0) => {}
        Ok(count) => info!("Imported {count} records from the legacy export"),
        Err(e) => warn!("Legacy import failed: {e}"),
    }

    // Set up storage
    let blobs = match BlobStore::new(&config.storage.uploads_path) {
        Ok(blobs) => blobs,
        Err(e) => {
            eprintln!("Failed to initialize blob storage: {e}");
            std::process::exit(1);
        }
    };
    let chunks = match ChunkAssembler::new(&config.storage.staging_path) {
        Ok(chunks) => chunks,
        Err(e) => {
            eprintln!("Failed to initialize chunk staging: {e}");
            std::process::exit(1);
        }
    };

    let server = WebServer::new(
        &config.server,
        Arc::new(db),
        blobs,
        chunks,
        config.max_upload_size_bytes(),
    );

    if let Err(e) = server.run().await {
        eprintln!("Web server error: {e}");
        std::process::exit(1);
    }
}
