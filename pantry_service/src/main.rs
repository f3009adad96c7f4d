//! Pantry Service
//!
//! Serves the ingredient, inventory and recipe API over HTTP on top of the
//! configured record store.

use clap::Parser;
use pantry_service::{open_store, Config};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    log::info!("Starting pantry_service...");
    log::info!(
        "Backend: {:?}, storage: {}",
        config.backend,
        config.storage_location()
    );

    let store = match open_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = pantry_service::web::serve(store, &config.bind_addr()).await {
        log::error!("Web server error: {}", e);
        std::process::exit(1);
    }
}
