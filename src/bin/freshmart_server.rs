//! freshmart-server: Fresh Mart order API
//!
//! Serves the order workflow over HTTP under `/api`.
//!
//! ## Configuration
//! - `config.yaml`, `--config <path>` or FRESHMART_CONFIG: YAML configuration
//! - FRESHMART__SERVER__PORT, FRESHMART__STORAGE__TYPE, ...: overrides
//! - FRESHMART_LOG: tracing filter (default `info`)

use tracing::{error, info};

use freshmart::config::Config;
use freshmart::handlers::{router, AppState};
use freshmart::services::OrderService;
use freshmart::storage::init_storage;
use freshmart::utils::bootstrap::{init_tracing, parse_config_path, shutdown_signal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = parse_config_path();
    let config = Config::load(config_path.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Starting freshmart-server");

    let store = init_storage(&config.storage, &config.orders).await?;
    info!(storage = %config.storage.storage_type, "Storage initialized");

    let service = OrderService::new(store, config.orders.clone());
    let app = router(AppState::new(service, &config.auth));

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %listener.local_addr()?, "Fresh Mart API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
