//! SMS Consent Gateway - Entry point.

use consent_gateway::{
    api::{create_router, AppState},
    config::Config,
    engine::ConsentEngine,
    keywords::KeywordSets,
};
use contact_store::{ContactRegistry, ContactStore, ExportSink, Persistence};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SMS Consent Gateway");

    // Initialize persistence
    let persistence = if config.storage.persist {
        Persistence::file(config.storage.path.clone())
    } else {
        Persistence::memory()
    };

    // Load existing registry
    let registry = match persistence.load().await {
        Ok(r) => {
            info!("Loaded registry with {} contacts", r.len());
            r
        }
        Err(e) => {
            error!("Failed to load registry: {}", e);
            info!("Starting with empty registry");
            ContactRegistry::new()
        }
    };

    let exports = ExportSink::new(
        config.storage.contacts_csv.clone(),
        config.storage.optout_file.clone(),
    );
    let store = ContactStore::new(registry, persistence, exports);

    // Make sure the bulk sender sees current artifacts from the start.
    if let Err(e) = store.refresh_exports().await {
        error!("Failed to write export artifacts: {}", e);
        std::process::exit(1);
    }

    // Consent state machine
    let keywords = KeywordSets::from_config(&config.keywords);
    let engine = ConsentEngine::new(store.clone(), keywords, config.sms.default_region.clone());

    // Create application state and router
    let state = AppState::new(
        store,
        engine,
        config.sms.default_region.clone(),
        config.admin.default_actor.clone(),
    );
    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::new(
        config.server.listen_addr.parse().unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
