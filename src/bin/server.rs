//! dbdocs API server
//!
//! Serves the document CRUD API used by the admin UI and keeps the site's
//! docs directory regenerated after every change.
//!
//! # Configuration
//!
//! Environment variables (override the config file):
//! - `DBDOCS_CONFIG`: Path to config file (default: ~/.config/dbdocs/config.yaml)
//! - `DBDOCS_DATABASE_PATH`: SQLite database (default: db.sqlite)
//! - `DBDOCS_DOCS_DIR`: Site docs directory (default: docs)
//! - `DBDOCS_PORT`: Port to listen on (default: 3001)
//!
//! # Config File Format
//!
//! ```yaml
//! database_path: ./db.sqlite
//! docs_dir: ./docs
//! port: 3001
//! ```

use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dbdocs::config::Config;
use dbdocs::db::{init_db, DocumentRepository};
use dbdocs::projection::Reconciler;
use dbdocs::server::{router, AppState};
use dbdocs::service::DocumentService;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dbdocs=info,dbdocs_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(None)?;

    tracing::info!("Database: {}", config.database_path.value.display());
    tracing::info!("Docs directory: {}", config.docs_dir.value.display());
    match &config.config_file {
        Some(path) => tracing::info!("Config file: {}", path.display()),
        None => tracing::info!("No config file found, using defaults"),
    }

    let pool = init_db(&config.database_path.value).await?;
    let service = DocumentService::new(
        DocumentRepository::new(pool),
        Reconciler::new(&config.docs_dir.value),
    );

    // Catch up on any change made while the server was down
    if let Err(e) = service.reconcile().await {
        tracing::warn!("Initial docs regeneration failed: {}", e);
    }

    let app = router(AppState::new(service));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port.value));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
