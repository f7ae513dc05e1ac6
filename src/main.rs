use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lead_api::api;
use lead_api::config::{Config, StoreBackend};
use lead_api::db::Database;
use lead_api::db_storage::PgLeadStore;
use lead_api::handlers::AppState;
use lead_api::services::LeadService;
use lead_api::store::{InMemoryLeadStore, LeadStore};

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, wires the configured lead store
/// into the service and starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn LeadStore> = match config.store {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required"))?;
            let db = Database::new(url, config.db_max_connections).await?;
            tracing::info!("Database connection pool established");

            if config.run_migrations {
                db.migrate().await?;
            }
            Arc::new(PgLeadStore::new(db.pool.clone()))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory lead store, data will not survive a restart");
            Arc::new(InMemoryLeadStore::new())
        }
    };

    let app_state = Arc::new(AppState {
        config: config.clone(),
        leads: LeadService::new(store),
    });
    let app = api::router(app_state)?;

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
