//! ERP server: reads settings from the environment, prepares storage, serves REST, SOAP and the hub.

use sih_erp::{
    apply_migrations, app, ensure_database_exists, AppState, Catalog, Hub, MemoryStore, PgProbe, Registry,
    Settings, StorageKind,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sih_erp=info,erp_server=info")),
        )
        .init();

    let catalog = Catalog::standard()?;
    let hub = Hub::default();

    let state = match settings.storage {
        StorageKind::Postgres => {
            ensure_database_exists(&settings.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .connect(&settings.database_url)
                .await?;
            if settings.run_migrations {
                apply_migrations(&pool, &catalog).await?;
            }
            let probe = Arc::new(PgProbe::new(pool.clone()));
            AppState::new(Registry::postgres(catalog, pool, hub.clone()), hub, probe)
        }
        StorageKind::Memory => {
            tracing::warn!("using in-memory storage; data is lost on exit");
            let store = MemoryStore::new(&catalog);
            let registry = Registry::memory(catalog, &store, hub.clone());
            AppState::new(registry, hub, store)
        }
    };
    tracing::info!(
        entities = state.registry.catalog().entities.len(),
        storage = ?settings.storage,
        "catalog loaded"
    );

    let router = app(state, &settings);
    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
