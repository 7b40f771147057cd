use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wellspire_api::{
    config::{Config, StorageBackend},
    db::{self, Cache, MemoryStore, PgStore, Store},
    routes::{cors_layer, create_router, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = db::create_pool(&config.database_url).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("Connected to PostgreSQL");
            Arc::new(PgStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    let (cache, cache_writer) = match &config.redis_url {
        Some(url) => {
            let client = db::create_redis_client(url)?;
            let (cache, handle) = Cache::new(client);
            tracing::info!("Insights caching enabled");
            (Some(cache), Some(handle))
        }
        None => (None, None),
    };

    let state = Arc::new(AppState::new(store, cache, config.recommender())?);
    if config.openai_api_key.is_none() {
        tracing::info!("No OpenAI key configured, chat will use canned replies");
    }

    let app = create_router(state).layer(cors_layer(&config.allowed_origins));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
