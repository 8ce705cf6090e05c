use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use pdf_chat_backend::config::{AppConfig, StoreBackend};
use pdf_chat_backend::db::models::session::{
    MemorySessionRepository, PgSessionRepository, SessionRepository,
};
use pdf_chat_backend::db::{connection, migrations};
use pdf_chat_backend::routes;
use pdf_chat_backend::services::llm_provider::RigCompletionService;
use pdf_chat_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    tracing::info!("Configuration loaded (env: {})", std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into()));

    let sessions: Arc<dyn SessionRepository> = match config.database.backend {
        StoreBackend::Postgres => {
            let pool = connection::create_pool(&config.database)
                .await
                .context("Failed to create database pool")?;
            migrations::run_all(&pool)
                .await
                .context("Failed to run migrations")?;
            Arc::new(PgSessionRepository::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory session store; saved chats are lost on restart");
            Arc::new(MemorySessionRepository::new())
        }
    };

    let completion = RigCompletionService::from_config(&config.llm)
        .context("Failed to configure completion service")?;
    tracing::info!("Completion provider: {} ({})", config.llm.provider, config.llm.model);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, sessions, Arc::new(completion))?;
    let app = routes::router(state);

    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
