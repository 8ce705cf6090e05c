use anyhow::{Context, Result};
use sqlx::PgPool;

pub async fn run_all(pool: &PgPool) -> Result<()> {
    create_chat_sessions_table(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

async fn create_chat_sessions_table(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS chat_sessions (
            id TEXT PRIMARY KEY,
            seq BIGSERIAL NOT NULL,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            messages TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        CREATE INDEX IF NOT EXISTS idx_chat_sessions_user
            ON chat_sessions(user_id, created_at DESC);",
    )
    .execute(pool)
    .await
    .context("Failed to create chat_sessions table")?;
    Ok(())
}
