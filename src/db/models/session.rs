use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A saved conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub owner_id: String,
    pub created_at: String,
}

/// Durable storage for saved sessions.
///
/// `delete` only removes a session owned by `owner_id` and reports `false`
/// both when the id is unknown and when it belongs to someone else.
pub trait SessionRepository: Send + Sync {
    fn create<'a>(
        &'a self,
        title: &'a str,
        owner_id: &'a str,
        messages: &'a [Message],
    ) -> BoxFuture<'a, Result<Session>>;

    /// Sessions owned by `owner_id`, newest first.
    fn list<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Session>>>;

    fn delete<'a>(&'a self, session_id: &'a str, owner_id: &'a str) -> BoxFuture<'a, Result<bool>>;
}

pub fn encode_messages(messages: &[Message]) -> Result<String> {
    serde_json::to_string(messages).context("Failed to serialize messages")
}

pub fn decode_messages(raw: &str) -> Result<Vec<Message>> {
    serde_json::from_str(raw).context("Failed to parse stored messages")
}

#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &sqlx::postgres::PgRow) -> Result<Session> {
        let raw: String = row.try_get("messages").context("Failed to get messages")?;
        let created_at: chrono::DateTime<chrono::Utc> =
            row.try_get("created_at").context("Failed to get created_at")?;

        Ok(Session {
            id: row.try_get("id").context("Failed to get id")?,
            title: row.try_get("title").context("Failed to get title")?,
            messages: decode_messages(&raw)?,
            owner_id: row.try_get("user_id").context("Failed to get user_id")?,
            created_at: created_at.to_rfc3339(),
        })
    }
}

impl SessionRepository for PgSessionRepository {
    fn create<'a>(
        &'a self,
        title: &'a str,
        owner_id: &'a str,
        messages: &'a [Message],
    ) -> BoxFuture<'a, Result<Session>> {
        Box::pin(async move {
            let id = Uuid::new_v4().to_string();
            let now = chrono::Utc::now();
            let encoded = encode_messages(messages)?;

            sqlx::query(
                "INSERT INTO chat_sessions (id, user_id, title, messages, created_at)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&id)
            .bind(owner_id)
            .bind(title)
            .bind(&encoded)
            .bind(now)
            .execute(&self.pool)
            .await
            .context("Failed to insert chat session")?;

            Ok(Session {
                id,
                title: title.to_string(),
                messages: decode_messages(&encoded)?,
                owner_id: owner_id.to_string(),
                created_at: now.to_rfc3339(),
            })
        })
    }

    fn list<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Session>>> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT id, user_id, title, messages, created_at
                 FROM chat_sessions WHERE user_id = $1
                 ORDER BY created_at DESC, seq DESC",
            )
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list chat sessions")?;

            rows.iter().map(Self::map_row).collect()
        })
    }

    fn delete<'a>(&'a self, session_id: &'a str, owner_id: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM chat_sessions WHERE id = $1 AND user_id = $2")
                .bind(session_id)
                .bind(owner_id)
                .execute(&self.pool)
                .await
                .context("Failed to delete chat session")?;

            Ok(result.rows_affected() > 0)
        })
    }
}

/// Process-local store for development and tests. Messages go through the
/// same JSON encoding as the database column.
#[derive(Clone, Default)]
pub struct MemorySessionRepository {
    rows: Arc<RwLock<Vec<StoredSession>>>,
}

struct StoredSession {
    id: String,
    title: String,
    messages: String,
    owner_id: String,
    created_at: String,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn to_session(row: &StoredSession) -> Result<Session> {
        Ok(Session {
            id: row.id.clone(),
            title: row.title.clone(),
            messages: decode_messages(&row.messages)?,
            owner_id: row.owner_id.clone(),
            created_at: row.created_at.clone(),
        })
    }
}

impl SessionRepository for MemorySessionRepository {
    fn create<'a>(
        &'a self,
        title: &'a str,
        owner_id: &'a str,
        messages: &'a [Message],
    ) -> BoxFuture<'a, Result<Session>> {
        Box::pin(async move {
            let row = StoredSession {
                id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                messages: encode_messages(messages)?,
                owner_id: owner_id.to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
            };
            let session = Self::to_session(&row)?;
            self.rows.write().await.push(row);
            Ok(session)
        })
    }

    fn list<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Session>>> {
        Box::pin(async move {
            let rows = self.rows.read().await;
            // Rows are kept in insertion order.
            rows.iter()
                .rev()
                .filter(|r| r.owner_id == owner_id)
                .map(Self::to_session)
                .collect()
        })
    }

    fn delete<'a>(&'a self, session_id: &'a str, owner_id: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            let mut rows = self.rows.write().await;
            let before = rows.len();
            rows.retain(|r| !(r.id == session_id && r.owner_id == owner_id));
            Ok(rows.len() < before)
        })
    }
}
