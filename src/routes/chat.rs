use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::db::models::session::Session;
use crate::dto::chat::{CompleteRequest, CompleteResponse, MessageResponse, SaveSessionRequest};
use crate::errors::AppError;
use crate::middleware::auth::Claims;
use crate::services::chat_session::ChatSession;
use crate::state::AppState;

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e.body_text())))
}

// ── Completion ──────────────────────────────────────────────

pub async fn complete(
    State(state): State<AppState>,
    claims: Claims,
    payload: Result<Json<CompleteRequest>, JsonRejection>,
) -> Result<Json<CompleteResponse>, AppError> {
    let payload = json_body(payload)?;

    if payload.message.trim().is_empty() {
        return Err(AppError::Validation("Message is required".to_string()));
    }

    let prompt = state
        .assembler
        .build_prompt(&payload.message, payload.document_text.as_deref());

    tracing::info!(
        "Completion for {} ({} prompt chars, document: {})",
        claims.sub,
        prompt.len(),
        payload.document_text.is_some()
    );

    let response = state
        .completion
        .generate(&prompt)
        .await
        .map_err(|e| AppError::Upstream(format!("{e:#}")))?;

    Ok(Json(CompleteResponse { response }))
}

// ── Saved sessions ──────────────────────────────────────────

pub async fn save_session(
    State(state): State<AppState>,
    claims: Claims,
    payload: Result<Json<SaveSessionRequest>, JsonRejection>,
) -> Result<Json<Session>, AppError> {
    let payload = json_body(payload)?;

    let working = ChatSession::from_messages(payload.messages);
    let (_, saved) = working
        .save(&payload.title, &claims.sub, state.sessions.as_ref())
        .await?;

    Ok(Json(saved))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Vec<Session>>, AppError> {
    let sessions = state.sessions.list(&claims.sub).await?;
    Ok(Json(sessions))
}

pub async fn delete_session(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    // Someone else's session is reported exactly like a missing one.
    if !state.sessions.delete(&id, &claims.sub).await? {
        return Err(AppError::NotFound("Chat not found".to_string()));
    }

    tracing::info!("Deleted chat session {id} for {}", claims.sub);
    Ok(Json(MessageResponse {
        message: "Chat deleted successfully".to_string(),
    }))
}
