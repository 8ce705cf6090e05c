use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::services::chat_session::SaveError;
use crate::services::chunker::ChunkConfigError;
use crate::services::extractor::ExtractionError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Feature disabled: {0}")]
    FeatureDisabled(String),

    #[error("Error parsing PDF: {0}")]
    Extraction(String),

    #[error("Completion service error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::FeatureDisabled(msg) => (StatusCode::FORBIDDEN, format!("{msg} is disabled")),
            AppError::Extraction(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Upstream(e) => {
                tracing::error!("Completion service error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to get a response from the completion service".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = axum::Json(ErrorResponse {
            error: message,
            status: status.as_u16(),
        });

        (status, body).into_response()
    }
}

impl From<ExtractionError> for AppError {
    fn from(e: ExtractionError) -> Self {
        match e {
            // Temp-file trouble is ours, not the document's.
            ExtractionError::Io(io) => AppError::Internal(anyhow::Error::new(io)),
            other => AppError::Extraction(other.to_string()),
        }
    }
}

impl From<SaveError> for AppError {
    fn from(e: SaveError) -> Self {
        match e {
            SaveError::EmptyTitle | SaveError::NoMessages => AppError::Validation(e.to_string()),
            SaveError::Store(inner) => AppError::Internal(inner),
        }
    }
}

impl From<ChunkConfigError> for AppError {
    fn from(e: ChunkConfigError) -> Self {
        AppError::Internal(anyhow::Error::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let (status, body) = body_of(AppError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], 401);

        let (status, body) = body_of(AppError::Validation("Title is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Title is required");

        let (status, _) = body_of(AppError::NotFound("Chat not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_extraction_failure_keeps_message() {
        let (status, body) = body_of(ExtractionError::NoText.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Error parsing PDF: No text could be extracted from the PDF");
    }

    #[tokio::test]
    async fn test_internal_detail_not_leaked() {
        let err = AppError::Internal(anyhow::anyhow!("connection refused at 10.0.0.5:5432"));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");

        let (status, body) = body_of(AppError::Upstream("quota exceeded for key abc".into())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body["error"].as_str().unwrap().contains("abc"));
    }
}
