use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::dto::document::ExtractResponse;
use crate::errors::AppError;
use crate::middleware::auth::Claims;
use crate::services::chunker::chunk_text;
use crate::services::extractor::{join_pages, PDF_MIME_TYPE};
use crate::state::AppState;

/// Multipart field names accepted for the uploaded file.
const FILE_FIELDS: &[&str] = &["pdf", "file"];

pub async fn extract(
    State(state): State<AppState>,
    claims: Claims,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>, AppError> {
    if !state.config.features.pdf_upload_enabled {
        return Err(AppError::FeatureDisabled("PDF upload".to_string()));
    }

    let max = state.config.extraction.max_upload_bytes;
    let (filename, data) = read_pdf_field(&mut multipart, max).await?;

    tracing::info!("User {} uploaded '{filename}' ({} bytes)", claims.sub, data.len());

    let pages = state.extractor.extract(data, &filename).await?;
    let document = join_pages(&pages);

    let chunking = state.config.extraction.chunk_config()?;
    let chunks = chunk_text(&document, &chunking);
    let text = chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    tracing::info!(
        "Extracted '{filename}': {} pages, {} chunks, {} chars",
        pages.len(),
        chunks.len(),
        text.len()
    );

    Ok(Json(ExtractResponse {
        text,
        page_count: pages.len(),
        filename,
        chunk_count: chunks.len(),
    }))
}

/// Pull the uploaded PDF out of the form, enforcing the declared type and the
/// size ceiling before anything is handed to the extractor.
async fn read_pdf_field(
    multipart: &mut Multipart,
    max_bytes: usize,
) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart data: {e}")))?
    {
        if !field.name().is_some_and(|n| FILE_FIELDS.contains(&n)) {
            continue;
        }

        let filename = field.file_name().unwrap_or("document.pdf").to_string();

        // Only the declared type counts; the bytes are never sniffed.
        if field.content_type() != Some(PDF_MIME_TYPE) {
            return Err(AppError::Validation("Only PDF files are allowed".to_string()));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;

        if data.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "File size should be less than {} MB",
                max_bytes / 1024 / 1024
            )));
        }

        return Ok((filename, data.to_vec()));
    }

    Err(AppError::Validation("PDF file is required".to_string()))
}
