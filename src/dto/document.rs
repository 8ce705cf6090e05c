use serde::Serialize;

/// Result of `POST /api/extract`. The text is kept by the client and sent
/// back with each question; nothing is stored server-side.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub text: String,
    pub page_count: usize,
    pub filename: String,
    pub chunk_count: usize,
}
