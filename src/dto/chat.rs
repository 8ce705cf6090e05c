use serde::{Deserialize, Serialize};

use crate::db::models::session::Message;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "pdfText")]
    pub document_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveSessionRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
