use crate::services::chunker::{chunk_text, ChunkConfig};

/// Builds the prompt sent to the completion service.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    chunking: ChunkConfig,
}

impl ContextAssembler {
    /// `chunking` is the context-window pass, usually larger than the one
    /// used at upload time.
    pub fn new(chunking: ChunkConfig) -> Self {
        Self { chunking }
    }

    /// Returns `question` unchanged when there is no document text.
    ///
    /// Otherwise the document is re-chunked and only the first chunk is
    /// embedded. Nothing ranks chunks against the question yet, so answers
    /// about later parts of a long document will be missing context.
    pub fn build_prompt(&self, question: &str, document_text: Option<&str>) -> String {
        let Some(document) = document_text.filter(|t| !t.trim().is_empty()) else {
            return question.to_string();
        };

        let chunks = chunk_text(document, &self.chunking);
        let context = chunks.first().map(|c| c.text.as_str()).unwrap_or_default();

        format!(
            "Context from PDF:\n{context}\n\n\
             Question: {question}\n\n\
             Answer the question using only the context above. \
             If the answer is not contained in the context, say so explicitly."
        )
    }
}
