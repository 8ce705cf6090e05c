use crate::config::AppConfig;
use crate::db::models::session::SessionRepository;
use crate::services::context::ContextAssembler;
use crate::services::extractor::DocumentExtractor;
use crate::services::llm_provider::CompletionService;
use anyhow::Result;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<dyn SessionRepository>,
    pub completion: Arc<dyn CompletionService>,
    pub extractor: DocumentExtractor,
    pub assembler: ContextAssembler,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        sessions: Arc<dyn SessionRepository>,
        completion: Arc<dyn CompletionService>,
    ) -> Result<Self> {
        let extractor = DocumentExtractor::new(&config.extraction);
        let assembler = ContextAssembler::new(config.context.chunk_config()?);

        Ok(Self {
            config: Arc::new(config),
            sessions,
            completion,
            extractor,
            assembler,
        })
    }
}
