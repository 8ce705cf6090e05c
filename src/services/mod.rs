pub mod chat_session;
pub mod chunker;
pub mod context;
pub mod extractor;
pub mod llm_provider;
