use anyhow::{ensure, Result};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::services::chunker::{ChunkConfig, ChunkConfigError};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub extraction: ExtractionConfig,
    pub context: ContextConfig,
    pub features: FeatureFlags,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default)]
    pub issuer: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub system_prompt: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    pub max_upload_bytes: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub use_pdftotext: bool,
    pub timeout_secs: u64,
}

impl ExtractionConfig {
    pub fn chunk_config(&self) -> Result<ChunkConfig, ChunkConfigError> {
        ChunkConfig::new(self.chunk_size, self.chunk_overlap)
    }
}

/// Chunking parameters for the secondary pass that picks prompt context.
#[derive(Debug, Deserialize, Clone)]
pub struct ContextConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ContextConfig {
    pub fn chunk_config(&self) -> Result<ChunkConfig, ChunkConfigError> {
        ChunkConfig::new(self.chunk_size, self.chunk_overlap)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeatureFlags {
    pub pdf_upload_enabled: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(env_source())
    }

    fn load_with(env: Environment) -> Result<Self, ConfigError> {
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        self.extraction.chunk_config()?;
        self.context.chunk_config()?;
        ensure!(
            !self.auth.jwt_secret.trim().is_empty(),
            "auth.jwt_secret must not be empty"
        );
        ensure!(
            self.extraction.max_upload_bytes > 0,
            "extraction.max_upload_bytes must be positive"
        );
        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("APP").separator("__")
}
