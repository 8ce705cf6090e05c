use std::str::FromStr;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use rig::client::completion::CompletionClientDyn;
use rig::client::{ProviderClient, ProviderValue};
use rig::completion::Prompt;
use rig::providers::{
    anthropic, cohere, deepseek, gemini, groq, mistral, ollama, openai, openrouter, perplexity,
    together, xai,
};

use crate::config::LlmConfig;

/// Text-completion backend. Treated as a single opaque call: one prompt in,
/// one complete response out.
pub trait CompletionService: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Anthropic,
    Groq,
    DeepSeek,
    Gemini,
    Cohere,
    Mistral,
    OpenRouter,
    Perplexity,
    Together,
    Xai,
    Ollama,
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "groq" => Ok(Provider::Groq),
            "deepseek" => Ok(Provider::DeepSeek),
            "gemini" | "google" => Ok(Provider::Gemini),
            "cohere" => Ok(Provider::Cohere),
            "mistral" => Ok(Provider::Mistral),
            "openrouter" => Ok(Provider::OpenRouter),
            "perplexity" => Ok(Provider::Perplexity),
            "together" => Ok(Provider::Together),
            "xai" => Ok(Provider::Xai),
            "ollama" => Ok(Provider::Ollama),
            other => Err(anyhow::anyhow!("Unsupported provider: {other}")),
        }
    }
}

impl Provider {
    /// Ollama runs locally and is the only provider usable without a key.
    pub fn requires_api_key(self) -> bool {
        self != Provider::Ollama
    }

    fn client(self, api_key: &str) -> Box<dyn ProviderClient> {
        let value = ProviderValue::Simple(api_key.to_string());

        macro_rules! boxed {
            ($module:ident) => {{
                let client: $module::Client<reqwest::Client> = $module::Client::from_val(value);
                client.boxed()
            }};
        }

        match self {
            Provider::OpenAi => boxed!(openai),
            Provider::Anthropic => boxed!(anthropic),
            Provider::Groq => boxed!(groq),
            Provider::DeepSeek => boxed!(deepseek),
            Provider::Gemini => boxed!(gemini),
            Provider::Cohere => boxed!(cohere),
            Provider::Mistral => boxed!(mistral),
            Provider::OpenRouter => boxed!(openrouter),
            Provider::Perplexity => boxed!(perplexity),
            Provider::Together => boxed!(together),
            Provider::Xai => boxed!(xai),
            Provider::Ollama => boxed!(ollama),
        }
    }
}

/// Completion service backed by a `rig` provider client. The API key only
/// ever comes from configuration.
pub struct RigCompletionService {
    provider: Provider,
    model: String,
    api_key: String,
    system_prompt: String,
}

impl RigCompletionService {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let provider: Provider = config.provider.parse()?;
        if provider.requires_api_key() && config.api_key.trim().is_empty() {
            tracing::warn!(
                "No API key configured for provider '{}'; set APP__LLM__API_KEY",
                config.provider
            );
        }

        Ok(Self {
            provider,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            system_prompt: config.system_prompt.clone(),
        })
    }

    fn completion_client(&self) -> Result<Box<dyn CompletionClientDyn>> {
        self.provider
            .client(&self.api_key)
            .as_completion()
            .context(format!("Provider {:?} does not support completions", self.provider))
    }
}

impl CompletionService for RigCompletionService {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            if self.provider.requires_api_key() && self.api_key.trim().is_empty() {
                anyhow::bail!("no API key configured for {:?}", self.provider);
            }

            let client = self.completion_client()?;
            let agent = client
                .agent(&self.model)
                .preamble(&self.system_prompt)
                .build();

            let response = agent
                .prompt(prompt)
                .await
                .map_err(|e| anyhow::anyhow!("LLM error: {e}"))?;

            tracing::debug!(
                "Completion from {:?}/{}: {} chars",
                self.provider,
                self.model,
                response.len()
            );
            Ok(response)
        })
    }
}
