//! LLM access: the [`ChatModel`] seam and provider resolution.
//!
//! Drafting and reviewing only ever need "system prompt + user message in,
//! text out", so they are written against [`ChatModel`] instead of the full
//! provider trait. [`ProviderChatModel`] adapts any `edgequake_llm`
//! provider; tests plug in a scripted model.

use crate::config::WizardConfig;
use crate::error::WizardError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// A single-shot chat completion.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one system + one user message and return the raw reply text.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: usize,
    ) -> Result<String, WizardError>;
}

/// [`ChatModel`] backed by an `edgequake_llm` provider.
pub struct ProviderChatModel {
    provider: Arc<dyn LLMProvider>,
    temperature: Option<f32>,
}

impl ProviderChatModel {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: Option<f32>) -> Self {
        Self {
            provider,
            temperature,
        }
    }
}

#[async_trait]
impl ChatModel for ProviderChatModel {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: usize,
    ) -> Result<String, WizardError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let options = CompletionOptions {
            temperature: self.temperature,
            max_tokens: Some(max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| WizardError::ModelFailure {
                message: e.to_string(),
            })?;

        debug!(
            "LLM call: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Resolve the configured provider and wrap it as a [`ChatModel`].
pub fn resolve_chat_model(config: &WizardConfig) -> Result<Arc<dyn ChatModel>, WizardError> {
    let provider = resolve_provider(config)?;
    Ok(Arc::new(ProviderChatModel::new(provider, config.temperature)))
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, WizardError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        WizardError::UpstreamUnavailable {
            what: format!("LLM provider '{provider_name}'"),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) used as-is.
/// 2. **Named provider** (`config.provider_name`, which `from_env` fills from
///    `EDGEQUAKE_LLM_PROVIDER`) with `config.model_id()`.
/// 3. **OpenAI** when `OPENAI_API_KEY` is set.
/// 4. **Full auto-detection** via [`ProviderFactory::from_env`].
pub fn resolve_provider(config: &WizardConfig) -> Result<Arc<dyn LLMProvider>, WizardError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_id());
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", config.model_id());
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| WizardError::UpstreamUnavailable {
            what: "LLM provider".to_string(),
            hint: format!(
                "No model credential found in the environment.\n\
                Set OPENAI_API_KEY (or ANTHROPIC_API_KEY, GEMINI_API_KEY) before starting.\n\
                Error: {e}"
            ),
        })?;

    Ok(llm_provider)
}
