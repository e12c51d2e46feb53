//! Language model backends for Stepwise.
//!
//! All providers implement the `stepwise_core::Provider` trait. The only
//! backend shipped is the OpenAI-compatible one, which covers Ollama,
//! OpenAI, OpenRouter, vLLM and most hosted gateways.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use std::sync::Arc;
use stepwise_core::error::ProviderError;
use stepwise_core::provider::Provider;

/// Build the configured provider.
pub fn build_from_config(
    config: &stepwise_config::ProviderConfig,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let provider = OpenAiCompatProvider::new(
        &config.name,
        &config.api_url,
        config.api_key.clone().unwrap_or_default(),
    )?
    .with_timeout_secs(config.request_timeout_secs)?;
    Ok(Arc::new(provider))
}
