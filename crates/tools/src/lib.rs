//! Built-in tool implementations for Stepwise.
//!
//! Four tools ship with the agent:
//!
//! - `web_search` — Wikipedia search returning short summaries
//! - `get_weather` — current conditions from wttr.in
//! - `get_response_time` — wall-clock latency of a GET request
//! - `calculate` — safe arithmetic evaluation
//!
//! The network tools are bounded by the configured timeout and are safe
//! to call concurrently from unrelated conversations.

pub mod calculator;
pub mod response_time;
pub mod weather;
pub mod web_search;

use std::time::Duration;
use stepwise_config::ToolsConfig;
use stepwise_core::tool::ToolRegistry;

pub use calculator::CalculatorTool;
pub use response_time::ResponseTimeTool;
pub use weather::WeatherTool;
pub use web_search::WebSearchTool;

/// Create a registry with all built-in tools and default settings.
pub fn default_registry() -> ToolRegistry {
    registry_from_config(&ToolsConfig::default())
}

/// Create a registry with all built-in tools configured from `config`.
pub fn registry_from_config(config: &ToolsConfig) -> ToolRegistry {
    let timeout = Duration::from_secs(config.timeout_secs);
    let client = http_client(timeout);

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(WebSearchTool::new(
        client.clone(),
        &config.search_url,
    )));
    registry.register(Box::new(WeatherTool::new(client.clone(), &config.weather_url)));
    registry.register(Box::new(ResponseTimeTool::new(client)));
    registry.register(Box::new(CalculatorTool));
    registry
}

/// Shared HTTP client for the network-backed tools.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("stepwise/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_all_tools() {
        let registry = default_registry();
        assert_eq!(
            registry.names(),
            vec!["calculate", "get_response_time", "get_weather", "web_search"]
        );
    }

    #[test]
    fn every_tool_declares_required_params() {
        for def in default_registry().definitions() {
            let required = def.parameters["required"].as_array().unwrap();
            assert_eq!(required.len(), 1, "{} should take one argument", def.name);
            assert!(!def.description.is_empty());
        }
    }
}
