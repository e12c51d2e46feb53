//! Weather tool — current conditions from a wttr.in-style service.

use async_trait::async_trait;
use reqwest::Url;
use stepwise_core::error::ToolError;
use stepwise_core::tool::{Tool, ToolResult};
use tracing::debug;

/// Condition and temperature on one line, e.g. "Partly cloudy +12°C".
const WEATHER_FORMAT: &str = "format=%C+%t";

pub struct WeatherTool {
    client: reqwest::Client,
    base_url: String,
}

impl WeatherTool {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, city: &str) -> Result<Url, ToolError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| ToolError::ExecutionFailed {
            tool_name: "get_weather".into(),
            reason: format!("Invalid weather service URL: {e}"),
        })?;
        url.path_segments_mut()
            .map_err(|_| ToolError::ExecutionFailed {
                tool_name: "get_weather".into(),
                reason: "Weather service URL cannot take a path".into(),
            })?
            .pop_if_empty()
            .push(city);
        url.set_query(Some(WEATHER_FORMAT));
        Ok(url)
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather conditions and temperature for a city."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The city name, e.g. 'London'"
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let city = arguments["city"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'city' argument".into()))?
            .trim();

        let url = self.url_for(city)?;
        debug!(%url, "Fetching weather");

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return Ok(ToolResult::failure(format!("Error fetching weather: {e}"))),
        };

        let status = response.status().as_u16();
        if status != 200 {
            return Ok(ToolResult::failure(format!(
                "Could not get weather for {city}. Status: {status}"
            )));
        }

        match response.text().await {
            Ok(body) => Ok(ToolResult::ok(format!(
                "Current weather in {city}: {}",
                body.trim()
            ))),
            Err(e) => Ok(ToolResult::failure(format!("Error fetching weather: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tool(base: &str) -> WeatherTool {
        WeatherTool::new(http_client(Duration::from_secs(5)), base)
    }

    #[test]
    fn url_encodes_city_as_path_segment() {
        let url = tool("https://wttr.in/").url_for("New York").unwrap();
        assert_eq!(url.as_str(), "https://wttr.in/New%20York?format=%C+%t");
    }

    #[tokio::test]
    async fn successful_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/London"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Partly cloudy +12°C\n"))
            .expect(1)
            .mount(&server)
            .await;

        let result = tool(&server.uri())
            .execute(serde_json::json!({"city": "London"}))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.output, "Current weather in London: Partly cloudy +12°C");
    }

    #[tokio::test]
    async fn non_200_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = tool(&server.uri())
            .execute(serde_json::json!({"city": "Atlantis"}))
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.output, "Could not get weather for Atlantis. Status: 404");
    }

    #[tokio::test]
    async fn network_error_is_failure() {
        let result = tool("http://127.0.0.1:9")
            .execute(serde_json::json!({"city": "Paris"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.starts_with("Error fetching weather"));
    }

    #[tokio::test]
    async fn missing_city_returns_error() {
        let result = tool("https://wttr.in").execute(serde_json::json!({})).await;
        assert!(result.is_err());
    }
}
