//! Response time tool — measures how long a GET request takes.

use async_trait::async_trait;
use std::time::Instant;
use stepwise_core::error::ToolError;
use stepwise_core::tool::{Tool, ToolResult};
use tracing::debug;

pub struct ResponseTimeTool {
    client: reqwest::Client,
}

impl ResponseTimeTool {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Prefix `https://` unless the URL already names an http(s) scheme.
fn normalize_url(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

#[async_trait]
impl Tool for ResponseTimeTool {
    fn name(&self) -> &str {
        "get_response_time"
    }

    fn description(&self) -> &str {
        "Measure how long a website takes to respond to a GET request, in seconds."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL or host to time, e.g. 'example.com'"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let url = arguments["url"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'url' argument".into()))?;
        let url = normalize_url(url.trim());

        let started = Instant::now();
        match self.client.get(&url).send().await {
            Ok(response) => {
                let elapsed = started.elapsed().as_secs_f64();
                debug!(%url, status = response.status().as_u16(), elapsed, "Timed request");
                Ok(ToolResult::ok(format!("{elapsed:.2} seconds")))
            }
            Err(e) => Ok(ToolResult::failure(format!("Error: {e}"))),
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

    fn tool() -> ResponseTimeTool {
        ResponseTimeTool::new(http_client(Duration::from_secs(5)))
    }

    #[test]
    fn scheme_is_added_only_when_missing() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("HTTPS://example.com"), "HTTPS://example.com");
        // A host that merely starts with "http" still needs a scheme.
        assert_eq!(normalize_url("httpbin.org"), "https://httpbin.org");
    }

    #[tokio::test]
    async fn reports_seconds_for_any_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(503).set_delay(Duration::from_millis(50)))
            .expect(1)
            .mount(&server)
            .await;

        let result = tool()
            .execute(serde_json::json!({"url": format!("{}/slow", server.uri())}))
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.output.ends_with(" seconds"), "got {}", result.output);
        let secs: f64 = result.output.trim_end_matches(" seconds").parse().unwrap();
        assert!(secs >= 0.05);
    }

    #[tokio::test]
    async fn unreachable_host_is_failure() {
        let result = tool()
            .execute(serde_json::json!({"url": "http://127.0.0.1:9"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.starts_with("Error: "));
    }

    #[tokio::test]
    async fn missing_url_returns_error() {
        assert!(tool().execute(serde_json::json!({})).await.is_err());
    }
}
