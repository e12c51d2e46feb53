//! Web search tool — Wikipedia search with short page summaries.
//!
//! A query runs a full-text search, then fetches the REST summary of each
//! hit in order until three readable summaries have been collected.
//! Disambiguation pages and pages whose summary cannot be fetched are
//! skipped.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use stepwise_core::error::ToolError;
use stepwise_core::tool::{Tool, ToolResult};
use tracing::debug;

const MAX_RESULTS: usize = 3;
const SEARCH_LIMIT: &str = "10";
const SUMMARY_SENTENCES: usize = 2;
const MAX_OPTIONS: usize = 5;

pub struct WebSearchTool {
    client: reqwest::Client,
    base_url: String,
}

impl WebSearchTool {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, String> {
        let mut url = Url::parse(&self.base_url).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|_| format!("{} cannot take a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn search_titles(&self, query: &str) -> Result<Vec<String>, String> {
        let mut url = self.endpoint(&["w", "api.php"])?;
        url.query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("list", "search")
            .append_pair("srsearch", query)
            .append_pair("format", "json")
            .append_pair("srlimit", SEARCH_LIMIT);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;
        let body: SearchResponse = response.json().await.map_err(|e| e.to_string())?;
        Ok(body.query.search.into_iter().map(|hit| hit.title).collect())
    }

    async fn summary(&self, title: &str) -> Summary {
        let page = title.replace(' ', "_");
        let url = match self.endpoint(&["api", "rest_v1", "page", "summary", page.as_str()]) {
            Ok(url) => url,
            Err(_) => return Summary::Unavailable,
        };

        let response = match self.client.get(url).send().await {
            Ok(r) if r.status().as_u16() == 200 => r,
            Ok(r) => {
                debug!(title, status = r.status().as_u16(), "Summary unavailable");
                return Summary::Unavailable;
            }
            Err(e) => {
                debug!(title, error = %e, "Summary request failed");
                return Summary::Unavailable;
            }
        };

        match response.json::<PageSummary>().await {
            Ok(page) if page.kind == "disambiguation" => Summary::Disambiguation,
            Ok(page) if !page.extract.trim().is_empty() => {
                Summary::Text(first_sentences(&page.extract, SUMMARY_SENTENCES))
            }
            _ => Summary::Unavailable,
        }
    }
}

enum Summary {
    Text(String),
    Disambiguation,
    Unavailable,
}

/// The first `n` sentences of `text`, whitespace-normalized.
fn first_sentences(text: &str, n: usize) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut count = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().is_none_or(|(_, next)| *next == ' ');
            if at_boundary {
                count += 1;
                if count == n {
                    return text[..i + c.len_utf8()].to_string();
                }
            }
        }
    }
    text
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search Wikipedia for facts about people, places, events, or things. \
         Returns short summaries of the best matching articles."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query, e.g. 'Eiffel Tower'"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?
            .trim();

        let titles = match self.search_titles(query).await {
            Ok(titles) => titles,
            Err(e) => return Ok(ToolResult::failure(format!("Error searching: {e}"))),
        };
        debug!(query, hits = titles.len(), "Search complete");

        if titles.is_empty() {
            return Ok(ToolResult::failure(format!("No results found for '{query}'.")));
        }

        let mut results = Vec::new();
        let mut ambiguous = false;
        for title in &titles {
            if results.len() >= MAX_RESULTS {
                break;
            }
            match self.summary(title).await {
                Summary::Text(text) => results.push(format!("Result ('{title}'): {text}")),
                Summary::Disambiguation => ambiguous = true,
                Summary::Unavailable => {}
            }
        }

        if !results.is_empty() {
            return Ok(ToolResult::ok(results.join(" | ")));
        }

        if ambiguous {
            let options: Vec<&str> = titles.iter().take(MAX_OPTIONS).map(String::as_str).collect();
            return Ok(ToolResult::failure(format!(
                "Search is ambiguous. Options: {}",
                options.join(", ")
            )));
        }

        Ok(ToolResult::failure(format!(
            "No readable results found for '{query}'. Try a different keyword."
        )))
    }
}

// ── Wikipedia API types ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct SearchResponse {
    query: SearchQuery,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct PageSummary {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    extract: String,
}
