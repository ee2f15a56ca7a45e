//! Web Search Adapter
//!
//! Queries a SearxNG-compatible endpoint in JSON mode and returns a small
//! set of title/url/snippet hits. The instance to use comes from the
//! environment; snippets are truncated before they reach the engine.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use agent_core::adapter::{names, ToolAdapter, ToolInput, ToolOutcome};

/// Web search configuration
#[derive(Clone, Debug)]
pub struct WebSearchConfig {
    /// SearxNG-compatible instance base URL (no trailing slash)
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Per-result snippet budget in characters
    pub max_snippet_chars: usize,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://searx.be".into(),
            timeout_secs: 15,
            max_snippet_chars: 400,
        }
    }
}

impl WebSearchConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("SEARCH_BASE_URL")
            .unwrap_or_else(|_| "https://searx.be".into());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }
}

#[derive(Deserialize)]
struct SearxResponse {
    #[serde(default)]
    results: Vec<SearxResult>,
}

#[derive(Deserialize)]
struct SearxResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// Web search over a SearxNG-compatible instance
pub struct WebSearchAdapter {
    client: reqwest::Client,
    config: WebSearchConfig,
}

impl WebSearchAdapter {
    pub fn new(config: WebSearchConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    pub fn from_env() -> Self {
        Self::new(WebSearchConfig::from_env())
    }
}

#[async_trait]
impl ToolAdapter for WebSearchAdapter {
    fn name(&self) -> &str {
        names::WEB_SEARCH
    }

    async fn invoke(&self, input: ToolInput) -> ToolOutcome {
        let Some(query) = input.str("query") else {
            return ToolOutcome::failure("missing parameter: query");
        };
        let limit = input.u64("limit").unwrap_or(5) as usize;

        let url = format!("{}/search", self.config.base_url);
        let response = match self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json")])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return ToolOutcome::failure(format!("search request failed: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            return ToolOutcome::failure(format!("search HTTP {}", status));
        }

        let parsed: SearxResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => return ToolOutcome::failure(format!("unreadable search response: {}", e)),
        };

        let results: Vec<_> = parsed
            .results
            .into_iter()
            .take(limit)
            .map(|result| {
                let snippet: String = result
                    .content
                    .chars()
                    .take(self.config.max_snippet_chars)
                    .collect();
                json!({
                    "title": result.title,
                    "url": result.url,
                    "snippet": snippet,
                })
            })
            .collect();

        ToolOutcome::ok().with("results", json!(results))
    }
}
