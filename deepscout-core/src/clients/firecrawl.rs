//! Firecrawl-backed search and extract client.
//!
//! One HTTP client serves both capabilities. Transport failures, non-2xx
//! statuses, and malformed bodies all fold into structural non-success
//! responses; nothing here propagates an error to the caller.

use super::{ExtractProvider, ExtractResponse, Finding, SearchProvider, SearchResponse};
use crate::config::FirecrawlConfig;
use crate::error::ClientError;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client for the Firecrawl search and extract endpoints.
pub struct FirecrawlClient {
    http: reqwest::Client,
    config: FirecrawlConfig,
}

impl std::fmt::Debug for FirecrawlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirecrawlClient")
            .field("base_url", &self.config.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize)]
struct SearchBody<'a> {
    query: &'a str,
    limit: u32,
}

#[derive(Deserialize)]
struct SearchWire {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<SearchResultWire>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct SearchResultWire {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Serialize)]
struct ExtractBody<'a> {
    urls: [&'a str; 1],
    prompt: &'a str,
}

#[derive(Deserialize)]
struct ExtractWire {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Option<String>,
}

impl FirecrawlClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: FirecrawlConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("deepscout/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.http
            .post(format!("{}{}", self.config.base_url, path))
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
    }
}

#[async_trait]
impl SearchProvider for FirecrawlClient {
    async fn search(&self, query: &str) -> SearchResponse {
        let body = SearchBody {
            query,
            limit: self.config.search_limit,
        };

        let response = match self.post_json("/v1/search", &body).await {
            Ok(response) => response,
            Err(e) => return SearchResponse::failure(e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return SearchResponse::failure(format!("search returned HTTP {}", status.as_u16()));
        }

        let wire: SearchWire = match response.json().await {
            Ok(wire) => wire,
            Err(e) => return SearchResponse::failure(format!("malformed search response: {e}")),
        };

        if !wire.success {
            return SearchResponse::failure(
                wire.error.unwrap_or_else(|| "search returned success=false".to_string()),
            );
        }

        let results = wire
            .data
            .into_iter()
            .map(|r| super::SearchResult {
                url: r.url,
                title: r.title,
                description: r.description,
            })
            .collect();

        SearchResponse::ok(results)
    }
}

#[async_trait]
impl ExtractProvider for FirecrawlClient {
    async fn extract(&self, url: &str, prompt: &str) -> ExtractResponse {
        // Findings must carry a syntactically valid URL as their source
        if url::Url::parse(url).is_err() {
            return ExtractResponse::failure(format!("invalid url: {url:?}"));
        }

        let body = ExtractBody { urls: [url], prompt };

        let response = match self.post_json("/v1/extract", &body).await {
            Ok(response) => response,
            Err(e) => return ExtractResponse::failure(e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return ExtractResponse::failure(format!("extract returned HTTP {}", status.as_u16()));
        }

        let wire: ExtractWire = match response.json().await {
            Ok(wire) => wire,
            Err(e) => return ExtractResponse::failure(format!("malformed extract response: {e}")),
        };

        if !wire.success {
            return ExtractResponse::failure(
                wire.error.unwrap_or_else(|| "extract returned success=false".to_string()),
            );
        }

        ExtractResponse::ok(normalize_findings(wire.data, url))
    }
}

/// Normalize the extract endpoint's `data` payload into findings.
///
/// The service returns either a single record or a list; both shapes are
/// flattened, and the requesting URL is attached as `source` regardless of
/// what the service claims.
fn normalize_findings(data: Value, url: &str) -> Vec<Finding> {
    match data {
        Value::Array(items) => items
            .into_iter()
            .flat_map(|item| normalize_findings(item, url))
            .collect(),
        Value::String(text) if !text.trim().is_empty() => vec![Finding::new(text, url)],
        Value::Object(map) => {
            let text = map
                .get("text")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| Value::Object(map).to_string());
            if text.trim().is_empty() {
                Vec::new()
            } else {
                vec![Finding::new(text, url)]
            }
        }
        _ => Vec::new(),
    }
}
