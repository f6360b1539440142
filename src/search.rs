//! Search client for the grounding index.
//!
//! Issues a multi-field match query against one fixed collection and returns
//! the ranked hits, best match first. Failures never cross this boundary:
//! the caller always gets a hit list, possibly empty, and the pipeline
//! proceeds with whatever grounding is available.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::{Config, SearchConfig};
use crate::models::{Hit, SearchResponse};

/// Source of grounding passages for a question.
///
/// Implemented by [`SearchClient`] for the real search service; tests
/// substitute in-memory implementations.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Ranked hits for a free-text question. Never fails: any retrieval
    /// error degrades to an empty list.
    async fn retrieve(&self, question: &str) -> Vec<Hit>;
}

/// Client for an Elasticsearch-compatible search endpoint.
pub struct SearchClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    index: String,
    fields: Vec<String>,
    max_hits: usize,
}

impl SearchClient {
    /// Create a client against an explicit endpoint.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        config: &SearchConfig,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build search HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            index: config.index.clone(),
            fields: config.fields.clone(),
            max_hits: config.max_hits,
        })
    }

    /// Create a client from config plus the environment
    /// (`ES_ENDPOINT`, `ES_API_KEY`).
    pub fn from_env(config: &Config) -> Result<Self> {
        let endpoint = config.search_endpoint()?;
        let api_key = std::env::var("ES_API_KEY").ok();
        Self::new(endpoint, api_key, &config.search)
    }

    /// The fixed collection this client queries.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Primary source text field (the first configured field).
    pub fn primary_field(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or("content")
    }

    /// Fallible search used internally and by tests that need to observe
    /// the error. [`Retriever::retrieve`] wraps this with the degrade rule.
    pub async fn execute(&self, question: &str) -> Result<Vec<Hit>> {
        let url = format!("{}/{}/_search", self.endpoint, self.index);
        let body = search_body(question, &self.fields, self.max_hits);

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("ApiKey {}", key));
        }

        let response = request.send().await.context("Search request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Search service error {}: {}", status, body_text);
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .context("Failed to parse search response")?;

        let mut hits = parsed.hits.hits;
        hits.truncate(self.max_hits);
        Ok(hits)
    }
}

#[async_trait]
impl Retriever for SearchClient {
    async fn retrieve(&self, question: &str) -> Vec<Hit> {
        match self.execute(question).await {
            Ok(hits) => hits,
            Err(e) => {
                eprintln!("Search failed, continuing without context: {:#}", e);
                Vec::new()
            }
        }
    }
}

/// Runs a search and prints the ranked hits. Debugging aid for the
/// `ragline search` command; errors surface here instead of degrading.
pub async fn run_search(config: &Config, query: &str) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let client = SearchClient::from_env(config)?;
    let hits = client.execute(query).await?;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let field = client.primary_field().to_string();
    for (rank, hit) in hits.iter().enumerate() {
        let score = hit
            .score
            .map(|s| format!("{:.4}", s))
            .unwrap_or_else(|| "-".to_string());
        println!("{}. [{}] score={}", rank + 1, hit.index, score);

        if let Some(texts) = hit.inner_hit_texts(&field) {
            for text in texts {
                println!("   {}", text);
            }
        } else if let Some(text) = hit.source_text(&field) {
            println!("   {}", text);
        }
    }

    Ok(())
}

/// Request body for a multi-field match against the fixed collection.
fn search_body(question: &str, fields: &[String], size: usize) -> serde_json::Value {
    serde_json::json!({
        "retriever": {
            "standard": {
                "query": {
                    "multi_match": {
                        "query": question,
                        "fields": fields,
                    }
                }
            }
        },
        "size": size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_body_shape() {
        let body = search_body("apa itu aturan umum?", &["content".to_string()], 3);
        assert_eq!(
            body["retriever"]["standard"]["query"]["multi_match"]["query"],
            "apa itu aturan umum?"
        );
        assert_eq!(
            body["retriever"]["standard"]["query"]["multi_match"]["fields"][0],
            "content"
        );
        assert_eq!(body["size"], 3);
    }

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let client = SearchClient::new(
            "https://es.example.com/",
            None,
            &SearchConfig::default(),
        )
        .unwrap();
        assert_eq!(client.endpoint, "https://es.example.com");
    }

    #[test]
    fn primary_field_defaults_to_content() {
        let client =
            SearchClient::new("https://es.example.com", None, &SearchConfig::default()).unwrap();
        assert_eq!(client.primary_field(), "content");
        assert_eq!(client.index(), "general-rules-pdf");
    }
}
