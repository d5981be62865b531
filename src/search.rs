//! Cached remote-call helper
//!
//! Fronts a pluggable search service with a bounded LRU cache: hits
//! come straight from the cache, misses call through and populate it,
//! failures propagate uncached. The service is injected per call so
//! tests and alternate providers substitute freely.

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lru::LruCache;

/// Result payload of one search query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Value,
}

/// A remote search provider.
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResponse>;
}

/// Default provider: POSTs `{"query": ...}` to an HTTP endpoint.
pub struct HttpSearchService {
    client: Client,
    endpoint: String,
}

impl HttpSearchService {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("mcp-gateway/0.1")
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {e}"))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SearchService for HttpSearchService {
    async fn search(&self, query: &str) -> Result<SearchResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Search service error {}: {}", status, text));
        }

        Ok(response.json().await?)
    }
}

/// Look a query up in the cache, calling through on a miss.
///
/// The cache lock is released before the remote call; only the result
/// of a successful call is stored.
pub async fn cached_search(
    query: &str,
    service: &dyn SearchService,
    cache: &Mutex<LruCache<String, SearchResponse>>,
) -> Result<SearchResponse> {
    {
        let mut cache = cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(hit) = cache.get(&query.to_string()) {
            tracing::debug!(query, "Search cache hit");
            return Ok(hit.clone());
        }
    }

    let response = service.search(query).await?;

    let mut cache = cache.lock().unwrap_or_else(|e| e.into_inner());
    cache.set(query.to_string(), response.clone());
    Ok(response)
}
