//! Upstream search API client
//!
//! This module provides the [`SearchApi`] seam the handler and the enrichment
//! merger call through, and [`BingClient`], its HTTP implementation.

use async_trait::async_trait;
use reqwest::Client;

use super::envelope::{Entity, Envelope, RawSuggestion};
use crate::error::SuggestError;

/// Base URL for the upstream search API
pub const DEFAULT_BASE_URL: &str = "https://api.bing.microsoft.com/v7.0";

/// Calls made against the upstream search service
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Fetches search completions for a free-text query
    async fn fetch_suggestions(
        &self,
        query: &str,
        credential: &str,
    ) -> Result<Vec<RawSuggestion>, SuggestError>;

    /// Looks up the best entity match for a suggestion title
    async fn fetch_entities(
        &self,
        title: &str,
        credential: &str,
    ) -> Result<Vec<Entity>, SuggestError>;
}

/// Client for the Bing suggestion and entity search endpoints
#[derive(Debug, Clone)]
pub struct BingClient {
    http_client: Client,
    /// Base URL for the API (allows override for testing)
    base_url: String,
}

impl Default for BingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BingClient {
    /// Creates a new BingClient against the public endpoint
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a new BingClient against a custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn suggestions_url(&self, query: &str, credential: &str) -> String {
        format!(
            "{}/suggestions?appid={}&q={}",
            self.base_url,
            urlencoding::encode(credential),
            urlencoding::encode(query)
        )
    }

    fn entities_url(&self, title: &str, credential: &str) -> String {
        format!(
            "{}/search?appid={}&q={}&responseFilter=entities&count=1",
            self.base_url,
            urlencoding::encode(credential),
            urlencoding::encode(title)
        )
    }

    /// Issues a GET and decodes the body regardless of HTTP status
    ///
    /// The upstream reports throttling and other failures in the body, so the
    /// status line is not consulted.
    async fn get_envelope(&self, url: &str) -> Result<Envelope, SuggestError> {
        let response = self.http_client.get(url).send().await?;
        let text = response.text().await?;
        Ok(Envelope::decode(&text)?)
    }
}

#[async_trait]
impl SearchApi for BingClient {
    async fn fetch_suggestions(
        &self,
        query: &str,
        credential: &str,
    ) -> Result<Vec<RawSuggestion>, SuggestError> {
        let url = self.suggestions_url(query, credential);
        self.get_envelope(&url).await?.into_suggestions()
    }

    async fn fetch_entities(
        &self,
        title: &str,
        credential: &str,
    ) -> Result<Vec<Entity>, SuggestError> {
        let url = self.entities_url(title, credential);
        self.get_envelope(&url).await?.into_entities()
    }
}
