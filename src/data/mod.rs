//! Core data models for the suggestion proxy
//!
//! This module contains the suggestion types returned to callers and stored in
//! the cache, plus the upstream client and the envelope decoder that feed them.

pub mod client;
pub mod envelope;
pub mod suggestions;

pub use client::{BingClient, SearchApi};
pub use envelope::{Entity, Envelope, EnvelopeError, RawSuggestion};
pub use suggestions::fetch_suggestions;

use serde::{Deserialize, Serialize};

/// Kind of a suggestion as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    /// Plain search completion
    Search,
    /// Suggestion enriched with entity metadata
    Entity,
}

/// A search suggestion, either plain or enriched with entity metadata
///
/// Plain suggestions serialize as `{type, title, value}`. Enriched suggestions
/// additionally carry `entityImage` and `subtitle2` when the upstream entity
/// provided them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Whether this suggestion has been enriched
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    /// Display text; also the cache key
    pub title: String,
    /// Target URL
    pub value: String,
    /// Thumbnail of the matched entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_image: Option<String>,
    /// Short description of the matched entity, e.g. "Film"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle2: Option<String>,
}

impl Suggestion {
    /// Creates a plain search suggestion
    pub fn search(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: SuggestionKind::Search,
            title: title.into(),
            value: value.into(),
            entity_image: None,
            subtitle2: None,
        }
    }

    /// Returns true if this suggestion carries entity metadata
    pub fn is_enriched(&self) -> bool {
        self.kind == SuggestionKind::Entity
    }

    /// Estimated heap and inline footprint in bytes
    pub fn approx_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.title.len()
            + self.value.len()
            + self.entity_image.as_ref().map_or(0, String::len)
            + self.subtitle2.as_ref().map_or(0, String::len)
    }
}
