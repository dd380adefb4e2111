//! Decoding of upstream response envelopes
//!
//! Every upstream body is classified into one of three shapes before any field
//! is read: an error envelope, a suggestion envelope, or an entity envelope.
//! Bodies that match none of them fail with [`EnvelopeError::ShapeMismatch`].

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::error::SuggestError;

/// Error code the upstream uses when the caller is throttled
pub const RATE_LIMIT_CODE: &str = "RateLimitExceeded";

/// Scenario the upstream assigns to its primary match
const DOMINANT_SCENARIO: &str = "DominantEntity";

/// Errors that can occur while decoding an upstream body
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Body was not valid JSON or a field had the wrong type
    #[error("Failed to parse upstream response: {0}")]
    Json(#[from] serde_json::Error),

    /// Body was valid JSON but not the envelope we expected
    #[error("Unexpected upstream response shape: expected {expected}, got {found}")]
    ShapeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// A decoded upstream response
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `_type: "ErrorResponse"`
    Error(ErrorEnvelope),
    /// Autosuggest result
    Suggestions(SuggestionEnvelope),
    /// Web search result filtered to entities
    Entities(EntityEnvelope),
}

/// Error envelope returned by the upstream
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub errors: Vec<UpstreamError>,
}

/// A single upstream error
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpstreamError {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionEnvelope {
    #[serde(default)]
    pub suggestion_groups: Vec<SuggestionGroup>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionGroup {
    #[serde(default)]
    pub search_suggestions: Vec<RawSuggestion>,
}

/// A suggestion as the upstream reports it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSuggestion {
    pub display_text: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EntityEnvelope {
    #[serde(default)]
    pub value: Vec<Entity>,
}

/// An entity returned by the entity search
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub web_search_url: Option<String>,
    #[serde(default)]
    pub image: Option<EntityImage>,
    #[serde(default)]
    pub entity_presentation_info: Option<PresentationInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityImage {
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationInfo {
    #[serde(default)]
    pub entity_scenario: Option<String>,
    #[serde(default)]
    pub entity_type_display_hint: Option<String>,
}

impl Entity {
    /// Whether the upstream marked this entity as the primary match
    pub fn is_dominant(&self) -> bool {
        self.entity_presentation_info
            .as_ref()
            .and_then(|info| info.entity_scenario.as_deref())
            == Some(DOMINANT_SCENARIO)
    }

    /// Display hint used as the enriched subtitle
    pub fn display_hint(&self) -> Option<&str> {
        self.entity_presentation_info
            .as_ref()
            .and_then(|info| info.entity_type_display_hint.as_deref())
    }
}

impl Envelope {
    /// Classifies and decodes an upstream body
    pub fn decode(body: &str) -> Result<Self, EnvelopeError> {
        let value: Value = serde_json::from_str(body)?;
        let object = value.as_object().ok_or(EnvelopeError::ShapeMismatch {
            expected: "object",
            found: json_kind(&value),
        })?;

        let type_tag = object.get("_type").and_then(Value::as_str);

        if type_tag == Some("ErrorResponse") {
            return Ok(Envelope::Error(serde_json::from_value(value)?));
        }
        if object.contains_key("suggestionGroups") {
            return Ok(Envelope::Suggestions(serde_json::from_value(value)?));
        }
        if let Some(entities) = object.get("entities") {
            return Ok(Envelope::Entities(EntityEnvelope::deserialize(entities)?));
        }
        // A search response with no entity answer simply omits the field
        if type_tag == Some("SearchResponse") {
            return Ok(Envelope::Entities(EntityEnvelope::default()));
        }

        Err(EnvelopeError::ShapeMismatch {
            expected: "error, suggestion or entity envelope",
            found: "unrecognized object",
        })
    }

    /// Short name of the variant, used in shape mismatch errors
    fn kind(&self) -> &'static str {
        match self {
            Envelope::Error(_) => "error envelope",
            Envelope::Suggestions(_) => "suggestion envelope",
            Envelope::Entities(_) => "entity envelope",
        }
    }

    /// Extracts the raw suggestions of the first suggestion group
    pub fn into_suggestions(self) -> Result<Vec<RawSuggestion>, SuggestError> {
        match self {
            Envelope::Suggestions(envelope) => Ok(envelope
                .suggestion_groups
                .into_iter()
                .next()
                .map(|group| group.search_suggestions)
                .unwrap_or_default()),
            Envelope::Error(envelope) => Err(envelope.into()),
            other => Err(EnvelopeError::ShapeMismatch {
                expected: "suggestion envelope",
                found: other.kind(),
            }
            .into()),
        }
    }

    /// Extracts the entities of an entity search
    pub fn into_entities(self) -> Result<Vec<Entity>, SuggestError> {
        match self {
            Envelope::Entities(envelope) => Ok(envelope.value),
            Envelope::Error(envelope) => Err(envelope.into()),
            other => Err(EnvelopeError::ShapeMismatch {
                expected: "entity envelope",
                found: other.kind(),
            }
            .into()),
        }
    }
}

impl From<ErrorEnvelope> for SuggestError {
    fn from(envelope: ErrorEnvelope) -> Self {
        match envelope.errors.into_iter().next() {
            Some(error) if error.code == RATE_LIMIT_CODE => SuggestError::RateLimited,
            Some(error) => SuggestError::Upstream {
                code: error.code,
                message: error.message.unwrap_or_default(),
            },
            None => SuggestError::Upstream {
                code: "Unknown".to_string(),
                message: "error envelope without errors".to_string(),
            },
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
