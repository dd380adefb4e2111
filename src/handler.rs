//! HTTP request handler
//!
//! Serves `GET /suggestions?q=<text>&enhance=true`. Validation happens before
//! any upstream call; enrichment, when requested, never delays the response.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::cache::SuggestionCache;
use crate::config::ServiceConfig;
use crate::data::{fetch_suggestions, SearchApi, Suggestion};
use crate::enrich::Enricher;
use crate::error::SuggestError;

/// Cache-Control sent when every suggestion came from the cache
pub const CACHEABLE_FOR_A_DAY: &str = "public, max-age=86400";

/// Shared state handed to every request
#[derive(Clone)]
pub struct AppState {
    api: Arc<dyn SearchApi>,
    config: ServiceConfig,
    enricher: Enricher,
}

impl AppState {
    /// Wires the upstream client and cache into request state
    pub fn new(
        api: Arc<dyn SearchApi>,
        cache: Arc<dyn SuggestionCache>,
        config: ServiceConfig,
    ) -> Self {
        let enricher = Enricher::new(Arc::clone(&api), cache, config.cache_ttl);
        Self {
            api,
            config,
            enricher,
        }
    }

    /// The enrichment merger, exposed so callers can await background writes
    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }
}

/// Query parameters accepted by the suggestion endpoint
#[derive(Debug, Default, Deserialize)]
pub struct SuggestParams {
    pub q: Option<String>,
    pub enhance: Option<String>,
}

impl SuggestParams {
    fn wants_enhance(&self) -> bool {
        self.enhance.as_deref() == Some("true")
    }
}

/// Response body of the suggestion endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub q: String,
    pub suggestions: Vec<Suggestion>,
}

/// Builds the router serving the suggestion endpoint
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(suggest))
        .route("/suggestions", get(suggest))
        .with_state(state)
}

/// GET /suggestions - Fetch and optionally enrich suggestions.
///
/// A query string that cannot be parsed is answered like a missing `q`.
pub async fn suggest(
    State(state): State<AppState>,
    params: Result<Query<SuggestParams>, QueryRejection>,
) -> Response {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unparseable query string");
            return SuggestError::MissingQuery.into_response();
        }
    };

    match respond(&state, params).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn respond(state: &AppState, params: SuggestParams) -> Result<Response, SuggestError> {
    let enhance = params.wants_enhance();
    let query = params
        .q
        .filter(|q| !q.is_empty())
        .ok_or(SuggestError::MissingQuery)?;
    let credential = state
        .config
        .credential
        .resolve()
        .ok_or(SuggestError::MissingCredential)?;

    let suggestions = fetch_suggestions(state.api.as_ref(), &query, &credential).await?;

    let (suggestions, fully_enhanced) = if enhance {
        let merged = state.enricher.merge(suggestions, &credential);
        (merged.suggestions, merged.fully_enhanced)
    } else {
        (suggestions, true)
    };

    tracing::info!(
        query = %query,
        count = suggestions.len(),
        enhance,
        fully_enhanced,
        "Serving suggestions"
    );

    let mut response = Json(SuggestResponse {
        q: query,
        suggestions,
    })
    .into_response();

    if fully_enhanced {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(CACHEABLE_FOR_A_DAY),
        );
    }

    Ok(response)
}
