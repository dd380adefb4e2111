//! Suggestion fetcher
//!
//! Turns the upstream's raw completions into normalized [`Suggestion`]s.

use super::client::SearchApi;
use super::envelope::RawSuggestion;
use super::Suggestion;
use crate::error::SuggestError;

impl From<RawSuggestion> for Suggestion {
    fn from(raw: RawSuggestion) -> Self {
        Suggestion::search(raw.display_text, raw.url)
    }
}

/// Fetches suggestions for `query`, preserving upstream order
///
/// # Returns
/// * `Ok(Vec<Suggestion>)` - plain search suggestions
/// * `Err(SuggestError::RateLimited)` - if the upstream throttled the call
/// * `Err(SuggestError)` - any other upstream, transport or decode failure
pub async fn fetch_suggestions(
    api: &dyn SearchApi,
    query: &str,
    credential: &str,
) -> Result<Vec<Suggestion>, SuggestError> {
    let raw = api.fetch_suggestions(query, credential).await?;
    tracing::debug!(query, count = raw.len(), "Fetched upstream suggestions");
    Ok(raw.into_iter().map(Suggestion::from).collect())
}
