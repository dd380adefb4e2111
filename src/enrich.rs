//! Enrichment merger
//!
//! Answers from the cache where it can and dispatches background entity
//! lookups for everything else. The caller never waits on those lookups; they
//! only fill the cache for later requests.

use chrono::Duration;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use crate::cache::SuggestionCache;
use crate::data::{Entity, SearchApi, Suggestion, SuggestionKind};
use crate::error::SuggestError;

/// Suggestions after the cache merge
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    /// One slot per input suggestion, in input order
    pub suggestions: Vec<Suggestion>,
    /// True when every slot came from the cache
    pub fully_enhanced: bool,
}

/// Merges cached enrichments into fetched suggestions
#[derive(Clone)]
pub struct Enricher {
    api: Arc<dyn SearchApi>,
    cache: Arc<dyn SuggestionCache>,
    ttl: Option<Duration>,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Enricher {
    /// Creates an enricher writing entries that live for `ttl`
    pub fn new(
        api: Arc<dyn SearchApi>,
        cache: Arc<dyn SuggestionCache>,
        ttl: Option<Duration>,
    ) -> Self {
        Self {
            api,
            cache,
            ttl,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replaces cache hits with their stored form and schedules misses
    ///
    /// Must be called from within a tokio runtime.
    pub fn merge(&self, suggestions: Vec<Suggestion>, credential: &str) -> Merged {
        let mut fully_enhanced = true;

        let suggestions = suggestions
            .into_iter()
            .map(|suggestion| match self.cache.get(&suggestion.title) {
                Some(cached) => {
                    tracing::debug!(title = %suggestion.title, "Enrichment cache hit");
                    cached
                }
                None => {
                    tracing::debug!(title = %suggestion.title, "Enrichment cache miss");
                    fully_enhanced = false;
                    self.dispatch(suggestion.clone(), credential);
                    suggestion
                }
            })
            .collect();

        Merged {
            suggestions,
            fully_enhanced,
        }
    }

    /// Spawns a background lookup that caches its result under the title
    fn dispatch(&self, suggestion: Suggestion, credential: &str) {
        let api = Arc::clone(&self.api);
        let cache = Arc::clone(&self.cache);
        let ttl = self.ttl;
        let credential = credential.to_string();

        let handle = tokio::spawn(async move {
            match api.fetch_entities(&suggestion.title, &credential).await {
                Ok(entities) => {
                    let title = suggestion.title.clone();
                    let resolved = resolve_enrichment(suggestion, &entities);
                    tracing::debug!(
                        title = %title,
                        enriched = resolved.is_enriched(),
                        "Caching enrichment result"
                    );
                    cache.set(&title, resolved, ttl);
                }
                Err(SuggestError::RateLimited) => {
                    tracing::warn!(title = %suggestion.title, "Enrichment rate limited");
                }
                Err(e) => {
                    tracing::error!(title = %suggestion.title, error = %e, "Enrichment failed");
                }
            }
        });

        let mut pending = self.pending();
        pending.retain(|handle| !handle.is_finished());
        pending.push(handle);
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of background lookups not yet reaped
    pub fn pending_count(&self) -> usize {
        self.pending().iter().filter(|h| !h.is_finished()).count()
    }

    /// Waits until every dispatched lookup has finished writing
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *self.pending());
            if handles.is_empty() {
                break;
            }

            for result in futures::future::join_all(handles).await {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Enrichment task panicked");
                }
            }
        }
    }
}

/// Picks the value to cache for `suggestion` given the entity lookup result
///
/// Only the first entity is considered. It must be the dominant entity, carry
/// a search URL, and its name must match the title ignoring case; otherwise
/// the plain suggestion is returned so a mismatch is not looked up again.
pub fn resolve_enrichment(suggestion: Suggestion, entities: &[Entity]) -> Suggestion {
    let Some(entity) = entities.first() else {
        return suggestion;
    };

    match &entity.web_search_url {
        Some(url)
            if entity.is_dominant()
                && entity.name.to_lowercase() == suggestion.title.to_lowercase() =>
        {
            Suggestion {
                kind: SuggestionKind::Entity,
                title: suggestion.title,
                value: url.clone(),
                entity_image: entity.image.as_ref().map(|image| image.thumbnail_url.clone()),
                subtitle2: entity.display_hint().map(str::to_string),
            }
        }
        _ => suggestion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::data::envelope::{EntityImage, PresentationInfo};
    use crate::data::RawSuggestion;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn entity(name: &str, scenario: &str) -> Entity {
        Entity {
            name: name.to_string(),
            web_search_url: Some(format!("https://example.com/entity/{}", name)),
            image: Some(EntityImage {
                thumbnail_url: format!("https://example.com/{}.png", name),
            }),
            entity_presentation_info: Some(PresentationInfo {
                entity_scenario: Some(scenario.to_string()),
                entity_type_display_hint: Some("Film".to_string()),
            }),
        }
    }

    /// Entity API that answers every title with a dominant entity of the same name
    struct EchoApi {
        entity_calls: AtomicUsize,
        fail_with_rate_limit: bool,
    }

    impl EchoApi {
        fn new() -> Self {
            Self {
                entity_calls: AtomicUsize::new(0),
                fail_with_rate_limit: false,
            }
        }
    }

    #[async_trait]
    impl SearchApi for EchoApi {
        async fn fetch_suggestions(
            &self,
            _query: &str,
            _credential: &str,
        ) -> Result<Vec<RawSuggestion>, SuggestError> {
            Ok(Vec::new())
        }

        async fn fetch_entities(
            &self,
            title: &str,
            _credential: &str,
        ) -> Result<Vec<Entity>, SuggestError> {
            self.entity_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_with_rate_limit {
                return Err(SuggestError::RateLimited);
            }
            Ok(vec![entity(title, "DominantEntity")])
        }
    }

    fn suggestions(titles: &[&str]) -> Vec<Suggestion> {
        titles
            .iter()
            .map(|t| Suggestion::search(*t, format!("https://example.com/search?q={}", t)))
            .collect()
    }

    #[test]
    fn test_resolve_matching_dominant_entity() {
        let suggestion = Suggestion::search("star wars", "https://example.com/search");

        let resolved = resolve_enrichment(suggestion, &[entity("Star Wars", "DominantEntity")]);

        assert_eq!(resolved.kind, SuggestionKind::Entity);
        assert_eq!(resolved.title, "star wars");
        assert_eq!(resolved.value, "https://example.com/entity/Star Wars");
        assert_eq!(
            resolved.entity_image.as_deref(),
            Some("https://example.com/Star Wars.png")
        );
        assert_eq!(resolved.subtitle2.as_deref(), Some("Film"));
    }

    #[test]
    fn test_resolve_name_mismatch_keeps_plain() {
        let suggestion = Suggestion::search("star wars cast", "https://example.com/search");

        let resolved =
            resolve_enrichment(suggestion.clone(), &[entity("Star Wars", "DominantEntity")]);

        assert_eq!(resolved, suggestion);
    }

    #[test]
    fn test_resolve_non_dominant_keeps_plain() {
        let suggestion = Suggestion::search("mercury", "https://example.com/search");

        let resolved =
            resolve_enrichment(suggestion.clone(), &[entity("Mercury", "DisambiguationItem")]);

        assert_eq!(resolved, suggestion);
    }

    #[test]
    fn test_resolve_missing_search_url_keeps_plain() {
        let suggestion = Suggestion::search("queen", "https://example.com/search");
        let entity = Entity {
            web_search_url: None,
            ..entity("Queen", "DominantEntity")
        };

        assert_eq!(resolve_enrichment(suggestion.clone(), &[entity]), suggestion);
    }

    #[test]
    fn test_resolve_no_entities_keeps_plain() {
        let suggestion = Suggestion::search("asdf", "https://example.com/search");
        assert_eq!(resolve_enrichment(suggestion.clone(), &[]), suggestion);
    }

    #[tokio::test]
    async fn test_merge_all_cached_is_fully_enhanced() {
        let api = Arc::new(EchoApi::new());
        let cache = Arc::new(MemoryCache::new());
        let enricher = Enricher::new(api.clone(), cache.clone(), None);

        for s in suggestions(&["a", "b"]) {
            let cached = resolve_enrichment(s.clone(), &[entity(&s.title, "DominantEntity")]);
            cache.set(&s.title, cached, None);
        }

        let merged = enricher.merge(suggestions(&["a", "b"]), "key");
        enricher.settle().await;

        assert!(merged.fully_enhanced);
        assert!(merged.suggestions.iter().all(Suggestion::is_enriched));
        assert_eq!(api.entity_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_merge_misses_return_raw_and_fill_cache() {
        let api = Arc::new(EchoApi::new());
        let cache = Arc::new(MemoryCache::new());
        let enricher = Enricher::new(api.clone(), cache.clone(), Some(Duration::hours(1)));
        let input = suggestions(&["x", "y", "z"]);

        let merged = enricher.merge(input.clone(), "key");

        assert!(!merged.fully_enhanced);
        assert_eq!(merged.suggestions, input);

        enricher.settle().await;
        assert_eq!(api.entity_calls.load(Ordering::SeqCst), 3);
        assert_eq!(enricher.pending_count(), 0);

        let again = enricher.merge(input, "key");
        assert!(again.fully_enhanced);
        assert!(again.suggestions.iter().all(Suggestion::is_enriched));
        assert_eq!(api.entity_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_merge_partial_hit_preserves_order() {
        let api = Arc::new(EchoApi::new());
        let cache = Arc::new(MemoryCache::new());
        let enricher = Enricher::new(api.clone(), cache.clone(), None);
        let cached = Suggestion {
            kind: SuggestionKind::Entity,
            ..Suggestion::search("b", "https://example.com/entity/b")
        };
        cache.set("b", cached.clone(), None);

        let merged = enricher.merge(suggestions(&["a", "b", "c"]), "key");
        enricher.settle().await;

        assert!(!merged.fully_enhanced);
        assert_eq!(merged.suggestions[1], cached);
        assert_eq!(merged.suggestions[0].title, "a");
        assert_eq!(merged.suggestions[2].title, "c");
        assert_eq!(api.entity_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_merge_empty_input_is_fully_enhanced() {
        let enricher = Enricher::new(Arc::new(EchoApi::new()), Arc::new(MemoryCache::new()), None);

        let merged = enricher.merge(Vec::new(), "key");

        assert!(merged.fully_enhanced);
        assert!(merged.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_enrichment_writes_nothing() {
        let api = Arc::new(EchoApi {
            entity_calls: AtomicUsize::new(0),
            fail_with_rate_limit: true,
        });
        let cache = Arc::new(MemoryCache::new());
        let enricher = Enricher::new(api.clone(), cache.clone(), None);

        let merged = enricher.merge(suggestions(&["a"]), "key");
        enricher.settle().await;

        assert_eq!(merged.suggestions, suggestions(&["a"]));
        assert_eq!(api.entity_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().keys, 0);
    }

    #[tokio::test]
    async fn test_settle_with_nothing_pending_returns() {
        let enricher = Enricher::new(Arc::new(EchoApi::new()), Arc::new(MemoryCache::new()), None);
        enricher.settle().await;
        assert_eq!(enricher.pending_count(), 0);
    }
}
