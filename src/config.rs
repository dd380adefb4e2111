//! Runtime configuration shared by the request handler
//!
//! The upstream credential is resolved on every request rather than at startup,
//! so a missing key fails the request instead of the process.

use chrono::Duration;

/// Environment variable read for the upstream credential by default
pub const DEFAULT_CREDENTIAL_ENV: &str = "SEARCH_API_KEY";

/// Where the upstream credential comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Read the named environment variable at call time
    Env(String),
    /// A fixed value, mainly for tests
    Fixed(Option<String>),
}

impl Default for CredentialSource {
    fn default() -> Self {
        CredentialSource::Env(DEFAULT_CREDENTIAL_ENV.to_string())
    }
}

impl CredentialSource {
    /// Returns the credential, treating an empty value as unset
    pub fn resolve(&self) -> Option<String> {
        let value = match self {
            CredentialSource::Env(name) => std::env::var(name).ok(),
            CredentialSource::Fixed(value) => value.clone(),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Settings for the suggestion service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Source of the upstream credential
    pub credential: CredentialSource,
    /// Lifetime of cached enrichment entries; `None` keeps them until flushed
    pub cache_ttl: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            credential: CredentialSource::default(),
            cache_ttl: Some(Duration::hours(24)),
        }
    }
}
