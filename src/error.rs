//! Error taxonomy for the suggestion pipeline
//!
//! Every failure the request path can hit is classified here and carries the
//! HTTP status it is answered with.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::data::EnvelopeError;

/// Errors that can occur while serving a suggestion request
#[derive(Debug, Error)]
pub enum SuggestError {
    /// The `q` parameter was missing or empty
    #[error("Missing required query parameter 'q'")]
    MissingQuery,

    /// No upstream credential is configured
    #[error("Upstream API credential is not configured")]
    MissingCredential,

    /// The upstream rejected the call with `RateLimitExceeded`
    #[error("Upstream rate limit exceeded")]
    RateLimited,

    /// The upstream answered with any other error envelope
    #[error("Upstream error {code}: {message}")]
    Upstream { code: String, message: String },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream body could not be decoded
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

impl SuggestError {
    /// HTTP status this error is answered with
    pub fn status(&self) -> StatusCode {
        match self {
            SuggestError::MissingQuery => StatusCode::BAD_REQUEST,
            SuggestError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            SuggestError::MissingCredential
            | SuggestError::Upstream { .. }
            | SuggestError::Http(_)
            | SuggestError::Envelope(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SuggestError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Suggestion request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Suggestion request rejected");
        }
        status.into_response()
    }
}
