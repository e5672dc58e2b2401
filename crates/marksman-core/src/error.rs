//! Error types for the grading engine and providers.
//!
//! `ProviderError` is defined here rather than in `marksman-providers` so
//! the examiner runner can downcast and classify backend failures without
//! string matching.

use thiserror::Error;

/// Fatal conditions that abort an entire grading request.
///
/// Everything else (individual examiner failures, summary-generation
/// failures) is absorbed inside the engine and reflected as degraded
/// entries in the result, never as an error.
#[derive(Debug, Error)]
pub enum GradingError {
    /// The identity exceeded its admission window. Nothing downstream ran.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// No language-model backend is configured. Checked once up front.
    #[error("language-model backend not configured: {0}")]
    NotConfigured(String),

    /// The request failed validation before any grading work began.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GradingError {
    /// Machine-readable code for the routing layer's error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            GradingError::RateLimited { .. } => "rate_limited",
            GradingError::NotConfigured(_) => "llm_unavailable",
            GradingError::InvalidRequest(_) => "validation_failed",
        }
    }

    /// HTTP status the routing layer should map this error to.
    pub fn http_status(&self) -> u16 {
        match self {
            GradingError::RateLimited { .. } => 429,
            GradingError::NotConfigured(_) => 503,
            GradingError::InvalidRequest(_) => 400,
        }
    }
}

/// Errors that can occur when calling a language-model backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grading_error_codes_and_statuses() {
        let e = GradingError::RateLimited {
            retry_after_secs: 30,
        };
        assert_eq!(e.code(), "rate_limited");
        assert_eq!(e.http_status(), 429);

        let e = GradingError::NotConfigured("no provider".into());
        assert_eq!(e.code(), "llm_unavailable");
        assert_eq!(e.http_status(), 503);

        let e = GradingError::InvalidRequest("empty essay".into());
        assert_eq!(e.code(), "validation_failed");
        assert_eq!(e.http_status(), 400);
    }

    #[test]
    fn provider_error_permanence() {
        assert!(ProviderError::AuthenticationFailed("bad key".into()).is_permanent());
        assert!(ProviderError::ModelNotFound("gpt-0".into()).is_permanent());
        assert!(!ProviderError::Timeout(45).is_permanent());
        assert!(!ProviderError::RateLimited { retry_after_ms: 5000 }.is_permanent());
    }
}
