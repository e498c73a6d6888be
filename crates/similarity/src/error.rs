use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a similarity oracle call or by oracle construction.
///
/// None of these ever terminate a matrix build: the builder maps every call
/// failure to a zero-valued cell and flags the report as degraded.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimilarityError {
    /// Configuration is inconsistent (e.g., api mode without an endpoint).
    #[error("invalid similarity config: {0}")]
    InvalidConfig(String),
    /// The request never produced an HTTP response (DNS, connect, reset).
    #[error("request failed: {0}")]
    Request(String),
    /// The oracle answered with a non-success status.
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },
    /// The oracle answered, but not with a usable similarity value.
    #[error("invalid oracle response: {0}")]
    InvalidResponse(String),
    /// The call did not settle within its deadline.
    #[error("oracle call timed out after {0:?}")]
    Timeout(Duration),
    /// The per-oracle circuit breaker is rejecting calls.
    #[error("circuit breaker is open for oracle '{0}'")]
    CircuitOpen(String),
    /// No rate-limit token became available within the configured wait.
    #[error("rate limit exceeded for oracle '{0}'")]
    RateLimited(String),
}

impl SimilarityError {
    /// Whether retrying the same call could plausibly succeed.
    ///
    /// Transport failures, timeouts, 5xx and 429 are transient; other 4xx,
    /// malformed payloads and local rejections are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            SimilarityError::Request(_) | SimilarityError::Timeout(_) => true,
            SimilarityError::Http { status, .. } => *status == 429 || *status >= 500,
            SimilarityError::InvalidConfig(_)
            | SimilarityError::InvalidResponse(_)
            | SimilarityError::CircuitOpen(_)
            | SimilarityError::RateLimited(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_http_display() {
        let err = SimilarityError::Http {
            status: 503,
            body: "upstream busy".into(),
        };
        assert!(err.to_string().contains("HTTP error 503"));
        assert!(err.to_string().contains("upstream busy"));
    }

    #[test]
    fn error_timeout_display() {
        let err = SimilarityError::Timeout(Duration::from_millis(250));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn retryable_classification() {
        assert!(SimilarityError::Request("connection reset".into()).is_retryable());
        assert!(SimilarityError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(SimilarityError::Http {
            status: 429,
            body: String::new()
        }
        .is_retryable());
        assert!(SimilarityError::Http {
            status: 502,
            body: String::new()
        }
        .is_retryable());

        assert!(!SimilarityError::Http {
            status: 401,
            body: String::new()
        }
        .is_retryable());
        assert!(!SimilarityError::InvalidResponse("no field".into()).is_retryable());
        assert!(!SimilarityError::CircuitOpen("ninjas".into()).is_retryable());
    }

    #[test]
    fn error_clone_preserves_message() {
        let err = SimilarityError::RateLimited("ninjas".into());
        assert_eq!(err.to_string(), err.clone().to_string());
    }
}
