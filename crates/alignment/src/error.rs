use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a face detector. Callers degrade these to "no face".
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AlignmentError {
    #[error("invalid face detection config: {0}")]
    InvalidConfig(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("invalid detector response: {0}")]
    InvalidResponse(String),
    #[error("face detection timed out after {0:?}")]
    Timeout(Duration),
    #[error("circuit breaker is open for detector '{0}'")]
    CircuitOpen(String),
}

impl AlignmentError {
    pub fn is_retryable(&self) -> bool {
        match self {
            AlignmentError::Request(_) | AlignmentError::Timeout(_) => true,
            AlignmentError::Http { status, .. } => *status == 429 || *status >= 500,
            AlignmentError::InvalidConfig(_)
            | AlignmentError::InvalidResponse(_)
            | AlignmentError::CircuitOpen(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = AlignmentError::InvalidResponse("faces must be an array".into());
        assert!(err.to_string().contains("invalid detector response"));
    }

    #[test]
    fn retryable_classification() {
        assert!(AlignmentError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(AlignmentError::Http {
            status: 500,
            body: String::new()
        }
        .is_retryable());
        assert!(!AlignmentError::Http {
            status: 403,
            body: String::new()
        }
        .is_retryable());
        assert!(!AlignmentError::CircuitOpen("http".into()).is_retryable());
    }
}
