use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::matrix::FailurePolicy;
use crate::resilience::{CircuitBreakerConfig, RateLimitConfig, RetryConfig};
use crate::SimilarityError;

/// Default text-similarity endpoint (API Ninjas).
pub const DEFAULT_SIMILARITY_URL: &str = "https://api.api-ninjas.com/v1/textsimilarity";

/// Runtime configuration for the similarity oracle and the matrix builder.
///
/// # Example
/// ```
/// use similarity::SimilarityConfig;
///
/// let cfg = SimilarityConfig {
///     mode: "api".into(),
///     api_key: Some("ninjas-key".into()),
///     max_concurrency: 4,
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Oracle selector: `"api"` (remote HTTP) or `"stub"` (deterministic, offline).
    pub mode: String,
    /// Endpoint queried with `text1`/`text2` parameters in api mode.
    pub api_url: String,
    /// Value for the `X-Api-Key` header.
    pub api_key: Option<String>,
    /// Per-request HTTP timeout in seconds, capped at `call_timeout`.
    pub api_timeout_secs: Option<u64>,
    /// Upper bound on oracle calls in flight during one matrix build.
    pub max_concurrency: usize,
    /// Deadline for a single cell's oracle call, in milliseconds. A call that
    /// misses it counts as a failed cell and as a circuit breaker failure.
    #[serde(with = "crate::serde_millis::option")]
    pub call_timeout: Option<Duration>,
    /// What a failed oracle call does to the rest of the matrix.
    pub failure_policy: FailurePolicy,
    /// Retry configuration for API calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_config: Option<RetryConfig>,
    /// Circuit breaker configuration for API calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_breaker_config: Option<CircuitBreakerConfig>,
    /// Rate limiting configuration for API calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_config: Option<RateLimitConfig>,
    /// Whether retry, circuit breaker and rate limiting wrap each API call.
    pub enable_resilience: bool,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            mode: "api".into(),
            api_url: DEFAULT_SIMILARITY_URL.into(),
            api_key: None,
            api_timeout_secs: Some(30),
            max_concurrency: 8,
            call_timeout: Some(Duration::from_secs(10)),
            failure_policy: FailurePolicy::Isolate,
            retry_config: None,           // Uses defaults when None
            circuit_breaker_config: None, // Uses defaults when None
            rate_limit_config: None,      // Uses defaults when None
            enable_resilience: true,
        }
    }
}

impl SimilarityConfig {
    pub fn validate(&self) -> Result<(), SimilarityError> {
        match self.mode.as_str() {
            "api" => {
                if self.api_url.trim().is_empty() {
                    return Err(SimilarityError::InvalidConfig(
                        "api_url is required for api mode".into(),
                    ));
                }
            }
            "stub" => {}
            other => {
                return Err(SimilarityError::InvalidConfig(format!(
                    "unknown similarity mode '{other}' (expected 'api' or 'stub')"
                )))
            }
        }
        if self.max_concurrency == 0 {
            return Err(SimilarityError::InvalidConfig(
                "max_concurrency must be >= 1".into(),
            ));
        }
        if self.call_timeout.is_some_and(|t| t.is_zero()) {
            return Err(SimilarityError::InvalidConfig(
                "call_timeout must be positive when set".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs.unwrap_or(30))
    }
}
