use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::oracle::{normalize_score, SimilarityOracle};
use crate::resilience::{execute_with_retry_async, CircuitBreaker, RetryConfig, TokenBucket};
use crate::{SimilarityConfig, SimilarityError};

// Shared HTTP client with connection pooling; timeouts are applied per request.
static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(32)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

struct Resilience {
    retry: RetryConfig,
    breaker: CircuitBreaker,
    limiter: TokenBucket,
}

/// Similarity oracle backed by a `GET ?text1=&text2=` HTTP endpoint answering
/// `{"similarity": <float>}`.
///
/// When `call_timeout` is set the oracle enforces it itself, so a call that
/// runs out of time still counts against the circuit breaker.
pub struct HttpSimilarityOracle {
    url: String,
    api_key: Option<String>,
    timeout: Duration,
    deadline: Option<Duration>,
    resilience: Option<Resilience>,
}

impl HttpSimilarityOracle {
    pub fn new(cfg: &SimilarityConfig) -> Result<Self, SimilarityError> {
        if cfg.api_url.trim().is_empty() {
            return Err(SimilarityError::InvalidConfig(
                "api_url is required for api mode".into(),
            ));
        }
        let resilience = cfg.enable_resilience.then(|| Resilience {
            retry: cfg.retry_config.unwrap_or_default(),
            breaker: CircuitBreaker::new(cfg.circuit_breaker_config.unwrap_or_default()),
            limiter: TokenBucket::new(cfg.rate_limit_config.unwrap_or_default()),
        });
        let timeout = match cfg.call_timeout {
            Some(limit) => cfg.request_timeout().min(limit),
            None => cfg.request_timeout(),
        };
        Ok(Self {
            url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
            timeout,
            deadline: cfg.call_timeout,
            resilience,
        })
    }

    async fn send_request(&self, a: &str, b: &str) -> Result<f64, SimilarityError> {
        let mut request = HTTP_CLIENT
            .get(&self.url)
            .query(&[("text1", a), ("text2", b)])
            .timeout(self.timeout);
        if let Some(key) = self.api_key.as_deref() {
            request = request.header("X-Api-Key", key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SimilarityError::Timeout(self.timeout)
            } else {
                SimilarityError::Request(format!("HTTP request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SimilarityError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| SimilarityError::InvalidResponse(format!("invalid JSON response: {e}")))?;
        parse_similarity(value)
    }

    /// Breaker, rate limiter and retries around [`Self::send_request`].
    async fn guarded_request(&self, a: &str, b: &str) -> Result<f64, SimilarityError> {
        let Some(resilience) = &self.resilience else {
            return self.send_request(a, b).await;
        };

        if !resilience.breaker.allow_request() {
            return Err(SimilarityError::CircuitOpen(self.name().into()));
        }
        if !resilience.limiter.acquire().await {
            return Err(SimilarityError::RateLimited(self.name().into()));
        }

        let outcome = execute_with_retry_async(
            &resilience.retry,
            SimilarityError::is_retryable,
            |attempt| async move {
                if attempt > 0 {
                    debug!(attempt, text1 = a, text2 = b, "similarity_retry");
                }
                self.send_request(a, b).await
            },
        )
        .await;

        match outcome.result {
            Ok(value) => {
                resilience.breaker.record_success();
                Ok(value)
            }
            Err(err) => {
                resilience.breaker.record_failure();
                warn!(
                    attempts = outcome.attempts,
                    elapsed_millis = outcome.total_duration.as_millis() as u64,
                    error = %err,
                    "similarity_request_exhausted"
                );
                Err(err)
            }
        }
    }
}

#[async_trait]
impl SimilarityOracle for HttpSimilarityOracle {
    fn name(&self) -> &str {
        "http"
    }

    async fn similarity(&self, a: &str, b: &str) -> Result<f64, SimilarityError> {
        let Some(limit) = self.deadline else {
            return self.guarded_request(a, b).await;
        };
        match tokio::time::timeout(limit, self.guarded_request(a, b)).await {
            Ok(result) => result,
            Err(_) => {
                if let Some(resilience) = &self.resilience {
                    resilience.breaker.record_failure();
                }
                warn!(
                    deadline_millis = limit.as_millis() as u64,
                    text1 = a,
                    text2 = b,
                    "similarity_call_deadline_exceeded"
                );
                Err(SimilarityError::Timeout(limit))
            }
        }
    }
}

/// Accept `{"similarity": x}` or a bare number.
pub(crate) fn parse_similarity(value: Value) -> Result<f64, SimilarityError> {
    let number = match value {
        Value::Object(mut map) => map.remove("similarity").ok_or_else(|| {
            SimilarityError::InvalidResponse("missing `similarity` field".into())
        })?,
        other => other,
    };
    match number {
        Value::Number(num) => num
            .as_f64()
            .ok_or_else(|| SimilarityError::InvalidResponse("non-finite similarity".into()))
            .and_then(normalize_score),
        other => Err(SimilarityError::InvalidResponse(format!(
            "similarity must be a number, got {other:?}"
        ))),
    }
}
