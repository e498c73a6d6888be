//! Resilience for remote oracles: circuit breaker, rate limiting, and retry.
//!
//! Each HTTP oracle owns one breaker and one bucket, so a failing face
//! detector never trips the similarity endpoint and vice versa.

mod circuit_breaker;
mod rate_limit;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use rate_limit::{RateLimitConfig, RateLimitStats, TokenBucket};
pub use retry::{execute_with_retry_async, RetryConfig, RetryResult};

use std::sync::{Mutex, MutexGuard};

/// Lock that survives a poisoned mutex; the guarded state stays consistent
/// because every critical section is a plain field update.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
