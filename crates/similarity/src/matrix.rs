//! Similarity matrix construction.
//!
//! The builder plans calls by scanning the full `n × n` grid, reserving each
//! unordered pair once in the pass-scoped [`SimilarityCache`], fans the unique
//! calls out with bounded concurrency, and assembles the matrix in label-index
//! order once every call has settled. Arrival order never affects the result.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};

use crate::cache::SimilarityCache;
use crate::oracle::{normalize_score, SimilarityOracle};
use crate::pair_key::{canonical_key, PairKey};
use crate::types::{LabelUniverse, SimilarityMatrix};
use crate::{SimilarityConfig, SimilarityError};

/// What a failed oracle call does to the rest of the matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The failed pair scores `0`; every other cell is kept.
    #[default]
    Isolate,
    /// Any failure discards the whole matrix (callers then fall back to
    /// lexicographic ordering).
    AbortAll,
}

/// Knobs for one matrix build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildOptions {
    pub max_concurrency: usize,
    pub call_timeout: Option<Duration>,
    pub failure_policy: FailurePolicy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from(&SimilarityConfig::default())
    }
}

impl From<&SimilarityConfig> for BuildOptions {
    fn from(cfg: &SimilarityConfig) -> Self {
        Self {
            max_concurrency: cfg.max_concurrency.max(1),
            call_timeout: cfg.call_timeout,
            failure_policy: cfg.failure_policy,
        }
    }
}

/// Bookkeeping for one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixStats {
    /// Cells in the grid, diagonal included (`n²`).
    pub grid_cells: usize,
    /// Oracle invocations actually issued.
    pub oracle_calls: usize,
    /// Off-diagonal cells answered from the cache instead of the oracle.
    pub cache_hits: usize,
    /// Oracle invocations that failed or timed out.
    pub failures: usize,
}

/// Output of [`build_similarity_matrix`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityReport {
    pub universe: LabelUniverse,
    pub matrix: SimilarityMatrix,
    /// At least one oracle call failed during this build.
    pub degraded: bool,
    /// Pairs whose oracle call failed, in universe order.
    pub failed_pairs: Vec<PairKey>,
    pub stats: MatrixStats,
}

impl SimilarityReport {
    fn empty(universe: LabelUniverse) -> Self {
        Self {
            universe,
            ..Self::default()
        }
    }

    /// The universe was empty, so no oracle work was needed and callers
    /// should clear their ordering state.
    pub fn no_computation_needed(&self) -> bool {
        self.universe.is_empty()
    }
}

struct PlannedCall {
    key: PairKey,
}

/// Build the similarity matrix for `universe`.
///
/// Always resolves: failed or timed-out calls are recovered according to
/// [`FailurePolicy`] and reported through `degraded` / `failed_pairs`.
pub async fn build_similarity_matrix(
    universe: &LabelUniverse,
    oracle: &dyn SimilarityOracle,
    options: &BuildOptions,
) -> SimilarityReport {
    let n = universe.len();
    if n == 0 {
        debug!("similarity_matrix_skipped_empty_universe");
        return SimilarityReport::empty(universe.clone());
    }

    let span = tracing::info_span!(
        "similarity.build",
        oracle = oracle.name(),
        labels = n,
        policy = ?options.failure_policy
    );
    build_inner(universe, oracle, options).instrument(span).await
}

async fn build_inner(
    universe: &LabelUniverse,
    oracle: &dyn SimilarityOracle,
    options: &BuildOptions,
) -> SimilarityReport {
    let start = Instant::now();
    let n = universe.len();
    let labels = universe.labels();
    let mut cache = SimilarityCache::new();

    // --- Plan: one call per unordered pair ---
    let mut planned = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let key = canonical_key(&labels[i], &labels[j]);
            if cache.reserve(&key) {
                planned.push(PlannedCall { key });
            }
        }
    }
    let cache_hits = cache.hits();

    // --- Fan out / fan in ---
    let settled: Vec<(PairKey, Result<f64, SimilarityError>)> = stream::iter(planned)
        .map(|call| async move {
            let result = call_oracle(oracle, &call.key, options.call_timeout).await;
            (call.key, result)
        })
        .buffer_unordered(options.max_concurrency.max(1))
        .collect()
        .await;

    let oracle_calls = settled.len();
    let mut failures = 0;
    for (key, result) in settled {
        match result {
            Ok(value) => cache.put(key, value),
            Err(err) => {
                failures += 1;
                warn!(pair = %key, error = %err, "similarity_call_failed");
                cache.mark_failed(key);
            }
        }
    }

    // --- Assemble in label-index order ---
    let mut matrix = SimilarityMatrix::identity(n);
    let mut failed_pairs = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let key = canonical_key(&labels[i], &labels[j]);
            match cache.get(&key) {
                Some(value) => matrix.set_symmetric(i, j, value),
                None => {
                    // Failed cells keep the identity's zero.
                    if cache.is_failed(&key) {
                        failed_pairs.push(key);
                    }
                }
            }
        }
    }

    let degraded = failures > 0;
    let stats = MatrixStats {
        grid_cells: n * n,
        oracle_calls,
        cache_hits,
        failures,
    };

    if degraded && options.failure_policy == FailurePolicy::AbortAll {
        warn!(
            failures,
            oracle_calls,
            elapsed_micros = start.elapsed().as_micros() as u64,
            "similarity_matrix_aborted"
        );
        return SimilarityReport {
            universe: universe.clone(),
            matrix: SimilarityMatrix::empty(),
            degraded,
            failed_pairs,
            stats,
        };
    }

    info!(
        oracle_calls,
        cache_hits,
        failures,
        degraded,
        elapsed_micros = start.elapsed().as_micros() as u64,
        "similarity_matrix_built"
    );

    SimilarityReport {
        universe: universe.clone(),
        matrix,
        degraded,
        failed_pairs,
        stats,
    }
}

/// Slack granted to oracles that enforce `call_timeout` themselves, so their
/// own deadline handling runs before the builder drops the call.
const DEADLINE_GRACE: Duration = Duration::from_millis(50);

async fn call_oracle(
    oracle: &dyn SimilarityOracle,
    key: &PairKey,
    deadline: Option<Duration>,
) -> Result<f64, SimilarityError> {
    let call = oracle.similarity(key.low(), key.high());
    let value = match deadline {
        Some(limit) => tokio::time::timeout(limit + DEADLINE_GRACE, call)
            .await
            .map_err(|_| SimilarityError::Timeout(limit))??,
        None => call.await?,
    };
    normalize_score(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubSimilarityOracle;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Oracle answering from a fixed table and counting calls per pair.
    struct TableOracle {
        default: f64,
        failing: Vec<PairKey>,
        calls: Mutex<HashMap<PairKey, usize>>,
    }

    impl TableOracle {
        fn new(default: f64) -> Self {
            Self {
                default,
                failing: Vec::new(),
                calls: Mutex::new(HashMap::new()),
            }
        }

        fn failing(mut self, a: &str, b: &str) -> Self {
            self.failing.push(canonical_key(a, b));
            self
        }

        fn calls_for(&self, a: &str, b: &str) -> usize {
            let calls = self.calls.lock().unwrap();
            calls.get(&canonical_key(a, b)).copied().unwrap_or(0)
        }

        fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().values().sum()
        }
    }

    #[async_trait]
    impl SimilarityOracle for TableOracle {
        fn name(&self) -> &str {
            "table"
        }

        async fn similarity(&self, a: &str, b: &str) -> Result<f64, SimilarityError> {
            let key = canonical_key(a, b);
            *self.calls.lock().unwrap().entry(key.clone()).or_insert(0) += 1;
            if self.failing.contains(&key) {
                return Err(SimilarityError::Http {
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            Ok(self.default)
        }
    }

    fn universe(labels: &[&str]) -> LabelUniverse {
        LabelUniverse::from_lists([labels.to_vec()])
    }

    #[tokio::test]
    async fn empty_universe_needs_no_computation() {
        let oracle = TableOracle::new(0.5);
        let report =
            build_similarity_matrix(&LabelUniverse::default(), &oracle, &BuildOptions::default())
                .await;
        assert!(report.no_computation_needed());
        assert!(report.matrix.is_empty());
        assert_eq!(oracle.total_calls(), 0);
    }

    #[tokio::test]
    async fn uniform_oracle_fills_off_diagonal() {
        let oracle = TableOracle::new(0.8);
        let report =
            build_similarity_matrix(&universe(&["a", "b", "c"]), &oracle, &BuildOptions::default())
                .await;

        assert_eq!(report.matrix.len(), 3);
        assert_eq!(report.matrix.diagonal(), vec![1.0, 1.0, 1.0]);
        for i in 0..3 {
            for j in 0..3 {
                if i != j {
                    assert_eq!(report.matrix.get(i, j), Some(0.8));
                }
            }
        }
        assert!(!report.degraded);
    }

    #[tokio::test]
    async fn each_unordered_pair_called_once() {
        let labels = ["w", "x", "y", "z"];
        let oracle = TableOracle::new(0.3);
        let report =
            build_similarity_matrix(&universe(&labels), &oracle, &BuildOptions::default()).await;

        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                assert_eq!(oracle.calls_for(a, b), 1, "pair {a}/{b}");
            }
        }
        assert_eq!(report.stats.oracle_calls, 6); // (16 - 4) / 2
        assert_eq!(report.stats.cache_hits, 6);
        assert_eq!(report.stats.grid_cells, 16);
    }

    #[tokio::test]
    async fn failure_is_isolated_to_its_pair() {
        let oracle = TableOracle::new(0.6).failing("a", "b");
        let report =
            build_similarity_matrix(&universe(&["a", "b", "c"]), &oracle, &BuildOptions::default())
                .await;

        assert!(report.degraded);
        assert_eq!(report.matrix.get(0, 1), Some(0.0));
        assert_eq!(report.matrix.get(1, 0), Some(0.0));
        assert_eq!(report.matrix.get(0, 2), Some(0.6));
        assert_eq!(report.matrix.get(1, 2), Some(0.6));
        assert_eq!(report.failed_pairs, vec![canonical_key("a", "b")]);
        assert_eq!(report.stats.failures, 1);
    }

    #[tokio::test]
    async fn abort_all_discards_matrix() {
        let oracle = TableOracle::new(0.6).failing("b", "c");
        let options = BuildOptions {
            failure_policy: FailurePolicy::AbortAll,
            ..BuildOptions::default()
        };
        let report = build_similarity_matrix(&universe(&["a", "b", "c"]), &oracle, &options).await;

        assert!(report.degraded);
        assert!(report.matrix.is_empty());
        assert!(!report.no_computation_needed());
    }

    struct StallingOracle;

    #[async_trait]
    impl SimilarityOracle for StallingOracle {
        fn name(&self) -> &str {
            "stalling"
        }

        async fn similarity(&self, a: &str, _b: &str) -> Result<f64, SimilarityError> {
            if a == "slow" {
                std::future::pending::<()>().await;
            }
            Ok(0.4)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_call_times_out_as_failure() {
        let options = BuildOptions {
            call_timeout: Some(Duration::from_millis(50)),
            ..BuildOptions::default()
        };
        // Calls are issued with the pair's low label first; both pairs
        // containing "slow" sort it low and never settle.
        let report =
            build_similarity_matrix(&universe(&["slow", "zoo", "tail"]), &StallingOracle, &options)
                .await;

        assert!(report.degraded);
        assert_eq!(
            report.failed_pairs,
            vec![canonical_key("slow", "zoo"), canonical_key("slow", "tail")]
        );
        assert_eq!(report.matrix.get(1, 2), Some(0.4));
        assert_eq!(report.matrix.get(0, 1), Some(0.0));
    }

    #[tokio::test]
    async fn stub_matrix_is_symmetric() {
        let report = build_similarity_matrix(
            &universe(&["Hiking", "Swimming", "Gaming", "Coding", "Cooking"]),
            &StubSimilarityOracle::new(),
            &BuildOptions {
                max_concurrency: 2,
                ..BuildOptions::default()
            },
        )
        .await;
        assert!(report.matrix.is_symmetric());
        assert_eq!(report.stats.oracle_calls, 10);
    }
}
