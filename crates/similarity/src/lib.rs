//! Pairwise interest similarity
//!
//! This crate turns a set of interest labels into a square similarity matrix.
//! The actual semantics come from an external oracle; everything here is the
//! plumbing around it: canonical pair keys, a pass-scoped cache so each
//! unordered pair is asked about once, bounded fan-out, and a failure policy
//! that keeps the matrix useful when a few calls go wrong.
//!
//! Two oracle modes:
//!
//! - **API mode** - `GET <api_url>?text1=..&text2=..` with an `X-Api-Key`
//!   header, wrapped in retry / circuit breaker / rate limiting.
//! - **Stub mode** - character-bigram Dice coefficient. Offline, deterministic,
//!   good for demos and tests. Not semantic.
//!
//! ## Quick example
//!
//! ```no_run
//! use similarity::{
//!     build_similarity_matrix, oracle_from_config, BuildOptions, LabelUniverse, SimilarityConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let cfg = SimilarityConfig {
//!         mode: "stub".into(),
//!         ..Default::default()
//!     };
//!     let oracle = oracle_from_config(&cfg).unwrap();
//!     let universe = LabelUniverse::from_lists([
//!         vec!["Hiking", "Gaming"],
//!         vec!["Cooking", "Gaming"],
//!     ]);
//!
//!     let options = BuildOptions::from(&cfg);
//!     let report = build_similarity_matrix(&universe, oracle.as_ref(), &options).await;
//!     assert_eq!(report.matrix.len(), 3);
//! }
//! ```

pub mod config;
pub mod error;
pub mod resilience;
pub mod types;

mod api;
mod cache;
mod matrix;
mod oracle;
mod pair_key;
mod serde_millis;
mod stub;

use std::sync::Arc;

pub use crate::api::HttpSimilarityOracle;
pub use crate::cache::SimilarityCache;
pub use crate::config::{SimilarityConfig, DEFAULT_SIMILARITY_URL};
pub use crate::error::SimilarityError;
pub use crate::matrix::{
    build_similarity_matrix, BuildOptions, FailurePolicy, MatrixStats, SimilarityReport,
};
pub use crate::oracle::{normalize_score, SimilarityOracle};
pub use crate::pair_key::{canonical_key, PairKey};
pub use crate::stub::StubSimilarityOracle;
pub use crate::types::{Label, LabelUniverse, SimilarityMatrix};

/// Construct the oracle selected by `cfg.mode`.
pub fn oracle_from_config(
    cfg: &SimilarityConfig,
) -> Result<Arc<dyn SimilarityOracle>, SimilarityError> {
    cfg.validate()?;
    match cfg.mode.as_str() {
        "stub" => Ok(Arc::new(StubSimilarityOracle::new())),
        _ => Ok(Arc::new(HttpSimilarityOracle::new(cfg)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_from_config_selects_mode() {
        let stub = oracle_from_config(&SimilarityConfig {
            mode: "stub".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(stub.name(), "stub");

        let http = oracle_from_config(&SimilarityConfig::default()).unwrap();
        assert_eq!(http.name(), "http");
    }

    #[test]
    fn oracle_from_config_validates() {
        let result = oracle_from_config(&SimilarityConfig {
            mode: "magic".into(),
            ..Default::default()
        });
        assert!(matches!(result, Err(SimilarityError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn stub_pipeline_end_to_end() {
        let cfg = SimilarityConfig {
            mode: "stub".into(),
            ..Default::default()
        };
        let oracle = oracle_from_config(&cfg).unwrap();
        let universe = LabelUniverse::from_lists([vec!["Cooking", "Coding"], vec!["Coding"]]);

        let report =
            build_similarity_matrix(&universe, oracle.as_ref(), &BuildOptions::from(&cfg)).await;
        assert_eq!(report.matrix.len(), 2);
        assert_eq!(report.stats.oracle_calls, 1);
        assert!(!report.degraded);
    }
}
