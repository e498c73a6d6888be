//! Interest-affinity and face-alignment engine.
//!
//! This crate stitches the stage crates together behind [`ProfileEngine`]:
//! three users' interest lists go through the similarity matrix builder and
//! the affinity ranker, two portrait references go through face detection
//! and eye-line alignment, and the results land in one [`EngineSnapshot`]
//! whose projections (colors, heatmap, overlay styles, CSS transforms) a
//! render surface can call at any time.
//!
//! ```no_run
//! use profile_affinity::{sample_profiles, EngineConfig, ProfileEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), profile_affinity::EngineError> {
//!     let engine = ProfileEngine::from_config(&EngineConfig::stub())?;
//!     let profiles = sample_profiles();
//!
//!     engine.refresh_interests(profiles.interests).await;
//!     let snapshot = engine.snapshot();
//!     for label in snapshot.all_unique_ordered_interests() {
//!         println!("{label}: {:?}", snapshot.interest_color(&label));
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;

mod engine;
mod sample;
mod snapshot;

pub use alignment::{
    AlignmentError, BoundingBox, BoxStyle, FaceDetectConfig, FaceDetector, HttpFaceDetector,
    ReferenceFrame, StubFaceDetector,
};
pub use config::{ConfigLoadError, EngineConfig};
pub use engine::{FaceReport, InterestReport, PassOutcome, ProfileEngine};
pub use ranking::{Color, ColorPair};
pub use sample::{sample_face_detector, sample_profiles, SampleProfiles};
pub use similarity::{
    FailurePolicy, HttpSimilarityOracle, LabelUniverse, SimilarityConfig, SimilarityError,
    SimilarityMatrix, SimilarityOracle, SimilarityReport, StubSimilarityOracle,
};
pub use snapshot::EngineSnapshot;

use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::Duration;

/// Errors raised while setting the engine up. Computation passes never fail;
/// oracle errors degrade inside the pass.
#[derive(Debug)]
pub enum EngineError {
    Config(ConfigLoadError),
    Similarity(SimilarityError),
    Alignment(AlignmentError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Config(err) => write!(f, "configuration failure: {err}"),
            EngineError::Similarity(err) => write!(f, "similarity oracle setup failed: {err}"),
            EngineError::Alignment(err) => write!(f, "face detector setup failed: {err}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EngineError::Config(err) => Some(err),
            EngineError::Similarity(err) => Some(err),
            EngineError::Alignment(err) => Some(err),
        }
    }
}

impl From<ConfigLoadError> for EngineError {
    fn from(value: ConfigLoadError) -> Self {
        EngineError::Config(value)
    }
}

impl From<SimilarityError> for EngineError {
    fn from(value: SimilarityError) -> Self {
        EngineError::Similarity(value)
    }
}

impl From<AlignmentError> for EngineError {
    fn from(value: AlignmentError) -> Self {
        EngineError::Alignment(value)
    }
}

/// How a pass ended, as seen by a metrics observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    Committed,
    /// Committed, but at least one oracle call failed.
    Degraded,
    Superseded,
}

/// Metrics observer for computation passes.
pub trait PassMetrics: Send + Sync {
    fn record_similarity_pass(&self, latency: Duration, status: PassStatus);
    fn record_face_pass(&self, latency: Duration, status: PassStatus);
}

/// Install or clear the global pass metrics recorder.
pub fn set_pass_metrics(recorder: Option<Arc<dyn PassMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PassMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PassMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn PassMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}
