//! Computation passes and generation discipline.
//!
//! Each pass kind (interests, faces) carries a monotonically increasing
//! generation published on a `watch` channel. Starting a pass bumps the
//! generation under the snapshot write lock; committing re-checks it under the
//! same lock. A pass whose generation is overtaken while it is in flight is
//! dropped at its next suspension point, so its oracle calls are cancelled
//! and its results never reach the snapshot.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use alignment::{
    alignment_offset, detect_first_face, BoundingBox, FaceDetector, ReferenceFrame,
};
use ranking::reorder_interests;
use serde::Serialize;
use similarity::{
    build_similarity_matrix, BuildOptions, LabelUniverse, SimilarityOracle, SimilarityReport,
};
use tokio::sync::watch;
use tracing::{info, info_span, Instrument};

use crate::snapshot::EngineSnapshot;
use crate::{metrics_recorder, EngineConfig, EngineError, PassStatus};

/// Result of one computation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PassOutcome<T> {
    /// The pass finished while still current and its results were committed.
    Committed(T),
    /// A newer pass started first; nothing was committed.
    Superseded,
}

impl<T> PassOutcome<T> {
    pub fn is_committed(&self) -> bool {
        matches!(self, PassOutcome::Committed(_))
    }

    pub fn committed(self) -> Option<T> {
        match self {
            PassOutcome::Committed(value) => Some(value),
            PassOutcome::Superseded => None,
        }
    }
}

impl PassOutcome<InterestReport> {
    fn status(&self) -> PassStatus {
        match self {
            PassOutcome::Committed(report) if report.similarity.degraded => PassStatus::Degraded,
            PassOutcome::Committed(_) => PassStatus::Committed,
            PassOutcome::Superseded => PassStatus::Superseded,
        }
    }
}

impl PassOutcome<FaceReport> {
    fn status(&self) -> PassStatus {
        match self {
            PassOutcome::Committed(report) if report.degraded => PassStatus::Degraded,
            PassOutcome::Committed(_) => PassStatus::Committed,
            PassOutcome::Superseded => PassStatus::Superseded,
        }
    }
}

/// What an interest pass committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterestReport {
    pub generation: u64,
    pub similarity: SimilarityReport,
    pub ordered: [Vec<String>; 3],
}

/// What a face pass committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceReport {
    pub generation: u64,
    pub boxes: [Option<BoundingBox>; 2],
    pub offset: Option<f64>,
    /// At least one detector call failed.
    pub degraded: bool,
}

pub struct ProfileEngine {
    oracle: Arc<dyn SimilarityOracle>,
    detector: Arc<dyn FaceDetector>,
    build_options: BuildOptions,
    interest_generation: watch::Sender<u64>,
    face_generation: watch::Sender<u64>,
    snapshot: RwLock<EngineSnapshot>,
}

impl ProfileEngine {
    pub fn new(oracle: Arc<dyn SimilarityOracle>, detector: Arc<dyn FaceDetector>) -> Self {
        Self {
            oracle,
            detector,
            build_options: BuildOptions::from(&similarity::SimilarityConfig::default()),
            interest_generation: watch::channel(0).0,
            face_generation: watch::channel(0).0,
            snapshot: RwLock::new(EngineSnapshot::new(ReferenceFrame::default())),
        }
    }

    /// Engine with both oracles built from `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let oracle = similarity::oracle_from_config(&config.similarity)?;
        let detector = alignment::detector_from_config(&config.face)?;
        Ok(Self::new(oracle, detector)
            .with_build_options(BuildOptions::from(&config.similarity))
            .with_reference_frame(config.reference_frame))
    }

    pub fn with_build_options(mut self, options: BuildOptions) -> Self {
        self.build_options = options;
        self
    }

    /// Swap the face detector, e.g. for a stub with known boxes.
    pub fn with_detector(mut self, detector: Arc<dyn FaceDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_reference_frame(self, frame: ReferenceFrame) -> Self {
        write_lock(&self.snapshot).frame = frame;
        self
    }

    /// Copy of the current authoritative state.
    pub fn snapshot(&self) -> EngineSnapshot {
        read_lock(&self.snapshot).clone()
    }

    /// Recompute the universe, matrix and ordered lists for three users.
    pub async fn refresh_interests(&self, lists: [Vec<String>; 3]) -> PassOutcome<InterestReport> {
        let generation = {
            let mut snapshot = write_lock(&self.snapshot);
            let generation = bump(&self.interest_generation);
            snapshot.interest_generation = generation;
            snapshot.loading_similarity = true;
            generation
        };
        let overtaken = superseded(self.interest_generation.subscribe(), generation);
        let start = Instant::now();

        let work = async {
            let universe = LabelUniverse::from_lists(lists.iter());
            let similarity =
                build_similarity_matrix(&universe, self.oracle.as_ref(), &self.build_options).await;
            let ordered = lists
                .each_ref()
                .map(|list| reorder_interests(list, &similarity.universe, &similarity.matrix));
            InterestReport {
                generation,
                similarity,
                ordered,
            }
        }
        .instrument(info_span!("similarity_pass", generation));

        let report = tokio::select! {
            biased;
            _ = overtaken => None,
            report = work => Some(report),
        };

        let outcome = match report {
            Some(report) => self.commit_interests(report),
            None => PassOutcome::Superseded,
        };
        if let Some(recorder) = metrics_recorder() {
            recorder.record_similarity_pass(start.elapsed(), outcome.status());
        }
        match &outcome {
            PassOutcome::Committed(report) => info!(
                generation,
                labels = report.similarity.universe.len(),
                oracle_calls = report.similarity.stats.oracle_calls,
                failures = report.similarity.stats.failures,
                degraded = report.similarity.degraded,
                elapsed_micros = start.elapsed().as_micros() as u64,
                "similarity_pass_success"
            ),
            PassOutcome::Superseded => info!(generation, kind = "similarity", "pass_superseded"),
        }
        outcome
    }

    /// Detect both portraits' faces and recompute the alignment offset.
    ///
    /// Boxes from the previous images are cleared before detection starts.
    pub async fn refresh_faces(&self, images: [Option<String>; 2]) -> PassOutcome<FaceReport> {
        let generation = {
            let mut snapshot = write_lock(&self.snapshot);
            let generation = bump(&self.face_generation);
            snapshot.face_generation = generation;
            snapshot.face_boxes = [None, None];
            snapshot.alignment_offset = None;
            snapshot.face_detect_degraded = false;
            snapshot.loading_faces = true;
            generation
        };
        let overtaken = superseded(self.face_generation.subscribe(), generation);
        let start = Instant::now();

        let work = async {
            let detector = self.detector.as_ref();
            let (first, second) = tokio::join!(
                detect_first_face(detector, images[0].as_deref()),
                detect_first_face(detector, images[1].as_deref()),
            );
            FaceReport {
                generation,
                boxes: [first.face, second.face],
                offset: alignment_offset(first.face.as_ref(), second.face.as_ref()),
                degraded: first.failed || second.failed,
            }
        }
        .instrument(info_span!("face_pass", generation));

        let report = tokio::select! {
            biased;
            _ = overtaken => None,
            report = work => Some(report),
        };

        let outcome = match report {
            Some(report) => self.commit_faces(report),
            None => PassOutcome::Superseded,
        };
        if let Some(recorder) = metrics_recorder() {
            recorder.record_face_pass(start.elapsed(), outcome.status());
        }
        match &outcome {
            PassOutcome::Committed(report) => info!(
                generation,
                faces = report.boxes.iter().flatten().count(),
                offset = ?report.offset,
                degraded = report.degraded,
                elapsed_micros = start.elapsed().as_micros() as u64,
                "face_pass_success"
            ),
            PassOutcome::Superseded => info!(generation, kind = "face", "pass_superseded"),
        }
        outcome
    }

    fn commit_interests(&self, report: InterestReport) -> PassOutcome<InterestReport> {
        let mut snapshot = write_lock(&self.snapshot);
        if *self.interest_generation.borrow() != report.generation {
            return PassOutcome::Superseded;
        }
        snapshot.universe = report.similarity.universe.clone();
        snapshot.matrix = report.similarity.matrix.clone();
        snapshot.ordered_interests = report.ordered.clone();
        snapshot.similarity_degraded = report.similarity.degraded;
        snapshot.loading_similarity = false;
        PassOutcome::Committed(report)
    }

    fn commit_faces(&self, report: FaceReport) -> PassOutcome<FaceReport> {
        let mut snapshot = write_lock(&self.snapshot);
        if *self.face_generation.borrow() != report.generation {
            return PassOutcome::Superseded;
        }
        snapshot.face_boxes = report.boxes;
        snapshot.alignment_offset = report.offset;
        snapshot.face_detect_degraded = report.degraded;
        snapshot.loading_faces = false;
        PassOutcome::Committed(report)
    }
}

fn bump(generation: &watch::Sender<u64>) -> u64 {
    generation.send_modify(|g| *g += 1);
    *generation.borrow()
}

/// Resolves once a generation newer than `generation` is announced.
async fn superseded(mut rx: watch::Receiver<u64>, generation: u64) {
    let open = rx.wait_for(|current| *current != generation).await.is_ok();
    if !open {
        std::future::pending::<()>().await;
    }
}

fn read_lock(lock: &RwLock<EngineSnapshot>) -> RwLockReadGuard<'_, EngineSnapshot> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock(lock: &RwLock<EngineSnapshot>) -> RwLockWriteGuard<'_, EngineSnapshot> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
