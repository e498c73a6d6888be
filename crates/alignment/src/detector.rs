use async_trait::async_trait;
use tracing::warn;

use crate::{AlignmentError, BoundingBox};

/// Source of face boxes for an image reference.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    fn name(&self) -> &str;

    /// Candidate faces in detector order. An empty list is a valid answer.
    async fn detect(&self, image_ref: &str) -> Result<Vec<BoundingBox>, AlignmentError>;
}

/// Outcome of looking up the primary face of one image.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FaceLookup {
    pub face: Option<BoundingBox>,
    /// The detector was called and failed; `face` is `None` in that case.
    pub failed: bool,
}

/// First detected face for `image_ref`. A missing or empty reference skips
/// the detector entirely; detector errors degrade to "no face".
pub async fn detect_first_face(
    detector: &dyn FaceDetector,
    image_ref: Option<&str>,
) -> FaceLookup {
    let Some(image_ref) = image_ref.filter(|r| !r.is_empty()) else {
        return FaceLookup::default();
    };
    match detector.detect(image_ref).await {
        Ok(faces) => FaceLookup {
            face: faces.into_iter().next(),
            failed: false,
        },
        Err(err) => {
            warn!(detector = detector.name(), image_ref, error = %err, "face_detect_failed");
            FaceLookup {
                face: None,
                failed: true,
            }
        }
    }
}
