//! Face boxes and eye-line alignment
//!
//! Given two profile photos, find the primary face in each and compute how
//! far the second photo must shift vertically so both pairs of eyes sit on
//! the same line. The eye line is estimated at 40% of the face box height.
//!
//! Detection is pluggable through [`FaceDetector`]: an HTTP client for a
//! `facedetect` style endpoint, or a fixed-table stub for offline use.
//! Detection failures never propagate; they read as "no face" and the
//! geometry degrades to zero offset and centered framing.

pub mod config;
pub mod error;
pub mod geometry;
pub mod types;

mod api;
mod detector;
mod stub;

use std::sync::Arc;

pub use crate::api::HttpFaceDetector;
pub use crate::config::{FaceDetectConfig, DEFAULT_FACE_DETECT_URL};
pub use crate::detector::{detect_first_face, FaceDetector, FaceLookup};
pub use crate::error::AlignmentError;
pub use crate::geometry::{
    alignment_offset, box_to_style, eye_line, object_position, translate_y, EYE_LINE_FRACTION,
};
pub use crate::stub::StubFaceDetector;
pub use crate::types::{BoundingBox, BoxStyle, ReferenceFrame};

/// Construct the detector selected by `cfg.mode`. Stub mode starts with an
/// empty table.
pub fn detector_from_config(
    cfg: &FaceDetectConfig,
) -> Result<Arc<dyn FaceDetector>, AlignmentError> {
    cfg.validate()?;
    match cfg.mode.as_str() {
        "stub" => Ok(Arc::new(StubFaceDetector::new())),
        _ => Ok(Arc::new(HttpFaceDetector::new(cfg)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detector_from_config_selects_mode() {
        let stub = detector_from_config(&FaceDetectConfig {
            mode: "stub".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(stub.name(), "stub");
        assert_eq!(
            detector_from_config(&FaceDetectConfig::default())
                .unwrap()
                .name(),
            "http"
        );
    }

    #[tokio::test]
    async fn stub_geometry_end_to_end() {
        let frame = ReferenceFrame::default();
        let det = StubFaceDetector::new()
            .with_face("one.jpg", BoundingBox::new(10.0, 20.0, 50.0, 60.0))
            .with_face("two.jpg", BoundingBox::new(15.0, 25.0, 40.0, 55.0));

        let first = detect_first_face(&det, Some("one.jpg")).await;
        let second = detect_first_face(&det, Some("two.jpg")).await;
        let offset = alignment_offset(first.face.as_ref(), second.face.as_ref());

        assert_eq!(offset, Some(-3.0));
        assert_eq!(
            object_position(second.face.as_ref(), &frame),
            "center 31.92307692307692%"
        );
    }
}
