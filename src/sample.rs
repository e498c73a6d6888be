//! Demo profiles used by the binary and the integration tests.

use alignment::{BoundingBox, StubFaceDetector};
use serde::Serialize;

/// Interests for three users and portraits for the first two.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleProfiles {
    pub interests: [Vec<String>; 3],
    pub images: [Option<String>; 2],
}

pub const PORTRAIT_ONE: &str = "https://randomuser.me/api/portraits/men/32.jpg";
pub const PORTRAIT_TWO: &str = "https://randomuser.me/api/portraits/women/65.jpg";

pub fn sample_profiles() -> SampleProfiles {
    let list = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    SampleProfiles {
        interests: [
            list(&["Hiking", "Swimming", "Gaming", "Coding"]),
            list(&["Reading", "Cooking", "Gaming", "Travel"]),
            list(&["Cooking", "Travel", "Photography"]),
        ],
        images: [Some(PORTRAIT_ONE.to_string()), Some(PORTRAIT_TWO.to_string())],
    }
}

/// Stub detector that knows a face for each sample portrait.
pub fn sample_face_detector() -> StubFaceDetector {
    StubFaceDetector::new()
        .with_face(PORTRAIT_ONE, BoundingBox::new(10.0, 20.0, 50.0, 60.0))
        .with_face(PORTRAIT_TWO, BoundingBox::new(15.0, 25.0, 40.0, 55.0))
}
