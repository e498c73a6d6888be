//! Eye-line alignment and overlay geometry.
//!
//! All coordinates are pixels in the [`ReferenceFrame`]. Nothing here touches
//! the network; inputs are whatever a detector produced, or `None`.

use crate::types::{BoundingBox, BoxStyle, ReferenceFrame};

/// Eyes sit this far down the face box, measured from its top edge.
pub const EYE_LINE_FRACTION: f64 = 0.4;

/// Vertical position of the estimated eye line.
pub fn eye_line(face: &BoundingBox) -> f64 {
    face.y + face.height * EYE_LINE_FRACTION
}

/// Vertical offset applied to the second image so its eye line meets the
/// first image's. `None` unless both faces are known.
pub fn alignment_offset(first: Option<&BoundingBox>, second: Option<&BoundingBox>) -> Option<f64> {
    match (first, second) {
        (Some(a), Some(b)) => Some(eye_line(a) - eye_line(b)),
        _ => None,
    }
}

/// CSS transform for an offset; a missing offset means no shift.
pub fn translate_y(offset: Option<f64>) -> String {
    format!("translateY({}px)", offset.unwrap_or(0.0))
}

/// Overlay rectangle as percentages of the frame.
pub fn box_to_style(face: &BoundingBox, frame: &ReferenceFrame) -> BoxStyle {
    BoxStyle {
        top: face.y * 100.0 / frame.height,
        left: face.x * 100.0 / frame.width,
        width: face.width * 100.0 / frame.width,
        height: face.height * 100.0 / frame.height,
    }
}

/// CSS `object-position` that biases cropping toward the face. The focal
/// point is the eye line, not the geometric center of the box.
pub fn object_position(face: Option<&BoundingBox>, frame: &ReferenceFrame) -> String {
    let Some(face) = face else {
        return "center center".to_string();
    };
    let focus_y = eye_line(face);
    let pct = ((frame.height / 2.0 - focus_y) / frame.height * 100.0).clamp(0.0, 100.0);
    format!("center {pct}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_aligns_eye_lines() {
        let first = BoundingBox::new(10.0, 20.0, 50.0, 60.0);
        let second = BoundingBox::new(15.0, 25.0, 40.0, 55.0);
        assert_eq!(eye_line(&first), 44.0);
        assert_eq!(eye_line(&second), 47.0);
        assert_eq!(alignment_offset(Some(&first), Some(&second)), Some(-3.0));
        assert_eq!(translate_y(Some(-3.0)), "translateY(-3px)");
    }

    #[test]
    fn offset_requires_both_faces() {
        let face = BoundingBox::new(10.0, 20.0, 50.0, 60.0);
        assert_eq!(alignment_offset(None, Some(&face)), None);
        assert_eq!(alignment_offset(Some(&face), None), None);
        assert_eq!(alignment_offset(None, None), None);
        assert_eq!(translate_y(None), "translateY(0px)");
    }

    #[test]
    fn box_style_percentages() {
        let style = box_to_style(
            &BoundingBox::new(40.0, 52.0, 120.0, 130.0),
            &ReferenceFrame::default(),
        );
        assert_eq!(
            style,
            BoxStyle {
                top: 20.0,
                left: 20.0,
                width: 60.0,
                height: 50.0
            }
        );
    }

    #[test]
    fn object_position_centers_face() {
        let frame = ReferenceFrame::default();
        assert_eq!(object_position(None, &frame), "center center");
        assert_eq!(
            object_position(Some(&BoundingBox::new(40.0, 52.0, 120.0, 130.0)), &frame),
            "center 10%"
        );
    }

    #[test]
    fn object_position_clamps() {
        let frame = ReferenceFrame::default();
        // eye line below the middle of the frame
        let low = BoundingBox::new(0.0, 200.0, 50.0, 50.0);
        assert_eq!(object_position(Some(&low), &frame), "center 0%");
    }
}
