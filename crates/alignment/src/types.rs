use serde::{Deserialize, Serialize};
use std::fmt;

/// Face rectangle in pixels of the reference image frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Fixed display size that detector coordinates are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFrame {
    pub width: f64,
    pub height: f64,
}

impl Default for ReferenceFrame {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 260.0,
        }
    }
}

/// Box overlay position as percentages of the reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxStyle {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl fmt::Display for BoxStyle {
    /// Inline CSS for an absolutely positioned overlay.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "position: absolute; top: {}%; left: {}%; width: {}%; height: {}%",
            self.top, self.left, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_frame_default() {
        let frame = ReferenceFrame::default();
        assert_eq!(frame.width, 200.0);
        assert_eq!(frame.height, 260.0);
    }

    #[test]
    fn bounding_box_deserializes_detector_shape() {
        let face: BoundingBox =
            serde_json::from_str(r#"{"x": 10, "y": 20, "width": 50, "height": 60}"#).unwrap();
        assert_eq!(face, BoundingBox::new(10.0, 20.0, 50.0, 60.0));
    }

    #[test]
    fn box_style_css() {
        let style = BoxStyle {
            top: 20.0,
            left: 20.0,
            width: 60.0,
            height: 50.0,
        };
        assert_eq!(
            style.to_string(),
            "position: absolute; top: 20%; left: 20%; width: 60%; height: 50%"
        );
    }
}
