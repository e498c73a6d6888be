use alignment::{BoundingBox, BoxStyle, ReferenceFrame};
use ranking::{Color, ColorPair};
use serde::Serialize;
use similarity::{LabelUniverse, SimilarityMatrix};

/// Authoritative engine state as last committed by each pass kind.
///
/// Flags live here, per snapshot, rather than in process-wide state. Every
/// render-time projection is a pure function of this value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineSnapshot {
    /// Generation of the last interest pass that started.
    pub interest_generation: u64,
    /// Generation of the last face pass that started.
    pub face_generation: u64,

    pub universe: LabelUniverse,
    pub matrix: SimilarityMatrix,
    pub ordered_interests: [Vec<String>; 3],
    pub similarity_degraded: bool,
    pub loading_similarity: bool,

    pub face_boxes: [Option<BoundingBox>; 2],
    pub alignment_offset: Option<f64>,
    pub face_detect_degraded: bool,
    pub loading_faces: bool,

    pub frame: ReferenceFrame,
}

impl EngineSnapshot {
    pub(crate) fn new(frame: ReferenceFrame) -> Self {
        Self {
            frame,
            ..Default::default()
        }
    }

    /// Chip colors for an interest label.
    pub fn interest_color(&self, label: &str) -> ColorPair {
        ranking::interest_color(label, &self.universe, &self.matrix)
    }

    /// Heatmap colors, one per matrix cell, in universe order.
    pub fn heatmap(&self) -> Vec<Vec<Color>> {
        self.matrix
            .rows()
            .map(|row| {
                row.iter()
                    .map(|&value| Color::from(ranking::heatmap_color(value)))
                    .collect()
            })
            .collect()
    }

    /// Overlay style for the face box of portrait `user` (0 or 1).
    pub fn face_box_style(&self, user: usize) -> Option<BoxStyle> {
        self.face_box(user)
            .map(|face| alignment::box_to_style(face, &self.frame))
    }

    pub fn object_position(&self, user: usize) -> String {
        alignment::object_position(self.face_box(user), &self.frame)
    }

    /// Union of the three ordered lists, first-seen order.
    pub fn all_unique_ordered_interests(&self) -> Vec<String> {
        LabelUniverse::from_lists(self.ordered_interests.iter())
            .labels()
            .to_vec()
    }

    /// CSS transform for the second portrait.
    pub fn alignment_transform(&self) -> String {
        alignment::translate_y(self.alignment_offset)
    }

    fn face_box(&self, user: usize) -> Option<&BoundingBox> {
        self.face_boxes.get(user).and_then(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ranking::{affinity_color, neutral_color_pair, LIGHT_GRAY, TEAL};

    fn snapshot() -> EngineSnapshot {
        let universe = LabelUniverse::from_lists([vec!["a", "b"]]);
        let matrix = SimilarityMatrix::try_from(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        EngineSnapshot {
            universe,
            matrix,
            ordered_interests: [
                vec!["b".to_string(), "a".to_string()],
                vec!["a".to_string(), "c".to_string()],
                vec![],
            ],
            face_boxes: [Some(BoundingBox::new(40.0, 52.0, 120.0, 130.0)), None],
            alignment_offset: Some(-3.0),
            ..EngineSnapshot::new(ReferenceFrame::default())
        }
    }

    #[test]
    fn interest_color_uses_affinity() {
        let snap = snapshot();
        assert_eq!(snap.interest_color("a"), affinity_color(0.5));
        assert_eq!(snap.interest_color("zzz"), neutral_color_pair());
    }

    #[test]
    fn heatmap_matches_matrix_shape() {
        let heat = snapshot().heatmap();
        assert_eq!(heat.len(), 2);
        assert_eq!(heat[0][0], Color::from(TEAL));
        assert_eq!(heat[0][1], Color::from(LIGHT_GRAY));
        assert!(EngineSnapshot::default().heatmap().is_empty());
    }

    #[test]
    fn face_projections() {
        let snap = snapshot();
        let style = snap.face_box_style(0).unwrap();
        assert_eq!((style.top, style.left, style.width, style.height), (20.0, 20.0, 60.0, 50.0));
        assert_eq!(snap.face_box_style(1), None);
        assert_eq!(snap.face_box_style(7), None);
        assert_eq!(snap.object_position(0), "center 10%");
        assert_eq!(snap.object_position(1), "center center");
        assert_eq!(snap.alignment_transform(), "translateY(-3px)");
    }

    #[test]
    fn unique_ordered_interests_keep_first_seen_order() {
        assert_eq!(snapshot().all_unique_ordered_interests(), vec!["b", "a", "c"]);
    }
}
