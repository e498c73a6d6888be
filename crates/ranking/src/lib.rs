//! Affinity ranking and color encoding.
//!
//! Consumes the matrix produced by the `similarity` crate:
//!
//! - [`reorder_interests`] sorts a user's interests by mean affinity to the
//!   whole universe (stable, descending), with a lexicographic fallback when
//!   no matrix is available.
//! - [`affinity_color`] / [`heatmap_color`] map scores to render colors.

mod color;
mod rank;

pub use crate::color::{
    affinity_color, heatmap_color, interest_color, neutral_color_pair, Color, ColorPair, Hsl, Rgb,
    DARK_GRAY, LIGHT_GRAY, NEUTRAL_BACKGROUND, NEUTRAL_FOREGROUND, TEAL, TEAL_HUE, WHITE,
};
pub use crate::rank::{affinity_of, affinity_scores, reorder_interests};
