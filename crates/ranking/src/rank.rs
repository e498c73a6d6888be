use std::cmp::Ordering;

use similarity::{LabelUniverse, SimilarityMatrix};
use tracing::debug;

/// Mean affinity of every universe label, in universe order.
pub fn affinity_scores(matrix: &SimilarityMatrix) -> Vec<f64> {
    (0..matrix.len())
        .filter_map(|row| matrix.row_mean(row))
        .collect()
}

/// Affinity of `label`: mean of its matrix row. `None` when the label is not
/// in the universe or the matrix does not cover it.
pub fn affinity_of(
    label: &str,
    universe: &LabelUniverse,
    matrix: &SimilarityMatrix,
) -> Option<f64> {
    universe
        .index_of(label)
        .and_then(|row| matrix.row_mean(row))
}

/// Reorder one user's interests by descending affinity.
///
/// The sort is stable: equal scores keep their input order. Labels without a
/// score (absent from the universe) sink to the end, also in input order. An
/// empty matrix means no similarity data is available, and the list is sorted
/// lexicographically ascending instead.
pub fn reorder_interests(
    interests: &[String],
    universe: &LabelUniverse,
    matrix: &SimilarityMatrix,
) -> Vec<String> {
    if matrix.is_empty() {
        debug!(len = interests.len(), "reorder_lexicographic_fallback");
        let mut sorted = interests.to_vec();
        sorted.sort();
        return sorted;
    }

    let mut scored: Vec<(Option<f64>, &String)> = interests
        .iter()
        .map(|label| (affinity_of(label, universe, matrix), label))
        .collect();
    // slice::sort_by is stable
    scored.sort_by(|(a, _), (b, _)| descending(*a, *b));
    scored.into_iter().map(|(_, label)| label.clone()).collect()
}

fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    /// Universe `a, b, c, d` with row means a=0.5, b=0.625, c=0.5, d=0.375.
    fn fixture() -> (LabelUniverse, SimilarityMatrix) {
        let universe = LabelUniverse::from_lists([vec!["a", "b", "c", "d"]]);
        let matrix = SimilarityMatrix::try_from(vec![
            vec![1.0, 0.5, 0.25, 0.25],
            vec![0.5, 1.0, 0.75, 0.25],
            vec![0.25, 0.75, 1.0, 0.0],
            vec![0.25, 0.25, 0.0, 1.0],
        ])
        .unwrap();
        (universe, matrix)
    }

    #[test]
    fn affinity_is_row_mean() {
        let (universe, matrix) = fixture();
        assert_eq!(affinity_of("b", &universe, &matrix), Some(0.625));
        assert_eq!(affinity_of("zz", &universe, &matrix), None);
        assert_eq!(affinity_scores(&matrix).len(), 4);
    }

    #[test]
    fn reorder_descending_by_affinity() {
        let (universe, matrix) = fixture();
        let ordered = reorder_interests(&owned(&["d", "a", "b"]), &universe, &matrix);
        assert_eq!(ordered, owned(&["b", "a", "d"]));
    }

    #[test]
    fn reorder_is_stable_for_ties() {
        let (universe, matrix) = fixture();
        assert_eq!(
            reorder_interests(&owned(&["c", "a"]), &universe, &matrix),
            owned(&["c", "a"])
        );
        assert_eq!(
            reorder_interests(&owned(&["a", "c"]), &universe, &matrix),
            owned(&["a", "c"])
        );
    }

    #[test]
    fn reorder_is_idempotent() {
        let (universe, matrix) = fixture();
        let once = reorder_interests(&owned(&["d", "c", "b", "a"]), &universe, &matrix);
        let twice = reorder_interests(&once, &universe, &matrix);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_matrix_sorts_lexicographically() {
        let ordered = reorder_interests(
            &owned(&["Travel", "Cooking", "Reading"]),
            &LabelUniverse::default(),
            &SimilarityMatrix::empty(),
        );
        assert_eq!(ordered, owned(&["Cooking", "Reading", "Travel"]));
    }

    #[test]
    fn unknown_labels_sink_to_end() {
        let (universe, matrix) = fixture();
        let ordered = reorder_interests(&owned(&["x", "d", "y", "b"]), &universe, &matrix);
        assert_eq!(ordered, owned(&["b", "d", "x", "y"]));
    }
}
