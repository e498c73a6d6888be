use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An interest label. Equality is exact string match; nothing upstream folds
/// case or whitespace.
pub type Label = String;

/// Ordered, de-duplicated union of every user's interest labels.
///
/// Labels keep first-seen order across a stable scan of the input lists
/// (user 1, then user 2, then user 3). Empty strings are not labels and are
/// skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Label>", into = "Vec<Label>")]
pub struct LabelUniverse {
    labels: Vec<Label>,
    positions: HashMap<Label, usize>,
}

impl LabelUniverse {
    /// Build the universe from any number of interest lists.
    pub fn from_lists<I, L, S>(lists: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut universe = Self::default();
        for list in lists {
            for label in list {
                universe.push(label.as_ref());
            }
        }
        universe
    }

    fn push(&mut self, label: &str) {
        if label.is_empty() || self.positions.contains_key(label) {
            return;
        }
        self.positions.insert(label.to_owned(), self.labels.len());
        self.labels.push(label.to_owned());
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in universe order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Row/column index of `label` inside the similarity matrix.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.positions.get(label).copied()
    }
}

impl From<Vec<Label>> for LabelUniverse {
    fn from(labels: Vec<Label>) -> Self {
        Self::from_lists([labels])
    }
}

impl From<LabelUniverse> for Vec<Label> {
    fn from(universe: LabelUniverse) -> Self {
        universe.labels
    }
}

/// Square table of similarities indexed by [`LabelUniverse`] position.
///
/// Stored row-major. Serializes as nested rows so render sinks can consume it
/// directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// The degenerate matrix for an empty universe.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `n × n` matrix with ones on the diagonal and zeros elsewhere.
    pub fn identity(size: usize) -> Self {
        let mut values = vec![0.0; size * size];
        for i in 0..size {
            values[i * size + i] = 1.0;
        }
        Self { size, values }
    }

    /// Number of rows (equal to the number of columns).
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.size || col >= self.size {
            return None;
        }
        Some(self.values[row * self.size + col])
    }

    /// Write `value` to both `(a, b)` and `(b, a)`.
    pub(crate) fn set_symmetric(&mut self, a: usize, b: usize, value: f64) {
        self.values[a * self.size + b] = value;
        self.values[b * self.size + a] = value;
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.size {
            return None;
        }
        let start = row * self.size;
        Some(&self.values[start..start + self.size])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on zero; an empty matrix has no rows anyway.
        self.values.chunks_exact(self.size.max(1))
    }

    /// Arithmetic mean of one row: the label's affinity to the whole universe.
    pub fn row_mean(&self, row: usize) -> Option<f64> {
        self.row(row)
            .map(|values| values.iter().sum::<f64>() / self.size as f64)
    }

    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.size)
            .map(|i| self.values[i * self.size + i])
            .collect()
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| {
            (i + 1..self.size)
                .all(|j| self.values[i * self.size + j] == self.values[j * self.size + i])
        })
    }
}

impl From<SimilarityMatrix> for Vec<Vec<f64>> {
    fn from(matrix: SimilarityMatrix) -> Self {
        matrix.rows().map(<[f64]>::to_vec).collect()
    }
}

impl TryFrom<Vec<Vec<f64>>> for SimilarityMatrix {
    type Error = String;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        let size = rows.len();
        let mut values = Vec::with_capacity(size * size);
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(format!(
                    "similarity matrix row {idx} has {} columns, expected {size}",
                    row.len()
                ));
            }
            values.extend(row);
        }
        Ok(Self { size, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universe_preserves_first_seen_order() {
        let universe = LabelUniverse::from_lists([
            vec!["Hiking", "Gaming"],
            vec!["Cooking", "Gaming", "Travel"],
            vec!["Travel", "Photography"],
        ]);
        assert_eq!(
            universe.labels(),
            &["Hiking", "Gaming", "Cooking", "Travel", "Photography"]
        );
        assert_eq!(universe.index_of("Travel"), Some(3));
        assert_eq!(universe.index_of("travel"), None);
    }

    #[test]
    fn universe_skips_empty_labels() {
        let universe = LabelUniverse::from_lists([vec!["", "a"], vec![""]]);
        assert_eq!(universe.labels(), &["a"]);
    }

    #[test]
    fn universe_serde_rebuilds_positions() {
        let universe = LabelUniverse::from_lists([vec!["x", "y"]]);
        let json = serde_json::to_string(&universe).unwrap();
        assert_eq!(json, r#"["x","y"]"#);
        let back: LabelUniverse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.index_of("y"), Some(1));
    }

    #[test]
    fn identity_has_unit_diagonal() {
        let matrix = SimilarityMatrix::identity(3);
        assert_eq!(matrix.diagonal(), vec![1.0, 1.0, 1.0]);
        assert_eq!(matrix.get(0, 1), Some(0.0));
        assert_eq!(matrix.get(3, 0), None);
    }

    #[test]
    fn set_symmetric_writes_both_cells() {
        let mut matrix = SimilarityMatrix::identity(2);
        matrix.set_symmetric(0, 1, 0.25);
        assert_eq!(matrix.get(1, 0), Some(0.25));
        assert!(matrix.is_symmetric());
    }

    #[test]
    fn row_mean_averages_over_universe() {
        let mut matrix = SimilarityMatrix::identity(3);
        matrix.set_symmetric(0, 1, 0.5);
        matrix.set_symmetric(0, 2, 0.5);
        assert_eq!(matrix.row_mean(0), Some(2.0 / 3.0));
        assert_eq!(matrix.row_mean(5), None);
    }

    #[test]
    fn empty_matrix_has_no_rows() {
        let matrix = SimilarityMatrix::empty();
        assert!(matrix.is_empty());
        assert_eq!(matrix.rows().count(), 0);
    }

    #[test]
    fn matrix_rejects_ragged_rows() {
        let result: Result<SimilarityMatrix, _> =
            serde_json::from_str("[[1.0, 0.5], [0.5]]");
        assert!(result.is_err());
    }
}
