use async_trait::async_trait;
use std::collections::HashMap;

use crate::oracle::SimilarityOracle;
use crate::SimilarityError;

/// Offline oracle: Dice coefficient over lowercase character bigrams.
///
/// Deterministic and symmetric, so demos and tests get stable matrices
/// without network access. Not a semantic model.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubSimilarityOracle;

impl StubSimilarityOracle {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SimilarityOracle for StubSimilarityOracle {
    fn name(&self) -> &str {
        "stub"
    }

    async fn similarity(&self, a: &str, b: &str) -> Result<f64, SimilarityError> {
        Ok(bigram_dice(a, b))
    }
}

fn bigrams(text: &str) -> HashMap<(char, char), usize> {
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    let mut counts = HashMap::new();
    for pair in chars.windows(2) {
        *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
    }
    counts
}

pub(crate) fn bigram_dice(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let left = bigrams(a);
    let right = bigrams(b);
    let total: usize = left.values().sum::<usize>() + right.values().sum::<usize>();
    if total == 0 {
        // Single characters carry no bigrams; fall back to case-folded equality.
        return if a.to_lowercase() == b.to_lowercase() { 1.0 } else { 0.0 };
    }
    let shared: usize = left
        .iter()
        .map(|(gram, count)| (*count).min(right.get(gram).copied().unwrap_or(0)))
        .sum();
    (2 * shared) as f64 / total as f64
}
