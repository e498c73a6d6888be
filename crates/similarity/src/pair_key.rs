use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical key for an unordered pair of labels.
///
/// The two labels are stored sorted, so `(a, b)` and `(b, a)` produce equal
/// keys. Being a structured pair, no separator can collide with label text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    low: String,
    high: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            low: low.to_owned(),
            high: high.to_owned(),
        }
    }

    /// Lexicographically smaller label.
    pub fn low(&self) -> &str {
        &self.low
    }

    /// Lexicographically larger label.
    pub fn high(&self) -> &str {
        &self.high
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ~ {:?}", self.low, self.high)
    }
}

/// Map an unordered label pair to its cache key.
pub fn canonical_key(a: &str, b: &str) -> PairKey {
    PairKey::new(a, b)
}
