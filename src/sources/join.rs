//! Explicit inner joins on string keys
//!
//! A join returns both the matched row pairs and the left rows that found no
//! partner, so row loss is auditable instead of silent.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Result of an inner join between two key columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinOutcome {
    /// `(left_row, right_row)` pairs, ordered by left row then right row
    pub pairs: Vec<(usize, usize)>,
    /// Left rows without any match
    pub unmatched_left: Vec<usize>,
}

impl JoinOutcome {
    /// Keys of the unmatched left rows; null keys are rendered with their row
    #[must_use]
    pub fn dropped_keys(&self, left_keys: &[Option<String>]) -> Vec<String> {
        self.unmatched_left
            .iter()
            .map(|&row| key_label(left_keys, row))
            .collect()
    }
}

/// Display form of a possibly missing key
#[must_use]
pub fn key_label(keys: &[Option<String>], row: usize) -> String {
    keys[row]
        .clone()
        .unwrap_or_else(|| format!("<missing key, row {row}>"))
}

/// Inner join of `left_keys` against `right_keys`
///
/// Null keys never match. A left row matching several right rows yields one
/// pair per match.
#[must_use]
pub fn inner_join(left_keys: &[Option<String>], right_keys: &[Option<String>]) -> JoinOutcome {
    let mut index: FxHashMap<&str, SmallVec<[usize; 1]>> = FxHashMap::default();
    for (row, key) in right_keys.iter().enumerate() {
        if let Some(key) = key {
            index.entry(key.as_str()).or_default().push(row);
        }
    }

    let mut outcome = JoinOutcome::default();
    for (left_row, key) in left_keys.iter().enumerate() {
        match key.as_deref().and_then(|k| index.get(k)) {
            Some(matches) => outcome
                .pairs
                .extend(matches.iter().map(|&right_row| (left_row, right_row))),
            None => outcome.unmatched_left.push(left_row),
        }
    }

    outcome
}
