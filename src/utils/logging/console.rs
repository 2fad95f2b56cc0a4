//! Console output utilities
//!
//! Display-only helpers. The random preview mirrors a quick look at a few
//! rows; it never feeds back into the analysis.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use crate::models::{SampleRecord, SampleTable};

/// Pick up to `n` random samples, reproducible for a given seed
///
/// The returned rows keep their table order.
#[must_use]
pub fn select_preview(table: &SampleTable, n: usize, seed: u64) -> Vec<&SampleRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let indices: Vec<usize> = (0..table.len()).collect();
    let mut chosen: Vec<usize> = indices.choose_multiple(&mut rng, n).copied().collect();
    chosen.sort_unstable();
    chosen.into_iter().map(|i| &table.records()[i]).collect()
}

/// Print a random preview of sample rows
pub fn print_sample_preview(table: &SampleTable, n: usize, seed: u64) {
    let rows = select_preview(table, n, seed);
    println!("Random preview of {} of {} samples (seed {seed}):", rows.len(), table.len());
    println!(
        "  {:<20} | {:<28} | {:>6} | {:>15}",
        "sample_id", "patient_condition", "age", "log10_CRTAC1_nm"
    );
    for row in rows {
        println!(
            "  {:<20} | {:<28} | {:>6.1} | {:>15.4}",
            row.sample_id, row.patient_condition, row.age, row.log10_crtac1_nm
        );
    }
}

/// Truncate a string for fixed-width table cells
#[must_use]
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientCondition;

    fn table(n: usize) -> SampleTable {
        (0..n)
            .map(|i| {
                SampleRecord::new(
                    format!("s{i}"),
                    PatientCondition::Healthy,
                    40.0 + i as f64,
                    1.0,
                )
            })
            .collect()
    }

    #[test]
    fn test_preview_is_seeded_and_bounded() {
        let t = table(20);
        let a: Vec<_> = select_preview(&t, 5, 42).iter().map(|r| r.sample_id.clone()).collect();
        let b: Vec<_> = select_preview(&t, 5, 42).iter().map(|r| r.sample_id.clone()).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
        assert_eq!(select_preview(&t, 50, 1).len(), 20);
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("a long condition label", 10), "a long ...");
    }
}
