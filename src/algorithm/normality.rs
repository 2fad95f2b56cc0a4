//! Shapiro-Wilk normality test
//!
//! Royston's AS R94 algorithm: approximate coefficients from normal order
//! statistics, W as the squared correlation between the sorted sample and the
//! coefficients, and a normalizing transform of `1 - W` for the p-value.
//! Valid for 3 <= n <= 5000; n = 3 uses the exact distribution.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{AnalysisError, Result};
use crate::models::{PatientCondition, SampleTable};
use crate::utils::logging::console::truncate_string;

const MIN_N: usize = 3;
const MAX_N: usize = 5000;
/// Samples with a smaller range count as constant
const MIN_RANGE: f64 = 1e-10;

// Polynomial approximations, lowest order first
const G: [f64; 2] = [-2.273, 0.459];
const C1: [f64; 6] = [0.0, 0.221_157, -0.147_981, -2.071_19, 4.434_685, -2.706_056];
const C2: [f64; 6] = [0.0, 0.042_981, -0.293_762, -1.752_461, 5.682_633, -3.582_633];
const C3: [f64; 4] = [0.544, -0.399_78, 0.025_054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.778_57, 0.062_767, -0.002_032_2];
const C5: [f64; 4] = [-1.5861, -0.310_82, -0.083_751, 0.003_891_5];
const C6: [f64; 3] = [-0.4803, -0.082_676, 0.003_030_2];

/// Result of a Shapiro-Wilk test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShapiroWilk {
    pub n: usize,
    pub w: f64,
    pub p_value: f64,
}

/// Shapiro-Wilk result for one condition group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalityResult {
    pub condition: PatientCondition,
    pub n: usize,
    pub w: f64,
    pub p_value: f64,
}

fn poly(cc: &[f64], x: f64) -> f64 {
    let nord = cc.len();
    let mut value = cc[0];
    if nord > 1 {
        let mut p = x * cc[nord - 1];
        for &c in cc[1..nord - 1].iter().rev() {
            p = (p + c) * x;
        }
        value += p;
    }
    value
}

fn numerical(e: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::Numerical(format!("normal distribution: {e}"))
}

/// Antisymmetric coefficient vector of length `n`
fn coefficients(n: usize, std_normal: &Normal) -> Vec<f64> {
    let half = n / 2;
    // half[i] is the coefficient for the (i + 1)-th largest value
    let mut upper = vec![0.0; half];

    if n == 3 {
        upper[0] = 0.5_f64.sqrt();
    } else {
        let an = n as f64;
        let an25 = an + 0.25;
        let m: Vec<f64> = (1..=half)
            .map(|i| std_normal.inverse_cdf((i as f64 - 0.375) / an25))
            .collect();
        let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
        let ssumm2 = summ2.sqrt();
        let rsn = 1.0 / an.sqrt();
        let a1 = poly(&C1, rsn) - m[0] / ssumm2;

        let (first_scaled, fac) = if n > 5 {
            let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
            let fac = ((summ2 - 2.0 * m[0].powi(2) - 2.0 * m[1].powi(2))
                / (1.0 - 2.0 * a1.powi(2) - 2.0 * a2.powi(2)))
            .sqrt();
            upper[1] = a2;
            (2, fac)
        } else {
            let fac = ((summ2 - 2.0 * m[0].powi(2)) / (1.0 - 2.0 * a1.powi(2))).sqrt();
            (1, fac)
        };
        upper[0] = a1;
        for i in first_scaled..half {
            upper[i] = -m[i] / fac;
        }
    }

    // upper[i] belongs to x[n-1-i], its negation to x[i]
    let mut full = vec![0.0; n];
    for (i, &a) in upper.iter().enumerate() {
        full[i] = -a;
        full[n - 1 - i] = a;
    }
    full
}

/// Shapiro-Wilk test of the hypothesis that `values` come from a normal
/// distribution
///
/// # Errors
/// - [`AnalysisError::InsufficientData`] for fewer than 3 values
/// - [`AnalysisError::Numerical`] for more than 5000 values, non-finite
///   values or a zero range
pub fn shapiro_wilk(values: &[f64]) -> Result<ShapiroWilk> {
    let n = values.len();
    if n < MIN_N {
        return Err(AnalysisError::InsufficientData(format!(
            "Shapiro-Wilk needs at least {MIN_N} values, got {n}"
        )));
    }
    if n > MAX_N {
        return Err(AnalysisError::Numerical(format!(
            "Shapiro-Wilk supports at most {MAX_N} values, got {n}"
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::Numerical(
            "Shapiro-Wilk input contains non-finite values".to_string(),
        ));
    }

    let mut x = values.to_vec();
    x.sort_by(f64::total_cmp);

    let range = x[n - 1] - x[0];
    if range < MIN_RANGE {
        return Err(AnalysisError::Numerical(
            "Shapiro-Wilk input has zero range (all values identical)".to_string(),
        ));
    }

    let std_normal = Normal::new(0.0, 1.0).map_err(numerical)?;
    let a = coefficients(n, &std_normal);

    let an = n as f64;
    let sa = a.iter().sum::<f64>() / an;
    let sx = x.iter().map(|v| v / range).sum::<f64>() / an;

    let (mut ssa, mut ssx, mut sax) = (0.0, 0.0, 0.0);
    for (ai, xi) in a.iter().zip(&x) {
        let asa = ai - sa;
        let xsx = xi / range - sx;
        ssa += asa * asa;
        ssx += xsx * xsx;
        sax += asa * xsx;
    }

    // 1 - W, computed directly to keep precision when W is close to 1
    let ssassx = (ssa * ssx).sqrt();
    let w1 = ((ssassx - sax) * (ssassx + sax) / (ssa * ssx)).max(0.0);
    let w = (1.0 - w1).clamp(0.0, 1.0);

    let p_value = if n == 3 {
        // Exact: 6/pi * (asin(sqrt(W)) - pi/3)
        let p = 6.0 / std::f64::consts::PI * (w.sqrt().asin() - std::f64::consts::FRAC_PI_3);
        p.clamp(0.0, 1.0)
    } else if w1 == 0.0 {
        1.0
    } else {
        let mut y = w1.ln();
        let (m, s) = if n <= 11 {
            let gamma = poly(&G, an);
            if y >= gamma {
                return Ok(ShapiroWilk {
                    n,
                    w,
                    p_value: 1e-99,
                });
            }
            y = -(gamma - y).ln();
            (poly(&C3, an), poly(&C4, an).exp())
        } else {
            let ln_n = an.ln();
            (poly(&C5, ln_n), poly(&C6, ln_n).exp())
        };
        Normal::new(m, s).map_err(numerical)?.sf(y)
    };

    Ok(ShapiroWilk { n, w, p_value })
}

/// Shapiro-Wilk test of `log10_CRTAC1_nm` within every present condition
///
/// # Errors
/// Returns [`AnalysisError::InsufficientData`] when a present group has fewer
/// than `min_group_size` (at least 3) samples, plus any error of
/// [`shapiro_wilk`].
pub fn normality_by_condition(
    table: &SampleTable,
    min_group_size: usize,
) -> Result<Vec<NormalityResult>> {
    let required = min_group_size.max(MIN_N);
    table
        .grouped()
        .into_iter()
        .map(|(condition, records)| -> Result<NormalityResult> {
            if records.len() < required {
                return Err(AnalysisError::InsufficientData(format!(
                    "group '{condition}' has {} sample(s), Shapiro-Wilk needs at least {required}",
                    records.len()
                )));
            }
            let values: Vec<f64> = records.iter().map(|r| r.log10_crtac1_nm).collect();
            let test = shapiro_wilk(&values).map_err(|e| match e {
                AnalysisError::Numerical(msg) => {
                    AnalysisError::Numerical(format!("group '{condition}': {msg}"))
                }
                other => other,
            })?;
            Ok(NormalityResult {
                condition,
                n: test.n,
                w: test.w,
                p_value: test.p_value,
            })
        })
        .collect()
}

/// Render normality results as plain text
#[must_use]
pub fn format_normality(results: &[NormalityResult]) -> String {
    let mut output = String::from(
        "Shapiro-Wilk normality test of log10 CRTAC1 by condition\n\n\
         Condition                  |   n |      W |  p-value\n\
         ---------------------------|-----|--------|---------\n",
    );
    for r in results {
        output.push_str(&format!(
            "{:<26} | {:>3} | {:>6.4} | {:>8.4}\n",
            truncate_string(r.condition.label(), 26),
            r.n,
            r.w,
            r.p_value
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SampleRecord;

    #[test]
    fn test_three_equally_spaced_values() {
        let result = shapiro_wilk(&[1.0, 2.0, 3.0]).unwrap();
        assert!((result.w - 1.0).abs() < 1e-12);
        assert!((result.p_value - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_three_unequal_values_use_exact_distribution() {
        let result = shapiro_wilk(&[1.0, 2.0, 4.0]).unwrap();
        assert!(result.w < 1.0 && result.w >= 0.75);
        assert!(result.p_value > 0.0 && result.p_value < 1.0);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let a = shapiro_wilk(&[0.3, 1.9, 1.1, 0.7, 1.4, 2.6, 0.9]).unwrap();
        let b = shapiro_wilk(&[2.6, 0.3, 0.9, 1.4, 1.9, 0.7, 1.1]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_normal_quantiles_look_normal() {
        let std_normal = Normal::new(0.0, 1.0).unwrap();
        let values: Vec<f64> = (1..=20_i32)
            .map(|i| std_normal.inverse_cdf((f64::from(i) - 0.5) / 20.0))
            .collect();
        let result = shapiro_wilk(&values).unwrap();
        assert!(result.w > 0.95);
        assert!(result.p_value > 0.5);
    }

    #[test]
    fn test_uniform_small_sample() {
        let values: Vec<f64> = (1..=10_i32).map(f64::from).collect();
        let result = shapiro_wilk(&values).unwrap();
        assert!(result.w > 0.9 && result.w < 1.0);
        assert!(result.p_value > 0.5);
    }

    #[test]
    fn test_heavy_outliers_reject_normality() {
        let values = [
            1.0, 1.1, 1.2, 1.3, 1.4, 1.5, 1.6, 1.7, 1.8, 1.9, 2.0, 2.1, 25.0, 60.0,
        ];
        let result = shapiro_wilk(&values).unwrap();
        assert!(result.w < 0.7);
        assert!(result.p_value < 0.01);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            shapiro_wilk(&[1.0, 2.0]),
            Err(AnalysisError::InsufficientData(_))
        ));
        assert!(matches!(
            shapiro_wilk(&[1.0, 1.0, 1.0, 1.0]),
            Err(AnalysisError::Numerical(_))
        ));
        assert!(matches!(
            shapiro_wilk(&vec![0.5; 5001]),
            Err(AnalysisError::Numerical(_))
        ));
        assert!(shapiro_wilk(&[1.0, f64::NAN, 2.0]).is_err());
    }

    #[test]
    fn test_coefficients_are_antisymmetric_and_normalized() {
        let std_normal = Normal::new(0.0, 1.0).unwrap();
        for n in [4, 5, 6, 11, 12, 50] {
            let a = coefficients(n, &std_normal);
            assert!(a.iter().sum::<f64>().abs() < 1e-12);
            let norm: f64 = a.iter().map(|v| v * v).sum();
            assert!((norm - 1.0).abs() < 1e-6, "n = {n}: {norm}");
        }
    }

    #[test]
    fn test_by_condition_requires_min_group_size() {
        let table: SampleTable = vec![
            SampleRecord::new("h1", PatientCondition::Healthy, 30.0, 1.0),
            SampleRecord::new("h2", PatientCondition::Healthy, 30.0, 1.2),
            SampleRecord::new("h3", PatientCondition::Healthy, 30.0, 1.1),
            SampleRecord::new("c1", PatientCondition::Copd, 30.0, 1.4),
            SampleRecord::new("c2", PatientCondition::Copd, 30.0, 1.5),
        ]
        .into_iter()
        .collect();
        assert!(matches!(
            normality_by_condition(&table, 3),
            Err(AnalysisError::InsufficientData(_))
        ));

        let healthy_only: SampleTable = table
            .iter()
            .filter(|r| r.patient_condition == PatientCondition::Healthy)
            .cloned()
            .collect();
        let results = normality_by_condition(&healthy_only, 3).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].n, 3);
    }
}
