//! Additive linear model of the biomarker on condition and age
//!
//! `log10_CRTAC1_nm ~ patient_condition + age`, fitted by ordinary least
//! squares through a Householder QR decomposition of the design matrix.
//! Conditions are treatment-coded against `healthy`; a level without
//! observations gets no column.
//!
//! Column layout: `(Intercept)`, one dummy per present non-reference level in
//! level order, then `age`.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

use crate::error::{AnalysisError, Result};
use crate::models::{PatientCondition, SampleTable};

/// Name of the intercept term
pub const INTERCEPT: &str = "(Intercept)";
/// Name of the age term
pub const AGE_TERM: &str = "age";

/// Relative size below which a diagonal entry of R counts as zero
const RANK_TOLERANCE: f64 = 1e-9;

/// One row of the coefficient table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelTerm {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    /// Two-sided p-value on the residual degrees of freedom
    pub p_value: f64,
}

/// Fitted OLS model
#[derive(Debug, Clone, Serialize)]
pub struct LinearModel {
    /// Coefficient table in column order
    pub terms: Vec<ModelTerm>,
    /// Levels with observations, in level order (reference first)
    pub levels: Vec<PatientCondition>,
    pub n_obs: usize,
    pub df_residual: usize,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub residual_std_error: f64,
    pub f_statistic: f64,
    pub f_df: (usize, usize),
    pub f_p_value: f64,
    /// Mean age of the fitted samples
    pub mean_age: f64,
    #[serde(skip)]
    coefficients: DVector<f64>,
    #[serde(skip)]
    covariance: DMatrix<f64>,
}

impl LinearModel {
    /// Fit the model to a unified sample table
    ///
    /// # Errors
    /// - [`AnalysisError::InsufficientData`] with no `healthy` rows or with no
    ///   more observations than parameters
    /// - [`AnalysisError::Numerical`] for a rank-deficient design, a constant
    ///   response or a zero residual variance
    pub fn fit(table: &SampleTable) -> Result<Self> {
        let levels = table.conditions_present();
        if !levels.contains(&PatientCondition::REFERENCE) {
            return Err(AnalysisError::InsufficientData(format!(
                "no '{}' samples to serve as the reference level",
                PatientCondition::REFERENCE
            )));
        }

        let n = table.len();
        let p = levels.len() + 1;
        if n <= p {
            return Err(AnalysisError::InsufficientData(format!(
                "{n} observation(s) for {p} model parameters, at least {} required",
                p + 1
            )));
        }

        let mean_age = table.mean_age().unwrap_or_default();
        let records = table.records();

        let design = ModelDesign { levels: &levels };
        let x = DMatrix::from_fn(n, p, |row, col| {
            design.value(records[row].patient_condition, records[row].age, col)
        });
        let y = DVector::from_iterator(n, records.iter().map(|r| r.log10_crtac1_nm));

        let qr = x.clone().qr();
        let r = qr.r();
        let q = qr.q();

        let diag_max = r.diagonal().iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if let Some(col) = (0..p).find(|&i| r[(i, i)].abs() <= RANK_TOLERANCE * diag_max) {
            return Err(AnalysisError::Numerical(format!(
                "design matrix is rank deficient: column '{}' is collinear with earlier columns",
                design.column_name(col)
            )));
        }

        let qty = q.transpose() * &y;
        let coefficients = r
            .solve_upper_triangular(&qty)
            .ok_or_else(|| AnalysisError::Numerical("singular R factor".to_string()))?;
        let r_inv = r
            .solve_upper_triangular(&DMatrix::identity(p, p))
            .ok_or_else(|| AnalysisError::Numerical("singular R factor".to_string()))?;

        let residuals = &y - &x * &coefficients;
        let rss = residuals.norm_squared();
        let df_residual = n - p;
        let sigma2 = rss / df_residual as f64;

        let y_mean = y.mean();
        let tss: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
        if tss == 0.0 {
            return Err(AnalysisError::Numerical(
                "response has zero variance".to_string(),
            ));
        }
        if sigma2 == 0.0 {
            return Err(AnalysisError::Numerical(
                "residual variance is zero (perfect fit)".to_string(),
            ));
        }

        let covariance = (&r_inv * r_inv.transpose()) * sigma2;

        let t_dist = StudentsT::new(0.0, 1.0, df_residual as f64)
            .map_err(|e| AnalysisError::Numerical(format!("Student t distribution: {e}")))?;
        let terms = (0..p)
            .map(|col| {
                let estimate = coefficients[col];
                let std_error = covariance[(col, col)].sqrt();
                let t_value = estimate / std_error;
                ModelTerm {
                    name: design.column_name(col),
                    estimate,
                    std_error,
                    t_value,
                    p_value: 2.0 * t_dist.sf(t_value.abs()),
                }
            })
            .collect();

        let r_squared = 1.0 - rss / tss;
        let adj_r_squared = 1.0 - (1.0 - r_squared) * (n - 1) as f64 / df_residual as f64;

        let df_model = p - 1;
        let f_statistic = ((tss - rss) / df_model as f64) / sigma2;
        let f_dist = FisherSnedecor::new(df_model as f64, df_residual as f64)
            .map_err(|e| AnalysisError::Numerical(format!("F distribution: {e}")))?;
        let f_p_value = f_dist.sf(f_statistic);

        log::info!(
            "Fitted linear model on {n} samples, {p} parameters, R² = {r_squared:.4}"
        );

        Ok(Self {
            terms,
            levels,
            n_obs: n,
            df_residual,
            r_squared,
            adj_r_squared,
            residual_std_error: sigma2.sqrt(),
            f_statistic,
            f_df: (df_model, df_residual),
            f_p_value,
            mean_age,
            coefficients,
            covariance,
        })
    }

    /// Coefficient vector in column order
    #[must_use]
    pub const fn coefficients(&self) -> &DVector<f64> {
        &self.coefficients
    }

    /// Coefficient table row by term name
    #[must_use]
    pub fn coefficient(&self, name: &str) -> Option<&ModelTerm> {
        self.terms.iter().find(|t| t.name == name)
    }

    /// Whether a level has observations in the fitted data
    #[must_use]
    pub fn has_level(&self, level: PatientCondition) -> bool {
        self.levels.contains(&level)
    }

    /// Design row predicting `level` at the given age
    ///
    /// # Errors
    /// Returns [`AnalysisError::InsufficientData`] when the level had no
    /// observations.
    pub fn design_row(&self, level: PatientCondition, age: f64) -> Result<DVector<f64>> {
        if !self.has_level(level) {
            return Err(AnalysisError::InsufficientData(format!(
                "level '{level}' has no observations in the fitted model"
            )));
        }
        let design = ModelDesign {
            levels: &self.levels,
        };
        let p = self.coefficients.len();
        Ok(DVector::from_fn(p, |col, _| design.value(level, age, col)))
    }

    /// Estimate and standard error of the linear functional `l·β`
    #[must_use]
    pub fn linear_functional(&self, l: &DVector<f64>) -> (f64, f64) {
        let estimate = l.dot(&self.coefficients);
        let variance = (l.transpose() * &self.covariance * l)[(0, 0)];
        (estimate, variance.max(0.0).sqrt())
    }

    /// Student t distribution on the residual degrees of freedom
    ///
    /// # Errors
    /// Returns [`AnalysisError::Numerical`] if the distribution is invalid.
    pub fn residual_t(&self) -> Result<StudentsT> {
        StudentsT::new(0.0, 1.0, self.df_residual as f64)
            .map_err(|e| AnalysisError::Numerical(format!("Student t distribution: {e}")))
    }

    /// Render the coefficient table with fit statistics
    #[must_use]
    pub fn format_table(&self) -> String {
        let mut output = String::from(
            "Term                       |   Estimate | Std. Error |  t value | Pr(>|t|)\n\
             ---------------------------|------------|------------|----------|----------\n",
        );
        for term in &self.terms {
            output.push_str(&format!(
                "{:<26} | {:>10.5} | {:>10.5} | {:>8.3} | {:>9.3e}\n",
                term.name, term.estimate, term.std_error, term.t_value, term.p_value
            ));
        }
        output.push_str(&format!(
            "\nResidual standard error: {:.4} on {} degrees of freedom\n\
             Multiple R-squared: {:.4}, Adjusted R-squared: {:.4}\n\
             F-statistic: {:.3} on {} and {} DF, p-value: {:.3e}\n",
            self.residual_std_error,
            self.df_residual,
            self.r_squared,
            self.adj_r_squared,
            self.f_statistic,
            self.f_df.0,
            self.f_df.1,
            self.f_p_value
        ));
        output
    }
}

/// Column mapping of the treatment-coded design
struct ModelDesign<'a> {
    levels: &'a [PatientCondition],
}

impl ModelDesign<'_> {
    /// Dummy columns are the non-reference present levels
    fn dummies(&self) -> impl Iterator<Item = PatientCondition> + '_ {
        self.levels
            .iter()
            .copied()
            .filter(|&l| l != PatientCondition::REFERENCE)
    }

    fn age_column(&self) -> usize {
        self.levels.len()
    }

    fn value(&self, level: PatientCondition, age: f64, col: usize) -> f64 {
        if col == 0 {
            1.0
        } else if col == self.age_column() {
            age
        } else if self.dummies().nth(col - 1) == Some(level) {
            1.0
        } else {
            0.0
        }
    }

    fn column_name(&self, col: usize) -> String {
        if col == 0 {
            INTERCEPT.to_string()
        } else if col == self.age_column() {
            AGE_TERM.to_string()
        } else {
            self.dummies()
                .nth(col - 1)
                .map(|l| l.label().to_string())
                .unwrap_or_default()
        }
    }
}
