use crate::utils::{count_condition, fixture_config};
use crtac1_analysis::config::ContrastConfig;
use crtac1_analysis::models::PatientCondition;
use crtac1_analysis::{AnalysisError, build_unified_table, harmonize_all, load_sources, run};

#[test]
fn test_unified_row_count_is_sum_of_sources() -> crtac1_analysis::Result<()> {
    let config = fixture_config();
    let raw = load_sources(&config.sources)?;
    let harmonized = harmonize_all(&raw, &config)?;

    let rows: Vec<usize> = harmonized.iter().map(|t| t.len()).collect();
    // 12 hospital rows, 10 long COVID rows with metadata, 3 COPD rows with ages
    assert_eq!(rows, vec![12, 10, 3]);

    let table = crtac1_analysis::unify(&harmonized)?;
    assert_eq!(table.len(), 25);
    Ok(())
}

#[test]
fn test_dropped_join_keys_are_reported() -> crtac1_analysis::Result<()> {
    let (_, sources) = build_unified_table(&fixture_config())?;
    assert!(sources[0].dropped_keys.is_empty());
    assert_eq!(sources[1].dropped_keys, vec!["LC99".to_string()]);
    assert_eq!(sources[2].dropped_keys, vec!["4".to_string()]);
    Ok(())
}

#[test]
fn test_conditions_per_cohort() -> crtac1_analysis::Result<()> {
    let (table, _) = build_unified_table(&fixture_config())?;

    for condition in PatientCondition::LEVELS {
        let expected = if condition == PatientCondition::Healthy { 4 } else { 3 };
        assert_eq!(count_condition(&table, condition), expected, "{condition}");
    }

    let find = |id: &str| table.iter().find(|r| r.sample_id == id).unwrap();
    assert_eq!(
        find("hospital_10").patient_condition,
        PatientCondition::HospitalCovidIcu
    );
    assert_eq!(
        find("hospital_4").patient_condition,
        PatientCondition::HospitalNoCovidIcu
    );
    assert_eq!(find("LC04").patient_condition, PatientCondition::LongCovidCopd);
    assert_eq!(find("LC01").patient_condition, PatientCondition::LongCovid);
    assert_eq!(find("H03").patient_condition, PatientCondition::Healthy);
    assert_eq!(find("copd_1").age, 67.0);
    assert!((find("hospital_1").log10_crtac1_nm - 21.3_f64.log10()).abs() < 1e-12);
    Ok(())
}

#[test]
fn test_unified_order_is_hospital_long_covid_copd() -> crtac1_analysis::Result<()> {
    let (table, _) = build_unified_table(&fixture_config())?;
    let ids: Vec<&str> = table.iter().map(|r| r.sample_id.as_str()).collect();
    assert_eq!(ids[0], "hospital_1");
    assert_eq!(ids[11], "hospital_12");
    // Metadata with the COPD flag is stacked first
    assert_eq!(&ids[12..16], &["LC01", "LC04", "LC05", "LC06"]);
    assert_eq!(&ids[16..22], &["H01", "H02", "H03", "H04", "LC02", "LC03"]);
    assert_eq!(&ids[22..], &["copd_1", "copd_2", "copd_3"]);
    Ok(())
}

#[test]
fn test_full_run_report() -> crtac1_analysis::Result<()> {
    let (table, report) = run(&fixture_config())?;
    assert_eq!(report.total_samples, table.len());
    assert_eq!(report.group_summaries.len(), 8);
    assert_eq!(report.normality.len(), 8);
    assert_eq!(report.marginal_means.len(), 8);
    assert_eq!(report.dropped_keys(), vec!["long COVID: LC99", "COPD: 4"]);

    // Nine parameters: intercept, seven dummies, age
    assert_eq!(report.model.terms.len(), 9);
    assert_eq!(report.model.df_residual, 16);

    let range = &report.normal_range;
    assert_eq!(range.n, 4);
    assert!(range.low < range.mean && range.mean < range.high);
    let counted: usize = report
        .range_counts
        .iter()
        .map(|c| c.below + c.within + c.above)
        .sum();
    assert_eq!(counted, 25);

    let summaries = &report.group_summaries;
    assert!(
        summaries
            .windows(2)
            .all(|w| w[0].mean_log10_crtac1 >= w[1].mean_log10_crtac1)
    );
    Ok(())
}

#[test]
fn test_reference_contrasts_match_coefficients() -> crtac1_analysis::Result<()> {
    let (_, report) = run(&fixture_config())?;
    assert_eq!(report.contrasts.len(), 3);

    let copd = report.model.coefficient("COPD").unwrap();
    let contrast = &report.contrasts[0];
    assert_eq!(contrast.name, "COPD - healthy");
    assert_eq!(contrast.estimate, copd.estimate);
    for c in &report.contrasts {
        assert!(c.p_adjusted >= c.p_value);
    }
    Ok(())
}

#[test]
fn test_strict_joins_turn_drops_into_errors() {
    let config = crtac1_analysis::AnalysisConfig {
        strict_joins: true,
        ..fixture_config()
    };
    let err = run(&config).unwrap_err();
    assert!(matches!(err, AnalysisError::Schema(_)));
    assert!(err.to_string().contains("LC99"));
}

#[test]
fn test_custom_contrast_family() -> crtac1_analysis::Result<()> {
    let config = crtac1_analysis::AnalysisConfig {
        contrasts: vec![ContrastConfig::difference(
            PatientCondition::HospitalCovidIcu,
            PatientCondition::HospitalNoCovidNoIcu,
        )],
        ..fixture_config()
    };
    let (_, report) = run(&config)?;
    assert_eq!(report.contrasts.len(), 1);
    // A single contrast is not adjusted
    assert_eq!(report.contrasts[0].p_adjusted, report.contrasts[0].p_value);
    Ok(())
}
