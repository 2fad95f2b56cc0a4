use crate::utils::{fixture_config, write_file};
use crtac1_analysis::{AnalysisError, analyze, build_unified_table, load_unified_table, run};

#[test]
fn test_exported_table_reloads_and_reanalyzes() -> crtac1_analysis::Result<()> {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = fixture_config();
    let (table, report) = run(&config)?;

    let path = dir.path().join("unified.csv");
    table.write_csv(&path)?;
    let reloaded = load_unified_table(&path)?;

    assert_eq!(reloaded.len(), table.len());
    for (a, b) in table.iter().zip(reloaded.iter()) {
        assert_eq!(a.sample_id, b.sample_id);
        assert_eq!(a.patient_condition, b.patient_condition);
        assert!((a.age - b.age).abs() < 1e-12);
        assert!((a.log10_crtac1_nm - b.log10_crtac1_nm).abs() < 1e-12);
    }

    let again = analyze(&reloaded, &config, Vec::new())?;
    let original = report.model.coefficient("COPD").unwrap().estimate;
    let reloaded_estimate = again.model.coefficient("COPD").unwrap().estimate;
    assert!((original - reloaded_estimate).abs() < 1e-9);
    assert!(again.sources.is_empty());
    Ok(())
}

#[test]
fn test_unknown_condition_label_is_schema_error() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = write_file(
        dir.path(),
        "unified.csv",
        "sample_id,patient_condition,age,log10_CRTAC1_nm\n\
         H01,healthy,40,1.1\n\
         X01,asthma,52,1.3\n",
    );
    let err = load_unified_table(&path).unwrap_err();
    assert!(matches!(err, AnalysisError::Schema(_)));
    assert!(err.to_string().contains("asthma"));
}

#[test]
fn test_duplicate_sample_ids_are_schema_errors() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = write_file(
        dir.path(),
        "unified.csv",
        "sample_id,patient_condition,age,log10_CRTAC1_nm\n\
         H01,healthy,40,1.1\n\
         H01,healthy,41,1.2\n",
    );
    assert!(matches!(
        load_unified_table(&path),
        Err(AnalysisError::Schema(_))
    ));
}

#[test]
fn test_json_report_contains_all_sections() -> crtac1_analysis::Result<()> {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let (_, report) = run(&fixture_config())?;

    let path = dir.path().join("report.json");
    report.write_json(&path)?;

    let content = std::fs::read_to_string(&path).expect("report was not written");
    let json: serde_json::Value = serde_json::from_str(&content).expect("invalid JSON");
    for key in [
        "generated_at",
        "total_samples",
        "sources",
        "group_summaries",
        "normal_range",
        "range_counts",
        "model",
        "marginal_means",
        "contrasts",
        "normality",
    ] {
        assert!(json.get(key).is_some(), "missing section {key}");
    }
    assert_eq!(json["total_samples"], 25);
    assert_eq!(json["sources"][1]["dropped_keys"][0], "LC99");
    Ok(())
}

#[test]
fn test_harmonizer_rejects_non_positive_concentration() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let mut config = fixture_config();
    config.sources.copd_measurements = write_file(
        dir.path(),
        "copd_crtac1.csv",
        "Patient_No,CRTAC1_ELISA_nM\n1,26.4\n2,0\n3,23.8\n",
    );
    let err = build_unified_table(&config).unwrap_err();
    assert!(matches!(err, AnalysisError::Domain(_)));
    assert!(err.to_string().contains("copd_2"));
}

#[test]
fn test_missing_columns_are_all_listed() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let mut config = fixture_config();
    config.sources.hospital = write_file(
        dir.path(),
        "hospital.csv",
        "sample_id,Age_less_than_90,CRTAC1_ELISA_nM\n1,54,21.3\n",
    );
    let err = build_unified_table(&config).unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, AnalysisError::Schema(_)));
    assert!(message.contains("COVID"));
    assert!(message.contains("ICU_1"));
}
