use crate::utils::{fixture, fixture_config};
use arrow::datatypes::DataType;
use crtac1_analysis::{AnalysisError, load_sources, read_csv};

#[test]
fn test_read_hospital_fixture() -> crtac1_analysis::Result<()> {
    let batch = read_csv(&fixture("hospital.csv"))?;
    assert_eq!(batch.num_rows(), 12);
    assert_eq!(batch.num_columns(), 5);

    let schema = batch.schema();
    assert_eq!(
        schema.field_with_name("COVID")?.data_type(),
        &DataType::Int64
    );
    assert_eq!(
        schema.field_with_name("CRTAC1_ELISA_nM")?.data_type(),
        &DataType::Float64
    );
    Ok(())
}

#[test]
fn test_text_columns_are_inferred_as_strings() -> crtac1_analysis::Result<()> {
    let batch = read_csv(&fixture("long_covid_metadata_copd.csv"))?;
    assert_eq!(batch.num_rows(), 4);
    assert_eq!(
        batch.schema().field_with_name("COPD")?.data_type(),
        &DataType::Utf8
    );
    Ok(())
}

#[test]
fn test_missing_file_reports_path() {
    let path = fixture("does_not_exist.csv");
    let err = read_csv(&path).unwrap_err();
    match err {
        AnalysisError::Io { path: Some(p), .. } => assert_eq!(p, path),
        other => panic!("expected an IO error with path, got {other:?}"),
    }
}

#[test]
fn test_inconsistent_columns_are_io_errors() {
    let path = fixture("malformed.csv");
    let err = read_csv(&path).unwrap_err();
    assert!(matches!(err, AnalysisError::Io { .. }));
    assert!(err.to_string().contains("malformed.csv"));
}

#[test]
fn test_invalid_utf8_is_io_error_with_path() {
    let path = fixture("invalid_utf8.csv");
    let err = read_csv(&path).unwrap_err();
    match err {
        AnalysisError::Io { path: Some(p), .. } => assert_eq!(p, path),
        other => panic!("expected an IO error with path, got {other:?}"),
    }
}

#[test]
fn test_load_all_sources() -> crtac1_analysis::Result<()> {
    let raw = load_sources(&fixture_config().sources)?;
    assert_eq!(raw.hospital.num_rows(), 12);
    assert_eq!(raw.long_covid_measurements.num_rows(), 11);
    assert_eq!(raw.long_covid_metadata_copd.num_rows(), 4);
    assert_eq!(raw.long_covid_metadata.num_rows(), 6);
    assert_eq!(raw.copd_measurements.num_rows(), 4);
    assert_eq!(raw.copd_ages.num_rows(), 4);
    Ok(())
}
