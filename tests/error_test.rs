//! Tests for error types

use sorteo::Error;

#[test]
fn test_invalid_weights_error() {
    let error = Error::InvalidWeights { sum: 90 };
    let error_str = format!("{error}");
    assert!(error_str.contains("must sum to exactly 100"));
    assert!(error_str.contains("90"));
}

#[test]
fn test_experiment_not_found_error() {
    let error = Error::ExperimentNotFound("exp-missing".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("experiment not found"));
    assert!(error_str.contains("exp-missing"));
}

#[test]
fn test_storage_error() {
    let error = Error::Storage("disk full".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("storage error"));
    assert!(error_str.contains("disk full"));
}

#[test]
fn test_serialization_error_from_serde() {
    let parse_failure = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
    let error = Error::from(parse_failure);
    assert!(format!("{error}").contains("serialization error"));
}

#[test]
fn test_telemetry_error() {
    let error = Error::Telemetry("backend unreachable".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("telemetry error"));
    assert!(error_str.contains("backend unreachable"));
}
