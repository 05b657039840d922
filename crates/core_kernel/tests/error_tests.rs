//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::temporal::TemporalError;
use core_kernel::RuleId;

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("Invalid input");

    match error {
        CoreError::Validation(msg) => assert_eq!(msg, "Invalid input"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_not_found() {
    let error = CoreError::not_found("Rule set not found");

    match error {
        CoreError::NotFound(msg) => assert_eq!(msg, "Rule set not found"),
        _ => panic!("Expected NotFound error"),
    }
}

#[test]
fn test_core_error_from_temporal_error() {
    let temporal = TemporalError::InvalidTimezone("Mars/Olympus".to_string());
    let core_error: CoreError = temporal.into();

    assert!(matches!(core_error, CoreError::Temporal(_)));
    assert!(core_error.to_string().contains("Mars/Olympus"));
}

#[test]
fn test_core_error_from_identifier_parse_failure() {
    let parse_error = "RULE-xyz".parse::<RuleId>().unwrap_err();
    let core_error: CoreError = parse_error.into();

    assert!(matches!(core_error, CoreError::InvalidIdentifier(_)));
}

#[test]
fn test_core_error_display() {
    let error = CoreError::configuration("missing catalog path");
    let display = format!("{}", error);

    assert!(display.contains("Configuration error"));
}
