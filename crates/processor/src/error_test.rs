//! Tests for processor error types

use super::*;

#[test]
fn test_error_creation() {
    let err = ProcessError::failed("bad record");
    assert!(matches!(err, ProcessError::Failed(_)));

    let err = ProcessError::fatal("state corrupted");
    assert!(matches!(err, ProcessError::Fatal(_)));

    let err = ProcessError::config("missing field");
    assert!(matches!(err, ProcessError::Config(_)));
}

#[test]
fn test_error_display() {
    let err = ProcessError::failed("logic error");
    assert_eq!(err.to_string(), "processing failed: logic error");

    let err = ProcessError::fatal("state corrupted");
    assert_eq!(err.to_string(), "fatal processing error: state corrupted");

    let err = ProcessError::config("invalid window");
    assert_eq!(err.to_string(), "invalid configuration: invalid window");
}

#[test]
fn test_only_fatal_is_fatal() {
    assert!(ProcessError::fatal("x").is_fatal());
    assert!(!ProcessError::failed("x").is_fatal());
    assert!(!ProcessError::config("x").is_fatal());
}

#[test]
fn test_from_protocol_error() {
    let err: ProcessError =
        ProtocolError::invalid_setting("aggregate", "max_events", "a non-negative integer").into();
    assert!(matches!(err, ProcessError::Setting(_)));
    assert!(err.to_string().contains("max_events"));
}
