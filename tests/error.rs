use std::path::PathBuf;

use tabboard::error::{exit_codes, Error, JsonError};

#[test]
fn exit_code_user_error() {
    let err = Error::InvalidArgument("bad input".to_string());
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    assert_eq!(err.kind(), "user_error");
}

#[test]
fn exit_code_invalid_config() {
    let err = Error::InvalidConfig("bad config".to_string());
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
}

#[test]
fn exit_code_operation_failed() {
    let err = Error::Storage("boom".to_string());
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
    assert_eq!(err.kind(), "operation_failed");

    let err = Error::LockFailed(PathBuf::from("storage.json.lock"));
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn io_errors_convert() {
    let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn json_error_carries_code_and_kind() {
    let err = Error::InvalidArgument("text cannot be empty".to_string());
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    assert_eq!(json.kind, "user_error");
    assert_eq!(json.message, "Invalid argument: text cannot be empty");
}
