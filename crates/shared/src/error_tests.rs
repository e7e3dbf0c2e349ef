use super::*;
use rstest::rstest;

#[rstest]
#[case(ErrorKind::Validation, 65)]
#[case(ErrorKind::NotFound, 66)]
#[case(ErrorKind::NotImplemented, 69)]
#[case(ErrorKind::Internal, 70)]
#[case(ErrorKind::Cancelled, 75)]
fn test_error_kind_exit_codes(#[case] kind: ErrorKind, #[case] expected: u8) {
    assert_eq!(kind.exit_code(), expected);
}

#[test]
fn test_error_kind_error_codes() {
    assert_eq!(ErrorKind::Validation.error_code(), "VALIDATION_ERROR");
    assert_eq!(ErrorKind::NotFound.error_code(), "NOT_FOUND");
    assert_eq!(ErrorKind::Internal.error_code(), "INTERNAL_ERROR");
    assert_eq!(ErrorKind::NotImplemented.error_code(), "NOT_IMPLEMENTED");
    assert_eq!(ErrorKind::Cancelled.error_code(), "CANCELLED");
}

#[test]
fn test_error_kind_display_matches_code() {
    assert_eq!(ErrorKind::NotFound.to_string(), "NOT_FOUND");
}

#[test]
fn test_error_kind_serializes_as_code() {
    assert_eq!(
        serde_json::to_string(&ErrorKind::Validation).unwrap(),
        "\"VALIDATION\""
    );
}
