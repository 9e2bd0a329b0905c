//! Tests for error construction and wire formatting.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn precondition_error() -> DomainError {
    DomainError::precondition("no user logged in")
}

#[rstest]
#[case(DomainError::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(DomainError::unauthorized("no auth"), ErrorCode::Unauthorized)]
#[case(DomainError::not_found("missing"), ErrorCode::NotFound)]
#[case(DomainError::precondition("nobody"), ErrorCode::Precondition)]
#[case(DomainError::backend("down"), ErrorCode::Backend)]
#[case(DomainError::configuration("placeholder"), ErrorCode::Configuration)]
#[case(DomainError::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_codes(#[case] err: DomainError, #[case] expected: ErrorCode) {
    assert_eq!(err.code(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = DomainError::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(
        result,
        Err(DomainErrorValidationError::EmptyMessage)
    ));
}

#[rstest]
#[case("Invalid login credentials", "Invalid login credentials")]
#[case("", "Login failed")]
#[case("   ", "Login failed")]
fn backend_or_prefers_backend_message(#[case] raw: &str, #[case] expected: &str) {
    let err = DomainError::backend_or(raw, "Login failed");
    assert_eq!(err.message(), expected);
    assert_eq!(err.code(), ErrorCode::Backend);
}

#[rstest]
fn display_renders_message_only(precondition_error: DomainError) {
    assert_eq!(precondition_error.to_string(), "no user logged in");
}

#[rstest]
fn serialises_with_snake_case_code(precondition_error: DomainError) {
    let value = serde_json::to_value(&precondition_error).expect("serialise error");
    assert_eq!(
        value,
        json!({ "code": "precondition", "message": "no user logged in" })
    );
}

#[rstest]
fn deserialisation_rejects_blank_messages() {
    let payload = json!({ "code": "backend", "message": "  " });
    let result = serde_json::from_value::<DomainError>(payload);
    assert!(result.is_err(), "blank messages must not deserialise");
}
