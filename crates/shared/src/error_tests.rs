use rstest::rstest;

use crate::AppError;

#[rstest]
#[case(AppError::Unauthorized("x".into()), 401, "UNAUTHORIZED")]
#[case(AppError::Forbidden("x".into()), 403, "FORBIDDEN")]
#[case(AppError::NotFound("x".into()), 404, "NOT_FOUND")]
#[case(AppError::Validation("x".into()), 400, "VALIDATION_ERROR")]
#[case(AppError::BusinessRule("x".into()), 422, "BUSINESS_RULE_VIOLATION")]
#[case(AppError::Conflict("x".into()), 409, "CONFLICT")]
#[case(AppError::TooManyRequests { retry_after_secs: 30 }, 429, "TOO_MANY_REQUESTS")]
#[case(AppError::Database("x".into()), 500, "DATABASE_ERROR")]
#[case(AppError::ExternalService("x".into()), 502, "EXTERNAL_SERVICE_ERROR")]
#[case(AppError::Unavailable("x".into()), 503, "SERVICE_UNAVAILABLE")]
#[case(AppError::Internal("x".into()), 500, "INTERNAL_ERROR")]
fn test_status_and_code(#[case] error: AppError, #[case] status: u16, #[case] code: &str) {
    assert_eq!(error.status_code(), status);
    assert_eq!(error.error_code(), code);
}

#[test]
fn test_error_display() {
    assert_eq!(
        AppError::Unauthorized("msg".into()).to_string(),
        "Authentication failed: msg"
    );
    assert_eq!(
        AppError::Conflict("msg".into()).to_string(),
        "Conflict: msg"
    );
    assert_eq!(
        AppError::TooManyRequests {
            retry_after_secs: 12
        }
        .to_string(),
        "Too many requests: retry after 12s"
    );
}

#[test]
fn test_internal_errors_are_hidden() {
    assert!(AppError::Database("connection refused".into()).is_internal());
    assert!(AppError::Internal("boom".into()).is_internal());
    assert!(!AppError::Conflict("duplicate".into()).is_internal());
    assert!(!AppError::ExternalService("crm down".into()).is_internal());
}
