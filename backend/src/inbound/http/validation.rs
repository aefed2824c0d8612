//! Shared validation-error helpers for inbound HTTP adapters.

use serde_json::json;

use crate::domain::{Error, UserValidationError};

/// 400 for a required field absent from the request.
pub(crate) fn missing_field_error(field: &'static str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": "missing_field",
    }))
}

/// 400 carrying the reason a signup payload failed validation.
pub(crate) fn map_validation_error(err: &UserValidationError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({
        "code": validation_code(err),
    }))
}

fn validation_code(err: &UserValidationError) -> &'static str {
    match err {
        UserValidationError::MissingField { .. } => "missing_field",
        UserValidationError::InvalidFieldType { .. } => "invalid_field_type",
        UserValidationError::FirstNameLength { .. } => "first_name_length",
        UserValidationError::InvalidFirstName => "invalid_first_name",
        UserValidationError::InvalidLastName => "invalid_last_name",
        UserValidationError::InvalidEmail => "invalid_email",
        UserValidationError::PasswordTooShort { .. } => "password_too_short",
        UserValidationError::WeakPassword => "weak_password",
        UserValidationError::InvalidGender => "invalid_gender",
        UserValidationError::InvalidPhotoUrl => "invalid_photourl",
        UserValidationError::TooManySkills { .. } => "too_many_skills",
        UserValidationError::InvalidId => "invalid_id",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;

    #[test]
    fn missing_field_error_names_the_field() {
        let err = missing_field_error("email", "Email is required");
        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert_eq!(err.message, "Email is required");
        let details = err.details.as_ref().and_then(|d| d.as_object()).expect("details");
        assert_eq!(details.get("field").and_then(|v| v.as_str()), Some("email"));
    }

    #[test]
    fn validation_errors_carry_stable_codes() {
        let err = map_validation_error(&UserValidationError::WeakPassword);
        let details = err.details.as_ref().and_then(|d| d.as_object()).expect("details");
        assert_eq!(
            details.get("code").and_then(|v| v.as_str()),
            Some("weak_password")
        );
    }
}
