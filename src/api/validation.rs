//! Lightweight request-body validation. Failures map to 422.

use super::ApiError;

/// Minimal structural email check: one '@' with a non-empty local part
/// and a dotted domain. Deliverability is not our problem.
pub fn validate_email(email: &str) -> Result<(), ApiError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ApiError::validation("Malformed email address"));
    };

    if local.is_empty()
        || domain.is_empty()
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.contains(char::is_whitespace)
    {
        return Err(ApiError::validation("Malformed email address"));
    }

    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.len() < 3 || username.len() > 50 {
        return Err(ApiError::validation(
            "Username must be between 3 and 50 characters",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}
