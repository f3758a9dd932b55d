use super::ApiError;

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    if !trimmed.contains('@') || trimmed.len() > 254 {
        return Err(ApiError::validation("Invalid email address"));
    }

    Ok(trimmed)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.len() < crate::constants::limits::MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            crate::constants::limits::MIN_PASSWORD_LENGTH
        )));
    }
    Ok(password)
}

pub fn validate_search_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid search ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}
