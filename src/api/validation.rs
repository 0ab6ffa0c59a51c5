use super::ApiError;

pub const MAX_USERNAME_LEN: usize = 64;

pub fn validate_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    if username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }

    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::validation(format!(
            "Username must be {} characters or less",
            MAX_USERNAME_LEN
        )));
    }

    Ok(username)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }
    Ok(password)
}

pub fn validate_title(title: &str) -> Result<&str, ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::validation("Title cannot be empty"));
    }
    Ok(title)
}

pub fn validate_price_range(min: Option<f64>, max: Option<f64>) -> Result<(), ApiError> {
    if let (Some(min), Some(max)) = (min, max)
        && min > max
    {
        return Err(ApiError::validation(format!(
            "min_price ({}) cannot exceed max_price ({})",
            min, max
        )));
    }
    Ok(())
}
