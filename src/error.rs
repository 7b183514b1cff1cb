use thiserror::Error;

/// Application-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Reject a required text field that is missing or blank.
pub fn require_text(value: Option<&str>, message: &str) -> Result<String, AppError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::BadRequest(message.to_string())),
    }
}

/// Trim an optional update field, rejecting it if present but blank.
pub fn optional_text(value: Option<String>, message: &str) -> Result<Option<String>, AppError> {
    match value {
        None => Ok(None),
        Some(v) => require_text(Some(&v), message).map(Some),
    }
}
