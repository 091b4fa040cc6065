//! Message validation rules.

use forum_core::error::AppError;

/// Validates chat text and returns it trimmed.
pub fn validate_chat_text(text: &str, max_bytes: usize) -> Result<&str, AppError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(AppError::validation("Empty message"));
    }

    if trimmed.len() > max_bytes {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {max_bytes} bytes"
        )));
    }

    Ok(trimmed)
}
