//! Convenience result type alias for the forum crates.

use crate::error::AppError;

/// A specialized `Result` type for forum operations.
pub type AppResult<T> = Result<T, AppError>;
