//! # forum-core
//!
//! Core crate for the forum chat hub. Contains the collaborator traits the
//! hub consumes (token validation, message persistence), configuration
//! schemas, typed identifiers, the chat message model, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other forum crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
