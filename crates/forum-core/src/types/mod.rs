//! Core type definitions used across the forum workspace.

pub mod id;
pub mod message;

pub use id::*;
pub use message::{ChatMessage, UserInfo};
