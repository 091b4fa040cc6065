//! # forum-auth
//!
//! Bearer-token authentication for the forum chat hub.
//!
//! ## Modules
//!
//! - `jwt`: HS256 token decoding and minting
//! - `validator`: [`forum_core::traits::AuthValidator`] backed by JWTs and a user info cache

pub mod jwt;
pub mod validator;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use validator::JwtAuthValidator;
