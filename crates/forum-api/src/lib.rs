//! # forum-api
//!
//! HTTP layer for the forum chat hub built on Axum.
//!
//! Provides the WebSocket upgrade, presence and history endpoints,
//! health checks, middleware (CORS, logging), extractors, DTOs, and
//! error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
