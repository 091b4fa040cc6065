//! Route handlers organized by domain.

pub mod chat;
pub mod health;
pub mod ws;
