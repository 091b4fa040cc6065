//! Repository implementations.

pub mod message;
