//! Wire envelopes, serialization, and inbound validation.

pub mod serializer;
pub mod types;
pub mod validator;

pub use types::{ClientMessage, ControlMessage, Envelope, Frame};
