//! # forum-realtime
//!
//! Presence-aware chat hub for the forum. Provides:
//!
//! - A registry holding at most one live connection per user
//! - Per-connection outbound queues drained by writer tasks
//! - A single FIFO broadcaster fanning envelopes out to every connection
//! - Online-count announcements on every membership change
//! - Periodic liveness probing that evicts dead connections
//! - Persist-then-broadcast handling of inbound chat messages
//! - A scheduled retention sweep for old messages

pub mod broadcaster;
pub mod chat;
pub mod connection;
pub mod message;
pub mod metrics;
pub mod presence;
pub mod retention;
pub mod server;

pub use broadcaster::Broadcaster;
pub use chat::ChatService;
pub use connection::registry::ConnectionRegistry;
pub use connection::session::{InboundFrame, SessionEnd};
pub use connection::sink::FrameSink;
pub use presence::tracker::PresenceTracker;
pub use retention::RetentionSweeper;
pub use server::ChatHub;
