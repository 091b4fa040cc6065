//! # forum-database
//!
//! PostgreSQL connection management, migrations, and the message
//! repository backing [`forum_core::traits::MessagePersister`].

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::message::MessageRepository;
