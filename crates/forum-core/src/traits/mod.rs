//! Collaborator traits the hub consumes and other crates implement.

pub mod auth;
pub mod history;
pub mod persister;

pub use auth::AuthValidator;
pub use history::MessageHistory;
pub use persister::MessagePersister;
