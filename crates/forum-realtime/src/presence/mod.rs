//! Online presence derived from the connection registry.

pub mod tracker;

pub use tracker::PresenceTracker;
