//! Presence tracker: online count and its announcements.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::broadcaster::Broadcaster;
use crate::message::types::Envelope;

/// Tracks how many users are online and announces every change.
///
/// The count is written by the registry while it holds its write lock, so
/// it always equals the registry size after the latest mutation. Reads are
/// advisory and may race with a concurrent change.
#[derive(Debug)]
pub struct PresenceTracker {
    /// Online user count
    online: AtomicUsize,
    /// Where online-count notices go
    broadcaster: Broadcaster,
}

impl PresenceTracker {
    /// Create a new presence tracker
    pub fn new(broadcaster: Broadcaster) -> Self {
        Self {
            online: AtomicUsize::new(0),
            broadcaster,
        }
    }

    /// Record a membership change and announce the new count to everyone.
    pub(crate) fn membership_changed(&self, count: usize) {
        self.online.store(count, Ordering::SeqCst);

        if !self.broadcaster.try_submit(Envelope::online_count(count)) {
            debug!(count, "Online count notice not queued");
        }
    }

    /// Reset the count without announcing it (shutdown).
    pub(crate) fn clear(&self) {
        self.online.store(0, Ordering::SeqCst);
    }

    /// Get online user count
    pub fn current_count(&self) -> usize {
        self.online.load(Ordering::SeqCst)
    }
}
