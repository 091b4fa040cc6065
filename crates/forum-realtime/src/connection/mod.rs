//! Chat connections and their lifecycle.

pub mod admission;
pub mod handle;
pub mod liveness;
pub mod registry;
pub mod session;
pub mod sink;

pub use admission::Admission;
pub use handle::{ConnectionHandle, ConnectionId, ConnectionInfo, EnqueueError};
pub use liveness::LivenessMonitor;
pub use registry::ConnectionRegistry;
pub use session::{InboundFrame, SessionEnd};
pub use sink::FrameSink;
