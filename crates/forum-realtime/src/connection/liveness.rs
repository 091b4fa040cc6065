//! Periodic liveness probing of every registered connection.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::broadcaster::{FanOutReport, fan_out};
use crate::message::types::Envelope;
use crate::metrics::HubMetrics;

use super::registry::ConnectionRegistry;

/// Sends a ping envelope to every connection once per period.
///
/// A probe that cannot be queued evicts the connection immediately; a probe
/// whose transport write fails evicts it from the connection's writer. Either
/// way a peer that vanished without closing is reclaimed within one period.
#[derive(Debug, Clone)]
pub struct LivenessMonitor {
    /// Registry to probe.
    registry: Arc<ConnectionRegistry>,
    /// Metrics.
    metrics: Arc<HubMetrics>,
    /// Probe period.
    interval: Duration,
}

impl LivenessMonitor {
    /// Create a monitor with the given probe period, at least one millisecond.
    pub fn new(registry: Arc<ConnectionRegistry>, metrics: Arc<HubMetrics>, interval: Duration) -> Self {
        Self {
            registry,
            metrics,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// Probe every connection in one registry snapshot.
    pub async fn probe_once(&self) -> FanOutReport {
        let report = fan_out(&self.registry, &Envelope::ping(), &self.metrics).await;
        debug!(
            probed = report.delivered + report.evicted.len(),
            evicted = report.evicted.len(),
            "Liveness probe cycle complete"
        );
        report
    }

    /// Probe on every tick until shutdown. The first probe fires one period after start.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = self.interval.as_secs(), "Liveness monitor started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.probe_once().await;
                }
                _ = shutdown.changed() => break,
            }
        }

        info!("Liveness monitor stopped");
    }
}
