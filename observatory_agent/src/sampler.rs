//! Fixed-period scheduler: assemble a snapshot, then fan it out.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::debug;

use crate::assembler::SnapshotAssembler;
use crate::registry::SessionRegistry;

/// First tick fires one `period` after start. A cycle that overruns its period
/// makes the scheduler skip the missed ticks rather than queue them.
pub fn spawn_sampler(
    assembler: SnapshotAssembler,
    registry: Arc<SessionRegistry>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(run_sampler(assembler, registry, period))
}

pub async fn run_sampler(
    mut assembler: SnapshotAssembler,
    registry: Arc<SessionRegistry>,
    period: Duration,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let snapshot = Arc::new(assembler.assemble().await);
        let report = registry.broadcast(snapshot);
        debug!(
            delivered = report.delivered,
            skipped = report.skipped,
            "snapshot broadcast"
        );
    }
}
