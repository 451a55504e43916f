//! Builds one immutable snapshot per tick from the raw sources.

use std::time::Duration;

use chrono::Utc;
use tracing::warn;

use crate::derive::{derive_memory_info, usage_from_samples};
use crate::error::Result;
use crate::processes::ProcessLister;
use crate::source::MetricSource;
use crate::types::{CoreUsage, Snapshot, SNAPSHOT_SCHEMA_VERSION};

/// Gap between the two tick-counter reads used to compute CPU utilization.
pub const CPU_SAMPLE_WINDOW: Duration = Duration::from_millis(100);

pub struct SnapshotAssembler {
    source: Box<dyn MetricSource>,
    lister: ProcessLister,
    cores: usize,
    top_processes: usize,
    cpu_window: Duration,
}

impl SnapshotAssembler {
    /// `cores` is fixed for the lifetime of the assembler; every snapshot carries
    /// exactly that many CPU entries.
    pub fn new(
        source: Box<dyn MetricSource>,
        lister: ProcessLister,
        cores: usize,
        top_processes: usize,
    ) -> Self {
        Self {
            source,
            lister,
            cores,
            top_processes,
            cpu_window: CPU_SAMPLE_WINDOW,
        }
    }

    pub fn with_cpu_window(mut self, window: Duration) -> Self {
        self.cpu_window = window;
        self
    }

    pub fn cores(&self) -> usize {
        self.cores
    }

    /// Never fails: a category that can't be read comes back empty or zeroed.
    pub async fn assemble(&mut self) -> Snapshot {
        let captured_at = Utc::now();

        // The process listing runs while the CPU window elapses.
        let (cpu, processes) = tokio::join!(
            derive_cpu_usage(self.source.as_mut(), self.cores, self.cpu_window),
            self.lister.list_top(self.top_processes),
        );
        let cpu = cpu.unwrap_or_else(|e| {
            warn!("cpu sampling failed: {e}");
            zeroed_cores(self.cores)
        });

        let memory = match self.source.memory() {
            Ok((total, free)) => derive_memory_info(total, free),
            Err(e) => {
                warn!("memory read failed: {e}");
                derive_memory_info(0, 0)
            }
        };

        let network = self.source.interfaces().unwrap_or_else(|e| {
            warn!("interface read failed: {e}");
            Vec::new()
        });

        Snapshot {
            version: SNAPSHOT_SCHEMA_VERSION,
            captured_at,
            cpu,
            memory,
            network,
            processes,
        }
    }
}

/// Two counter reads `window` apart; suspends only the calling task in between.
pub async fn derive_cpu_usage(
    source: &mut dyn MetricSource,
    cores: usize,
    window: Duration,
) -> Result<Vec<CoreUsage>> {
    let t0 = source.cpu_times()?;
    tokio::time::sleep(window).await;
    let t1 = source.cpu_times()?;
    Ok(usage_from_samples(&t0, &t1, cores))
}

fn zeroed_cores(cores: usize) -> Vec<CoreUsage> {
    (0..cores)
        .map(|i| CoreUsage {
            core_index: i,
            usage_percent: 0.0,
        })
        .collect()
}
