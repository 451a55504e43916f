//! Pure derivations from raw OS counters to the values carried in a snapshot.

use crate::types::{CoreUsage, MemoryInfo};

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Cumulative tick counters for one logical core, as found on a `/proc/stat`
/// `cpuN` line. Units are opaque ticks; only differences matter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    /// Ticks in which the core did no work (waiting on I/O counts as idle).
    pub fn idle_ticks(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    pub fn total_ticks(&self) -> u64 {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .iter()
        .fold(0u64, |acc, v| acc.saturating_add(*v))
    }
}

/// Utilization of one core between two readings, in `[0, 100]`.
///
/// Counters that went backwards (wraparound, hotplug) count as zero delta, and a
/// zero total delta reports 0% instead of dividing by zero.
pub fn core_usage(t0: &CpuTimes, t1: &CpuTimes) -> f64 {
    let idle = t1.idle_ticks().saturating_sub(t0.idle_ticks()) as f64;
    let total = t1.total_ticks().saturating_sub(t0.total_ticks()) as f64;
    if total <= 0.0 {
        return 0.0;
    }
    ((1.0 - idle / total) * 100.0).clamp(0.0, 100.0)
}

/// Pairs up two per-core readings into exactly `cores` entries.
///
/// Cores missing from either reading report 0%; readings with extra cores are
/// truncated to the count observed at startup.
pub fn usage_from_samples(t0: &[CpuTimes], t1: &[CpuTimes], cores: usize) -> Vec<CoreUsage> {
    (0..cores)
        .map(|i| {
            let usage = match (t0.get(i), t1.get(i)) {
                (Some(a), Some(b)) => core_usage(a, b),
                _ => 0.0,
            };
            CoreUsage {
                core_index: i,
                usage_percent: usage,
            }
        })
        .collect()
}

/// Renders a byte count with two decimals on the B/KB/MB/GB/TB ladder.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

pub fn derive_memory_info(total_bytes: u64, free_bytes: u64) -> MemoryInfo {
    let free_bytes = free_bytes.min(total_bytes);
    let used_bytes = total_bytes - free_bytes;
    let pct = if total_bytes > 0 {
        used_bytes as f64 / total_bytes as f64 * 100.0
    } else {
        0.0
    };
    let used_percent = (pct * 10.0).round() / 10.0;
    MemoryInfo {
        total_bytes,
        free_bytes,
        used_bytes,
        used_percent,
        total: format_bytes(total_bytes),
        free: format_bytes(free_bytes),
        used: format_bytes(used_bytes),
        percentage: format!("{used_percent:.1}"),
    }
}
