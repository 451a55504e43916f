//! Raw metric sources: per-core tick counters, memory totals and the interface table.

use std::net::IpAddr;

#[cfg(not(target_os = "linux"))]
use std::time::Instant;

use sysinfo::{CpuRefreshKind, MemoryRefreshKind, Networks, RefreshKind, System};

use crate::derive::CpuTimes;
use crate::error::{MetricsError, Result};
use crate::types::{InterfaceAddress, InterfaceInfo};

/// Black-box access to the OS counters a snapshot is derived from.
pub trait MetricSource: Send {
    /// Cumulative tick counters, one entry per logical core.
    fn cpu_times(&mut self) -> Result<Vec<CpuTimes>>;

    /// `(total_bytes, free_bytes)`.
    fn memory(&mut self) -> Result<(u64, u64)>;

    fn interfaces(&mut self) -> Result<Vec<InterfaceInfo>>;
}

/// The local host, read through `/proc/stat` (Linux) and sysinfo.
pub struct HostSource {
    sys: System,
    networks: Networks,
    // sysinfo only reports usage ratios off Linux; integrate them into counters
    #[cfg(not(target_os = "linux"))]
    ticks: Vec<CpuTimes>,
    #[cfg(not(target_os = "linux"))]
    last_read: Instant,
}

impl HostSource {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything());
        let sys = System::new_with_specifics(refresh_kind);
        let networks = Networks::new_with_refreshed_list();
        Self {
            #[cfg(not(target_os = "linux"))]
            ticks: vec![CpuTimes::default(); sys.cpus().len()],
            #[cfg(not(target_os = "linux"))]
            last_read: Instant::now(),
            sys,
            networks,
        }
    }

    /// Logical core count as seen at construction time.
    pub fn logical_cores(&self) -> usize {
        self.sys.cpus().len()
    }
}

impl Default for HostSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSource for HostSource {
    #[cfg(target_os = "linux")]
    fn cpu_times(&mut self) -> Result<Vec<CpuTimes>> {
        let stat = std::fs::read_to_string("/proc/stat")?;
        parse_proc_stat(&stat)
    }

    #[cfg(not(target_os = "linux"))]
    fn cpu_times(&mut self) -> Result<Vec<CpuTimes>> {
        self.sys.refresh_cpu_usage();
        let now = Instant::now();
        // Milliseconds are the tick unit here.
        let elapsed = now.duration_since(self.last_read).as_millis() as u64;
        self.last_read = now;
        let cpus = self.sys.cpus();
        self.ticks.resize(cpus.len(), CpuTimes::default());
        for (acc, cpu) in self.ticks.iter_mut().zip(cpus) {
            let busy = (cpu.cpu_usage().clamp(0.0, 100.0) as f64 / 100.0 * elapsed as f64) as u64;
            acc.user = acc.user.saturating_add(busy);
            acc.idle = acc.idle.saturating_add(elapsed.saturating_sub(busy));
        }
        Ok(self.ticks.clone())
    }

    fn memory(&mut self) -> Result<(u64, u64)> {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            return Err(MetricsError::Parse("memory totals unavailable".into()));
        }
        Ok((total, self.sys.available_memory()))
    }

    fn interfaces(&mut self) -> Result<Vec<InterfaceInfo>> {
        self.networks.refresh(true);
        let mut out: Vec<InterfaceInfo> = self
            .networks
            .iter()
            .map(|(name, data)| interface_info(name, data.ip_networks().iter().map(|n| n.addr)))
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}

/// Per-core lines of `/proc/stat` (`cpu0`, `cpu1`, ...); the aggregate `cpu` line is skipped.
pub fn parse_proc_stat(stat: &str) -> Result<Vec<CpuTimes>> {
    let mut cores = Vec::new();
    for line in stat.lines() {
        let mut it = line.split_whitespace();
        let Some(label) = it.next() else { continue };
        let is_core = label
            .strip_prefix("cpu")
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
        if !is_core {
            continue;
        }
        let mut fields = [0u64; 8];
        for (slot, tok) in fields.iter_mut().zip(it) {
            *slot = tok
                .parse()
                .map_err(|_| MetricsError::Parse(format!("bad tick count '{tok}' on {label}")))?;
        }
        let [user, nice, system, idle, iowait, irq, softirq, steal] = fields;
        cores.push(CpuTimes {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
        });
    }
    if cores.is_empty() {
        return Err(MetricsError::Parse("no per-core lines in /proc/stat".into()));
    }
    Ok(cores)
}

pub fn interface_info(name: &str, addrs: impl IntoIterator<Item = IpAddr>) -> InterfaceInfo {
    InterfaceInfo {
        name: name.to_string(),
        addresses: addrs
            .into_iter()
            .map(|addr| InterfaceAddress {
                address: addr.to_string(),
                family: if addr.is_ipv4() { "IPv4" } else { "IPv6" }.to_string(),
                is_internal: addr.is_loopback(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    const STAT: &str = "cpu  10132153 290696 3084719 46828483 16683 0 25195 0 175628 0
cpu0 1393280 32966 572056 13343292 6130 0 17875 0 23933 0
cpu1 1335808 29498 437340 13387896 3710 0 1120 0 39315 0
intr 1462898 0 0 0
ctxt 2738947
btime 1769000000
processes 26442
";

    #[test]
    fn parses_per_core_lines_only() {
        let cores = parse_proc_stat(STAT).unwrap();
        assert_eq!(cores.len(), 2);
        assert_eq!(cores[0].user, 1393280);
        assert_eq!(cores[0].idle, 13343292);
        assert_eq!(cores[0].softirq, 17875);
        assert_eq!(cores[1].iowait, 3710);
    }

    #[test]
    fn short_lines_leave_missing_categories_zero() {
        let cores = parse_proc_stat("cpu0 1 2 3 4\n").unwrap();
        assert_eq!(cores[0].idle, 4);
        assert_eq!(cores[0].steal, 0);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            parse_proc_stat("cpu0 1 x 3 4\n"),
            Err(MetricsError::Parse(_))
        ));
        assert!(matches!(parse_proc_stat("intr 1\n"), Err(MetricsError::Parse(_))));
    }

    #[test]
    fn interface_addresses_mirror_family_and_loopback() {
        let info = interface_info(
            "lo",
            [IpAddr::V4(Ipv4Addr::LOCALHOST), IpAddr::V6(Ipv6Addr::LOCALHOST)],
        );
        assert_eq!(info.name, "lo");
        assert_eq!(info.addresses[0].address, "127.0.0.1");
        assert_eq!(info.addresses[0].family, "IPv4");
        assert!(info.addresses[0].is_internal);
        assert_eq!(info.addresses[1].address, "::1");
        assert_eq!(info.addresses[1].family, "IPv6");

        let eth = interface_info("eth0", [IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20))]);
        assert!(!eth.addresses[0].is_internal);
    }

    #[test]
    fn host_source_reads_something() {
        let mut host = HostSource::new();
        assert!(host.logical_cores() > 0);
        let (total, free) = host.memory().unwrap();
        assert!(total >= free);
        assert!(host.interfaces().is_ok());
    }
}
