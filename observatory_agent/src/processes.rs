//! Top-process listing via the platform's own listing command.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MetricsError, Result};
use crate::types::ProcessInfo;

const LISTING_TIMEOUT: Duration = Duration::from_secs(2);

// pid, command (may contain spaces), %cpu, %mem
static ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s+(.+?)\s+(\d+(?:[.,]\d+)?)\s+(\d+(?:[.,]\d+)?)\s*$")
        .expect("process row pattern")
});

const WINDOWS_SCRIPT: &str = "$cs = Get-CimInstance Win32_ComputerSystem; \
'PID NAME CPU MEM'; \
Get-CimInstance Win32_PerfFormattedData_PerfProc_Process | \
Where-Object { $_.Name -ne '_Total' -and $_.Name -ne 'Idle' } | \
Sort-Object PercentProcessorTime -Descending | Select-Object -First 10 | \
ForEach-Object { '{0} {1} {2:F1} {3:F1}' -f $_.IDProcess, $_.Name, \
($_.PercentProcessorTime / $cs.NumberOfLogicalProcessors), \
($_.WorkingSetPrivate * 100 / $cs.TotalPhysicalMemory) }";

/// How top processes are listed on this host; picked once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessLister {
    Linux,
    Darwin,
    Windows,
    Unsupported(String),
    /// Arbitrary program whose output follows the shared row schema.
    Custom { program: String, args: Vec<String> },
}

impl ProcessLister {
    pub fn detect() -> Self {
        Self::for_os(std::env::consts::OS)
    }

    pub fn for_os(os: &str) -> Self {
        match os {
            "linux" => Self::Linux,
            "macos" => Self::Darwin,
            "windows" => Self::Windows,
            other => Self::Unsupported(other.to_string()),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }

    fn command(&self) -> Result<Command> {
        let (program, args): (&str, Vec<&str>) = match self {
            Self::Linux => ("ps", vec!["-eo", "pid,comm,%cpu,%mem", "--sort=-%cpu"]),
            Self::Darwin => ("ps", vec!["-Aceo", "pid,comm,%cpu,%mem", "-r"]),
            Self::Windows => (
                "powershell",
                vec!["-NoProfile", "-NonInteractive", "-Command", WINDOWS_SCRIPT],
            ),
            Self::Custom { program, args } => {
                (program.as_str(), args.iter().map(String::as_str).collect())
            }
            Self::Unsupported(os) => return Err(MetricsError::UnsupportedPlatform(os.clone())),
        };
        let mut cmd = Command::new(program);
        cmd.args(args).kill_on_drop(true);
        Ok(cmd)
    }

    /// Runs the listing command and parses at most `n` rows from it.
    pub async fn try_list_top(&self, n: usize) -> Result<Vec<ProcessInfo>> {
        let mut cmd = self.command()?;
        let output = tokio::time::timeout(LISTING_TIMEOUT, cmd.output())
            .await
            .map_err(|_| MetricsError::CommandFailed {
                status: format!("timeout after {LISTING_TIMEOUT:?}"),
            })??;
        if !output.status.success() {
            return Err(MetricsError::CommandFailed {
                status: output.status.to_string(),
            });
        }
        Ok(parse_listing(&String::from_utf8_lossy(&output.stdout), n))
    }

    /// Best-effort variant: any failure is logged and yields no rows.
    pub async fn list_top(&self, n: usize) -> Vec<ProcessInfo> {
        match self.try_list_top(n).await {
            Ok(rows) => rows,
            Err(e @ MetricsError::UnsupportedPlatform(_)) => {
                debug!("{e}");
                Vec::new()
            }
            Err(e) => {
                warn!("process listing failed: {e}");
                Vec::new()
            }
        }
    }
}

/// Drops the header line, keeps the first `n` entries in the command's own
/// order and parses them; rows that don't fit the schema are discarded.
pub fn parse_listing(stdout: &str, n: usize) -> Vec<ProcessInfo> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .skip(1)
        .take(n)
        .filter_map(parse_row)
        .collect()
}

fn parse_row(line: &str) -> Option<ProcessInfo> {
    let caps = ROW.captures(line)?;
    Some(ProcessInfo {
        pid: caps[1].to_string(),
        command: caps[2].to_string(),
        cpu_percent: format!("{}%", caps[3].replace(',', ".")),
        mem_percent: format!("{}%", caps[4].replace(',', ".")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINUX_PS: &str = "    PID COMMAND         %CPU %MEM
   2211 firefox         23.4  6.1
    911 Xorg             4.0  1.2
   4077 Web Content      2.5  3.3
      1 systemd          0.0  0.1
    512 kworker/u16:2-e  0.0  0.0
    777 sshd             0.0  0.1
";

    #[test]
    fn picks_os_family() {
        assert_eq!(ProcessLister::for_os("linux"), ProcessLister::Linux);
        assert_eq!(ProcessLister::for_os("macos"), ProcessLister::Darwin);
        assert_eq!(ProcessLister::for_os("windows"), ProcessLister::Windows);
        let other = ProcessLister::for_os("freebsd");
        assert_eq!(other, ProcessLister::Unsupported("freebsd".into()));
        assert!(!other.is_supported());
    }

    #[test]
    fn keeps_top_five_after_header() {
        let rows = parse_listing(LINUX_PS, 5);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].pid, "2211");
        assert_eq!(rows[0].command, "firefox");
        assert_eq!(rows[0].cpu_percent, "23.4%");
        assert_eq!(rows[0].mem_percent, "6.1%");
        assert_eq!(rows[4].command, "kworker/u16:2-e");
    }

    #[test]
    fn command_names_with_spaces_survive() {
        let rows = parse_listing(LINUX_PS, 5);
        assert_eq!(rows[2].command, "Web Content");
    }

    #[test]
    fn unparseable_rows_are_dropped_not_replaced() {
        let out = "PID NAME CPU MEM\nnot a row\n42 bash 1.0 0.5\n";
        let rows = parse_listing(out, 5);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pid, "42");
        // the bad line still used up one of the slots
        assert!(parse_listing(out, 1).is_empty());
    }

    #[test]
    fn decimal_commas_are_normalized() {
        let rows = parse_listing("PID NAME CPU MEM\n\r\n8 svchost 12,5 0,8\r\n", 5);
        assert_eq!(rows[0].cpu_percent, "12.5%");
        assert_eq!(rows[0].mem_percent, "0.8%");
    }

    #[test]
    fn header_only_output_is_empty() {
        assert!(parse_listing("PID COMMAND %CPU %MEM\n", 5).is_empty());
        assert!(parse_listing("", 5).is_empty());
    }

    #[tokio::test]
    async fn unsupported_platform_is_reported_then_swallowed() {
        let lister = ProcessLister::Unsupported("plan9".into());
        assert!(matches!(
            lister.try_list_top(5).await,
            Err(MetricsError::UnsupportedPlatform(_))
        ));
        assert!(lister.list_top(5).await.is_empty());
    }

    #[tokio::test]
    async fn missing_program_yields_empty_list() {
        let lister = ProcessLister::Custom {
            program: "observatory-no-such-program".into(),
            args: vec![],
        };
        assert!(matches!(lister.try_list_top(5).await, Err(MetricsError::Io(_))));
        assert!(lister.list_top(5).await.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_yields_empty_list() {
        let lister = ProcessLister::Custom {
            program: "sh".into(),
            args: vec!["-c".into(), "echo 'PID CMD CPU MEM'; echo '1 init 0.0 0.1'; exit 3".into()],
        };
        assert!(matches!(
            lister.try_list_top(5).await,
            Err(MetricsError::CommandFailed { .. })
        ));
        assert!(lister.list_top(5).await.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn custom_command_output_is_parsed() {
        let lister = ProcessLister::Custom {
            program: "sh".into(),
            args: vec!["-c".into(), "printf 'PID CMD CPU MEM\\n7 worker 3.5 1.0\\n'".into()],
        };
        let rows = lister.list_top(5).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].command, "worker");
    }
}
