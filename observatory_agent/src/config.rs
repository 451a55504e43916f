//! Agent settings from argv and `OBSERVATORY_*` environment variables.
//! Flags win over the environment; unparseable values fall back to defaults.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);
pub const DEFAULT_TOP_PROCESSES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub period: Duration,
    pub top_processes: usize,
    pub enable_ssl: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            period: DEFAULT_PERIOD,
            top_processes: DEFAULT_TOP_PROCESSES,
            enable_ssl: false,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Cli {
    Run(AgentConfig),
    Help(String),
}

pub fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [--port PORT|-p PORT] [--bind ADDR] [--interval-ms MS] [--top N] [--enableSSL]"
    )
}

/// Reads settings from the process arguments and environment.
pub fn from_env_and_args() -> Result<Cli, String> {
    parse(std::env::args(), |k| std::env::var(k).ok())
}

pub fn parse<I, E>(args: I, env: E) -> Result<Cli, String>
where
    I: IntoIterator<Item = String>,
    E: Fn(&str) -> Option<String>,
{
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "observatory_agent".into());

    let mut port = env("OBSERVATORY_PORT");
    let mut bind = env("OBSERVATORY_BIND");
    let mut interval = env("OBSERVATORY_INTERVAL_MS");
    let mut top = env("OBSERVATORY_TOP_PROCESSES");
    let mut enable_ssl = env("OBSERVATORY_ENABLE_SSL")
        .map(|v| v != "0" && !v.is_empty())
        .unwrap_or(false);

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Cli::Help(usage(&prog))),
            "--port" | "-p" => port = it.next(),
            "--bind" => bind = it.next(),
            "--interval-ms" => interval = it.next(),
            "--top" => top = it.next(),
            "--enableSSL" | "--enable-ssl" => enable_ssl = true,
            _ => match arg.split_once('=') {
                Some(("--port", v)) => port = Some(v.to_string()),
                Some(("--bind", v)) => bind = Some(v.to_string()),
                Some(("--interval-ms", v)) => interval = Some(v.to_string()),
                Some(("--top", v)) => top = Some(v.to_string()),
                _ => return Err(format!("unexpected argument '{arg}'\n{}", usage(&prog))),
            },
        }
    }

    let defaults = AgentConfig::default();
    Ok(Cli::Run(AgentConfig {
        bind: bind.and_then(|s| s.parse().ok()).unwrap_or(defaults.bind),
        port: port.and_then(|s| s.parse().ok()).unwrap_or(defaults.port),
        period: interval
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.period),
        top_processes: top
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.top_processes),
        enable_ssl,
    }))
}
