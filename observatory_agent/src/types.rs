//! Snapshot schema pushed to viewers over WebSocket.
//! Keep this module minimal and stable: it defines the wire format.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Bumped whenever a field is renamed, removed or changes type.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CoreUsage {
    #[serde(rename = "core")]
    pub core_index: usize,
    // 0..=100
    #[serde(rename = "usage")]
    pub usage_percent: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct MemoryInfo {
    #[serde(skip)]
    pub total_bytes: u64,
    #[serde(skip)]
    pub free_bytes: u64,
    #[serde(skip)]
    pub used_bytes: u64,
    #[serde(skip)]
    pub used_percent: f64,
    pub total: String,
    pub free: String,
    pub used: String,
    // one decimal place, no unit: "75.0"
    pub percentage: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct InterfaceAddress {
    pub address: String,
    pub family: String,
    #[serde(rename = "internal")]
    pub is_internal: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct InterfaceInfo {
    pub name: String,
    pub addresses: Vec<InterfaceAddress>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProcessInfo {
    pub pid: String,
    #[serde(rename = "cmd")]
    pub command: String,
    // trailing '%', e.g. "12.5%"
    #[serde(rename = "cpu")]
    pub cpu_percent: String,
    #[serde(rename = "mem")]
    pub mem_percent: String,
}

/// One tick's worth of metrics. Shared read-only (behind an `Arc`) by every
/// session receiving that tick.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Snapshot {
    pub version: u32,
    #[serde(rename = "timestamp", serialize_with = "iso8601_millis")]
    pub captured_at: DateTime<Utc>,
    pub cpu: Vec<CoreUsage>,
    pub memory: MemoryInfo,
    pub network: Vec<InterfaceInfo>,
    pub processes: Vec<ProcessInfo>,
}

impl Snapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn iso8601_millis<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
