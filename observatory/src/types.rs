//! Types that mirror the agent's snapshot JSON schema.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CoreUsage {
    pub core: usize,
    pub usage: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Memory {
    pub total: String,
    pub free: String,
    pub used: String,
    pub percentage: String,
}

impl Memory {
    pub fn percent(&self) -> f64 {
        self.percentage.parse::<f64>().unwrap_or(0.0).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Address {
    pub address: String,
    pub family: String,
    pub internal: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Interface {
    pub name: String,
    pub addresses: Vec<Address>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Process {
    pub pid: String,
    pub cmd: String,
    pub cpu: String,
    pub mem: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Snapshot {
    // absent from agents that predate the version field
    #[serde(default)]
    pub version: u32,
    pub timestamp: String,
    pub cpu: Vec<CoreUsage>,
    pub memory: Memory,
    pub network: Vec<Interface>,
    pub processes: Vec<Process>,
}

impl Snapshot {
    pub fn cpu_average(&self) -> f64 {
        if self.cpu.is_empty() {
            return 0.0;
        }
        self.cpu.iter().map(|c| c.usage).sum::<f64>() / self.cpu.len() as f64
    }
}
