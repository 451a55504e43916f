//! Live host metrics: sample CPU, memory, interfaces and top processes on a fixed
//! period and push each snapshot to every connected WebSocket viewer.

pub mod assembler;
pub mod config;
pub mod derive;
pub mod error;
pub mod processes;
pub mod registry;
pub mod sampler;
pub mod server;
pub mod session;
pub mod source;
pub mod tls;
pub mod types;
