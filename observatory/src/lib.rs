//! Terminal viewer for an observatory agent: receives pushed snapshots and renders them.

pub mod app;
pub mod history;
pub mod types;
pub mod ui;
pub mod ws;
