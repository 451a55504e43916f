//! Memory gauge.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Gauge},
};

use crate::types::Snapshot;

pub fn draw_mem(f: &mut ratatui::Frame<'_>, area: Rect, s: Option<&Snapshot>) {
    let (label, pct) = match s {
        Some(ss) => (
            format!(
                "{} / {} ({}%), {} free",
                ss.memory.used, ss.memory.total, ss.memory.percentage, ss.memory.free
            ),
            ss.memory.percent().round() as u16,
        ),
        None => ("—".into(), 0),
    };

    let g = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Memory"))
        .gauge_style(Style::default().fg(Color::Magenta))
        .percent(pct.min(100))
        .label(label);
    f.render_widget(g, area);
}
