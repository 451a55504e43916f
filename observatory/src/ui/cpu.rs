//! CPU average sparkline + per-core mini bars.

use std::collections::VecDeque;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline},
};

use crate::history::PerCoreHistory;
use crate::types::Snapshot;

pub fn load_color(pct: f64) -> Color {
    match pct {
        x if x < 25.0 => Color::Green,
        x if x < 60.0 => Color::Yellow,
        _ => Color::Red,
    }
}

pub fn draw_cpu_avg_graph(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    hist: &VecDeque<u64>,
    s: Option<&Snapshot>,
) {
    let title = match s {
        Some(ss) => format!("CPU avg (now: {:>5.1}%)", ss.cpu_average()),
        None => "CPU avg".into(),
    };
    let max_points = area.width.saturating_sub(2) as usize;
    let start = hist.len().saturating_sub(max_points);
    let data: Vec<u64> = hist.iter().skip(start).cloned().collect();
    let spark = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .data(&data)
        .max(100)
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(spark, area);
}

pub fn draw_per_core_bars(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    s: Option<&Snapshot>,
    per_core_hist: &PerCoreHistory,
) {
    f.render_widget(Block::default().borders(Borders::ALL).title("Per-core"), area);
    let Some(ss) = s else { return };

    let inner = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    if inner.height == 0 {
        return;
    }

    // Cores past the visible rows are not drawn.
    let show_n = (inner.height as usize).min(ss.cpu.len());
    let constraints: Vec<Constraint> = (0..show_n).map(|_| Constraint::Length(1)).collect();
    let vchunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (i, core) in ss.cpu.iter().take(show_n).enumerate() {
        let hchunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(6), Constraint::Length(11)])
            .split(vchunks[i]);

        let curr = core.usage.clamp(0.0, 100.0);
        let fg = load_color(curr);

        let hist: Vec<u64> = per_core_hist
            .deques
            .get(i)
            .map(|d| {
                let start = d.len().saturating_sub(hchunks[0].width as usize);
                d.iter().skip(start).copied().collect()
            })
            .unwrap_or_default();
        let spark = Sparkline::default()
            .data(&hist)
            .max(100)
            .style(Style::default().fg(fg));
        f.render_widget(spark, hchunks[0]);

        let label = format!("cpu{:<3}{:>5.1}%", core.core, curr);
        let line = Line::from(Span::styled(
            label,
            Style::default().fg(fg).add_modifier(Modifier::BOLD),
        ));
        f.render_widget(Paragraph::new(line).right_aligned(), hchunks[1]);
    }
}
