//! Top processes table, in the order the agent sent them.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Row, Table},
};

use crate::types::Snapshot;

const COLS: [Constraint; 4] = [
    Constraint::Length(8),  // PID
    Constraint::Min(12),    // Command
    Constraint::Length(8),  // CPU %
    Constraint::Length(8),  // Mem %
];

fn cpu_color(cpu: &str) -> Color {
    match cpu.trim_end_matches('%').parse::<f64>().unwrap_or(0.0) {
        x if x < 25.0 => Color::Green,
        x if x < 60.0 => Color::Yellow,
        _ => Color::Red,
    }
}

pub fn draw_top_processes(f: &mut ratatui::Frame<'_>, area: Rect, s: Option<&Snapshot>) {
    let block = Block::default().borders(Borders::ALL).title("Top Processes");
    let Some(ss) = s else {
        f.render_widget(block, area);
        return;
    };

    let header = Row::new(vec!["PID", "Command", "CPU", "MEM"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = ss
        .processes
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let zebra = if i % 2 == 0 {
                Style::default()
            } else {
                Style::default().bg(Color::Rgb(30, 30, 36))
            };
            Row::new(vec![
                Span::raw(p.pid.clone()),
                Span::raw(p.cmd.clone()),
                Span::styled(p.cpu.clone(), Style::default().fg(cpu_color(&p.cpu))),
                Span::raw(p.mem.clone()),
            ])
            .style(zebra)
        })
        .collect();

    let table = Table::new(rows, COLS).header(header).block(block);
    f.render_widget(table, area);
}
