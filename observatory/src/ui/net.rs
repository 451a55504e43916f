//! Network interface inventory.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::types::Snapshot;

pub fn draw_net(f: &mut ratatui::Frame<'_>, area: Rect, s: Option<&Snapshot>) {
    let block = Block::default().borders(Borders::ALL).title("Interfaces");
    let Some(ss) = s else {
        f.render_widget(block, area);
        return;
    };

    let lines: Vec<Line> = ss
        .network
        .iter()
        .flat_map(|iface| {
            iface.addresses.iter().map(move |a| {
                let style = if a.internal {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!("{:<12}", iface.name), style.fg(Color::Cyan)),
                    Span::styled(format!("{:<5} ", a.family), style),
                    Span::styled(a.address.clone(), style),
                ])
            })
        })
        .collect();
    f.render_widget(Paragraph::new(lines).block(block), area);
}
