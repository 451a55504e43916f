//! Top header with connection state and sample time.

use crate::types::Snapshot;
use ratatui::{
    layout::Rect,
    widgets::{Block, Borders},
};

pub fn draw_header(f: &mut ratatui::Frame<'_>, area: Rect, s: Option<&Snapshot>, connected: bool) {
    let title = match (s, connected) {
        (Some(ss), true) => format!(
            "observatory — sample {} (schema v{})  (press 'q' to quit)",
            ss.timestamp, ss.version
        ),
        (Some(ss), false) => format!(
            "observatory — disconnected, last sample {}  (press 'q' to quit)",
            ss.timestamp
        ),
        (None, true) => "observatory — waiting for first sample... (press 'q' to quit)".into(),
        (None, false) => "observatory — disconnected (press 'q' to quit)".into(),
    };
    f.render_widget(Block::default().title(title).borders(Borders::BOTTOM), area);
}
