//! App state and main loop: input handling, receiving pushed snapshots, updating history, and drawing.

use std::{collections::VecDeque, io, time::Duration};

use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::time::timeout;
use url::Url;

use crate::history::{push_capped, PerCoreHistory};
use crate::types::Snapshot;
use crate::ui::{
    cpu::{draw_cpu_avg_graph, draw_per_core_bars},
    header::draw_header,
    mem::draw_mem,
    net::draw_net,
    processes::draw_top_processes,
};
use crate::ws::{connect, next_snapshot, WsStream};

const HISTORY: usize = 600;

pub struct App {
    last: Option<Snapshot>,
    cpu_hist: VecDeque<u64>,
    per_core_hist: PerCoreHistory,
    connected: bool,
    should_quit: bool,
}

impl App {
    pub fn new() -> Self {
        Self {
            last: None,
            cpu_hist: VecDeque::with_capacity(HISTORY),
            per_core_hist: PerCoreHistory::new(60),
            connected: false,
            should_quit: false,
        }
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.last.as_ref()
    }

    pub fn cpu_history(&self) -> &VecDeque<u64> {
        &self.cpu_hist
    }

    pub async fn run(&mut self, url: &Url) -> anyhow::Result<()> {
        let mut ws = connect(url).await?;
        self.connected = true;

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let res = self.event_loop(&mut terminal, &mut ws).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        ws: &mut WsStream,
    ) -> anyhow::Result<()> {
        loop {
            // Input (non-blocking)
            while event::poll(Duration::from_millis(10))? {
                if let Event::Key(k) = event::read()? {
                    if matches!(
                        k.code,
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc
                    ) {
                        self.should_quit = true;
                    }
                }
            }
            if self.should_quit {
                break;
            }

            if self.connected {
                // Short wait so keys stay responsive between pushes.
                match timeout(Duration::from_millis(200), next_snapshot(ws)).await {
                    Ok(Some(s)) => self.update_with_snapshot(s),
                    Ok(None) => self.connected = false,
                    Err(_) => {}
                }
            } else {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }

            terminal.draw(|f| self.draw(f))?;
        }
        Ok(())
    }

    pub fn update_with_snapshot(&mut self, s: Snapshot) {
        let avg = s.cpu_average().clamp(0.0, 100.0).round() as u64;
        push_capped(&mut self.cpu_hist, avg, HISTORY);
        let per_core: Vec<f64> = s.cpu.iter().map(|c| c.usage).collect();
        self.per_core_hist.push_samples(&per_core);
        self.last = Some(s);
    }

    pub fn draw(&self, f: &mut ratatui::Frame<'_>) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),   // header
                Constraint::Ratio(1, 3), // cpu avg + per-core
                Constraint::Length(3),   // memory
                Constraint::Min(8),      // interfaces + processes
            ])
            .split(f.area());

        draw_header(f, rows[0], self.last.as_ref(), self.connected);

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(66), Constraint::Percentage(34)])
            .split(rows[1]);
        draw_cpu_avg_graph(f, top[0], &self.cpu_hist, self.last.as_ref());
        draw_per_core_bars(f, top[1], self.last.as_ref(), &self.per_core_hist);

        draw_mem(f, rows[2], self.last.as_ref());

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[3]);
        draw_net(f, bottom[0], self.last.as_ref());
        draw_top_processes(f, bottom[1], self.last.as_ref());
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn snapshot(usages: &[f64]) -> Snapshot {
        let cpu: Vec<serde_json::Value> = usages
            .iter()
            .enumerate()
            .map(|(i, u)| serde_json::json!({"core": i, "usage": u}))
            .collect();
        serde_json::from_value(serde_json::json!({
            "version": 1,
            "timestamp": "2026-10-18T12:00:00.000Z",
            "cpu": cpu,
            "memory": {"total": "8.00 GB", "free": "2.00 GB", "used": "6.00 GB", "percentage": "75.0"},
            "network": [{"name": "eth0", "addresses": [{"address": "10.0.0.2", "family": "IPv4", "internal": false}]}],
            "processes": [{"pid": "42", "cmd": "postgres", "cpu": "12.0%", "mem": "3.1%"}]
        }))
        .unwrap()
    }

    #[test]
    fn updates_history_from_pushed_snapshots() {
        let mut app = App::new();
        app.update_with_snapshot(snapshot(&[10.0, 30.0]));
        app.update_with_snapshot(snapshot(&[50.0, 70.0]));
        assert_eq!(app.cpu_history(), &VecDeque::from(vec![20, 60]));
        assert_eq!(app.last().unwrap().cpu.len(), 2);
    }

    #[test]
    fn renders_every_panel() {
        let mut app = App::new();
        app.connected = true;
        app.update_with_snapshot(snapshot(&[10.0, 90.0]));
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        let buf = terminal.backend().buffer();
        let text: String = buf.content.iter().map(|c| c.symbol()).collect();
        for needle in ["Per-core", "Memory", "Interfaces", "Top Processes", "postgres", "eth0", "75.0%"] {
            assert!(text.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn renders_before_first_sample() {
        let app = App::new();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
    }
}
