//! TUI for proxy checker with progress display

use crate::proxy::Disposition;
use crate::report::ClassifiedOutcome;
use crate::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::collections::VecDeque;
use std::io;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::Duration;

/// Maximum number of recent proxies to keep for display
const MAX_RECENT_PROXIES: usize = 100;

/// Proxy checker TUI application state
pub struct ProxyCheckerApp {
    /// Classifications streamed from the aggregator
    events: mpsc::UnboundedReceiver<ClassifiedOutcome>,
    /// Total number of proxies
    total: usize,
    /// Number of checked proxies
    checked: usize,
    working_count: usize,
    suspect_count: usize,
    failed_count: usize,
    /// Recent working and suspect proxies
    recent_good: VecDeque<ClassifiedOutcome>,
    /// Recent failed proxies
    recent_bad: VecDeque<ClassifiedOutcome>,
    /// Selected list (0 = good, 1 = bad)
    selected_list: usize,
    /// Selected item in current list
    list_state: ListState,
    /// Status message
    status_message: String,
    /// Whether checking is complete
    is_complete: bool,
    /// Whether the user wants to quit
    should_quit: bool,
}

impl ProxyCheckerApp {
    /// Create a new proxy checker TUI application
    pub fn new(events: mpsc::UnboundedReceiver<ClassifiedOutcome>, total: usize) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Self {
            events,
            total,
            checked: 0,
            working_count: 0,
            suspect_count: 0,
            failed_count: 0,
            recent_good: VecDeque::new(),
            recent_bad: VecDeque::new(),
            selected_list: 0,
            list_state,
            status_message: "Starting proxy check... Press 'q' to quit.".to_string(),
            is_complete: total == 0,
            should_quit: false,
        }
    }

    /// Run the TUI application
    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_app(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    async fn run_app<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|f| self.ui(f))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_input(key.code);
                        if self.should_quit {
                            break;
                        }
                    }
                }
            }

            self.drain_events();
            tokio::task::yield_now().await;
        }

        Ok(())
    }

    /// Pull every classification that is already waiting
    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.is_complete = true;
                    break;
                }
            }
        }

        self.status_message = if self.is_complete || self.checked == self.total {
            self.is_complete = true;
            format!(
                "Complete! Checked: {} | Working: {} | Suspect: {} | Failed: {} | Press 'q' to quit",
                self.checked, self.working_count, self.suspect_count, self.failed_count
            )
        } else {
            format!(
                "Checking... {}% ({}/{}) | Working: {} | Suspect: {} | Failed: {}",
                self.percentage(),
                self.checked,
                self.total,
                self.working_count,
                self.suspect_count,
                self.failed_count
            )
        };
    }

    fn apply(&mut self, event: ClassifiedOutcome) {
        self.checked += 1;

        let list = match event.disposition {
            Disposition::Working => {
                self.working_count += 1;
                &mut self.recent_good
            }
            Disposition::Suspect => {
                self.suspect_count += 1;
                &mut self.recent_good
            }
            Disposition::Failed => {
                self.failed_count += 1;
                &mut self.recent_bad
            }
        };

        list.push_back(event);
        if list.len() > MAX_RECENT_PROXIES {
            list.pop_front();
        }
    }

    fn percentage(&self) -> u16 {
        if self.total > 0 {
            (self.checked as f64 / self.total as f64 * 100.0) as u16
        } else {
            100
        }
    }

    fn handle_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.selected_list = (self.selected_list + 1) % 2;
                self.list_state.select(Some(0));
            }
            KeyCode::Down => {
                let len = self.selected_len();
                let i = match self.list_state.selected() {
                    Some(i) if i + 1 < len => i + 1,
                    _ => 0,
                };
                self.list_state.select(Some(i));
            }
            KeyCode::Up => {
                let len = self.selected_len();
                let i = match self.list_state.selected() {
                    Some(0) | None => len.saturating_sub(1),
                    Some(i) => i - 1,
                };
                self.list_state.select(Some(i));
            }
            _ => {}
        }
    }

    fn selected_len(&self) -> usize {
        if self.selected_list == 0 {
            self.recent_good.len()
        } else {
            self.recent_bad.len()
        }
    }

    fn ui(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Progress bar
                Constraint::Min(0),    // Proxy lists
                Constraint::Length(3), // Status bar
            ])
            .split(f.size());

        let title = Paragraph::new("Proxy Probe")
            .style(Style::default().fg(Color::Cyan))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, chunks[0]);

        let progress = self.percentage();
        let progress_label = format!("{}/{} ({}%)", self.checked, self.total, progress);
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Progress"))
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
            .percent(progress.min(100))
            .label(progress_label);
        f.render_widget(gauge, chunks[1]);

        let proxy_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);

        Self::render_proxy_list(
            f,
            proxy_chunks[0],
            "Good Proxies",
            &self.recent_good,
            self.working_count + self.suspect_count,
            self.selected_list == 0,
            if self.selected_list == 0 {
                Some(&mut self.list_state)
            } else {
                None
            },
        );

        Self::render_proxy_list(
            f,
            proxy_chunks[1],
            "Failed Proxies",
            &self.recent_bad,
            self.failed_count,
            self.selected_list == 1,
            if self.selected_list == 1 {
                Some(&mut self.list_state)
            } else {
                None
            },
        );

        let status = Paragraph::new(self.status_message.clone())
            .style(if self.is_complete {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Yellow)
            })
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Status"));
        f.render_widget(status, chunks[3]);
    }

    fn render_proxy_list(
        f: &mut Frame,
        area: Rect,
        title: &str,
        results: &VecDeque<ClassifiedOutcome>,
        total_count: usize,
        is_selected: bool,
        list_state: Option<&mut ListState>,
    ) {
        let items: Vec<ListItem> = results
            .iter()
            .rev() // Show newest first
            .map(|event| {
                ListItem::new(list_label(event))
                    .style(Style::default().fg(list_color(event.disposition)))
            })
            .collect();

        let block_title = format!("{} ({})", title, total_count);
        let border_style = if is_selected {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(block_title)
                    .border_style(border_style),
            )
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol(">> ");

        if let Some(state) = list_state {
            f.render_stateful_widget(list, area, state);
        } else {
            f.render_widget(list, area);
        }
    }
}

fn list_label(event: &ClassifiedOutcome) -> String {
    let outcome = &event.outcome;
    match event.disposition {
        Disposition::Failed => outcome.record.raw_form(),
        _ => format!(
            "{} ({}, {}ms)",
            outcome.record.raw_form(),
            outcome.status_code(),
            outcome.elapsed_ms()
        ),
    }
}

fn list_color(disposition: Disposition) -> Color {
    match disposition {
        Disposition::Working => Color::Green,
        Disposition::Suspect => Color::Yellow,
        Disposition::Failed => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::{ProbeOutcome, ProxyRecord};
    use std::time::Duration as StdDuration;

    fn event(port: &str, status: Option<u16>) -> ClassifiedOutcome {
        let record = ProxyRecord::new("10.0.0.1", port);
        let outcome = match status {
            Some(code) => ProbeOutcome::completed(record, StdDuration::from_millis(42), code),
            None => ProbeOutcome::transport_failed(record, StdDuration::from_secs(10), "refused"),
        };
        let disposition = outcome.disposition();
        ClassifiedOutcome {
            outcome,
            disposition,
        }
    }

    #[test]
    fn test_drain_events_updates_counts() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut app = ProxyCheckerApp::new(rx, 3);

        tx.send(event("1", Some(200))).unwrap();
        tx.send(event("2", Some(403))).unwrap();
        app.drain_events();

        assert_eq!(app.checked, 2);
        assert_eq!(app.recent_good.len(), 2);
        assert!(!app.is_complete);
        assert!(app.status_message.starts_with("Checking... 66%"));

        tx.send(event("3", None)).unwrap();
        app.drain_events();

        assert_eq!(app.failed_count, 1);
        assert_eq!(app.recent_bad.len(), 1);
        assert!(app.is_complete);
    }

    #[test]
    fn test_list_labels() {
        assert_eq!(list_label(&event("8080", Some(200))), "10.0.0.1:8080 (200, 42ms)");
        assert_eq!(list_label(&event("8080", None)), "10.0.0.1:8080");
    }

    #[test]
    fn test_navigation_wraps() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut app = ProxyCheckerApp::new(rx, 2);
        tx.send(event("1", Some(200))).unwrap();
        tx.send(event("2", Some(200))).unwrap();
        app.drain_events();

        app.handle_input(KeyCode::Up);
        assert_eq!(app.list_state.selected(), Some(1));
        app.handle_input(KeyCode::Down);
        assert_eq!(app.list_state.selected(), Some(0));
        app.handle_input(KeyCode::Tab);
        assert_eq!(app.selected_list, 1);
        app.handle_input(KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
