use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use enact_core::TracePanel;
use std::time::Duration;

pub struct App {
    pub source: String,
    pub interval: Duration,
    pub panel: TracePanel,
    pub last_update: Option<DateTime<Local>>,
    pub updates: u64,
    pub scroll: u16,
    pub show_help: bool,
    should_quit: bool,
}

impl App {
    pub fn new(source: String, interval: Duration) -> Self {
        Self {
            source,
            interval,
            panel: TracePanel::new(),
            last_update: None,
            updates: 0,
            scroll: 0,
            show_help: false,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn apply_panel(&mut self, panel: TracePanel) {
        self.panel = panel;
        self.last_update = Some(Local::now());
        self.updates += 1;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    /// Heading line, strip line and a spacer per agent.
    pub fn content_height(&self) -> u16 {
        u16::try_from(self.panel.len().saturating_mul(3)).unwrap_or(u16::MAX)
    }

    fn max_scroll(&self) -> u16 {
        self.content_height().saturating_sub(1)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                if self.show_help {
                    self.show_help = false;
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Char('?') => self.show_help = !self.show_help,
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
            KeyCode::PageDown => self.scroll_by(10),
            KeyCode::PageUp => self.scroll_by(-10),
            KeyCode::Char('g') | KeyCode::Home => self.scroll = 0,
            KeyCode::Char('G') | KeyCode::End => self.scroll = self.max_scroll(),
            _ => {}
        }
    }

    fn scroll_by(&mut self, delta: i32) {
        let next = (i32::from(self.scroll) + delta).clamp(0, i32::from(self.max_scroll()));
        self.scroll = next as u16;
    }
}
