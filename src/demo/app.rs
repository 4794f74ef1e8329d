//! Demo application state and key handling

use super::session::DemoSession;
use crate::host::ROW_WIDTH;
use crate::logging::LogBuffer;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

/// Result of handling a key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// Event was consumed
    Yes,
    /// Event was not handled
    No,
}

pub struct DemoApp {
    pub session: DemoSession,
    pub log_buffer: LogBuffer,
    /// Slot under the cursor
    pub cursor: usize,
    /// Outcome of the last interaction, shown in the status bar
    pub status: String,
    pub should_quit: bool,
}

impl DemoApp {
    pub fn new(session: DemoSession, log_buffer: LogBuffer) -> Self {
        Self {
            session,
            log_buffer,
            cursor: 0,
            status: "arrows move · enter click · d drag row · esc close · o open · q quit"
                .to_string(),
            should_quit: false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Handled {
        if key.kind != KeyEventKind::Press {
            return Handled::No;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Left => self.move_cursor(-1),
            KeyCode::Right => self.move_cursor(1),
            KeyCode::Up => self.move_cursor(-(ROW_WIDTH as isize)),
            KeyCode::Down => self.move_cursor(ROW_WIDTH as isize),
            KeyCode::Enter => self.click(),
            KeyCode::Char('d') => self.drag(),
            KeyCode::Esc => {
                self.status = if self.session.close() {
                    "closed".to_string()
                } else {
                    "nothing open".to_string()
                };
            }
            KeyCode::Char('o') => {
                self.session.open();
                self.status = "opened".to_string();
            }
            _ => return Handled::No,
        }
        Handled::Yes
    }

    fn move_cursor(&mut self, delta: isize) {
        let capacity = self.session.capacity();
        if capacity == 0 {
            return;
        }
        let next = self.cursor as isize + delta;
        if (0..capacity as isize).contains(&next) {
            self.cursor = next as usize;
        }
    }

    fn click(&mut self) {
        self.status = match self.session.click(self.cursor) {
            Some(event) => format!(
                "click slot {} → {}",
                event.slot,
                if event.cancelled { "cancelled" } else { "allowed" }
            ),
            None => "nothing open".to_string(),
        };
    }

    fn drag(&mut self) {
        self.status = match self.session.drag_row(self.cursor) {
            Some(event) => format!(
                "drag over {:?} → {}",
                event.slots,
                if event.cancelled { "cancelled" } else { "allowed" }
            ),
            None => "nothing open".to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crossterm::event::KeyModifiers;

    fn app() -> DemoApp {
        let mut config = Config::default();
        config.demo.refresh = false;
        let session = DemoSession::new(&config);
        session.open();
        DemoApp::new(session, LogBuffer::new())
    }

    fn press(app: &mut DemoApp, code: KeyCode) -> Handled {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut app = app();
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.cursor, 0);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.cursor, 10);

        for _ in 0..5 {
            press(&mut app, KeyCode::Down);
        }
        assert_eq!(app.cursor, 19);
    }

    #[test]
    fn test_click_reports_outcome() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.status, "click slot 0 → cancelled");
    }

    #[test]
    fn test_escape_closes_then_quit() {
        let mut app = app();
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.status, "closed");
        assert_eq!(app.session.capacity(), 0);

        assert_eq!(press(&mut app, KeyCode::Char('x')), Handled::No);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
