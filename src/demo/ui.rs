//! Demo rendering: the open surface as a grid, a status bar, the log pane

use super::app::DemoApp;
use crate::host::ROW_WIDTH;
use crate::logging::{LogEntry, LogLevel};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

/// Display columns per slot
const CELL_WIDTH: usize = 10;

pub fn draw(f: &mut Frame, app: &DemoApp) {
    let rows = app.session.rows();
    let grid_height = rows.as_ref().map_or(1, Vec::len) as u16 + 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(grid_height),
            Constraint::Length(3),
            Constraint::Min(4),
        ])
        .split(f.area());

    draw_grid(f, chunks[0], app, rows.as_deref());
    draw_status(f, chunks[1], app);
    draw_logs(f, chunks[2], app);
}

fn draw_grid(f: &mut Frame, area: Rect, app: &DemoApp, rows: Option<&[Vec<String>]>) {
    let container = &app.session.container;
    let title = format!(
        " {} · {} slots · step {} ",
        container.title(),
        container.size(),
        app.session.scheduler.step()
    );
    let block = Block::default().borders(Borders::ALL).title(title);

    let Some(rows) = rows else {
        let closed = Paragraph::new("(closed - press o to open)").block(block);
        f.render_widget(closed, area);
        return;
    };

    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let spans: Vec<Span> = cells
                .iter()
                .enumerate()
                .map(|(col, content)| {
                    let slot = row * ROW_WIDTH + col;
                    let text = if content.is_empty() { "·" } else { content };
                    let mut style = Style::default();
                    if container.cell(slot).is_some() {
                        style = style.fg(Color::Cyan);
                    }
                    if slot == app.cursor {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    Span::styled(fit(text, CELL_WIDTH), style)
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &DemoApp) {
    let status = Paragraph::new(app.status.as_str())
        .block(Block::default().borders(Borders::ALL).title(" Status "));
    f.render_widget(status, area);
}

fn draw_logs(f: &mut Frame, area: Rect, app: &DemoApp) {
    let visible = area.height.saturating_sub(2) as usize;
    let items: Vec<ListItem> = app
        .log_buffer
        .recent(visible)
        .iter()
        .map(|entry| ListItem::new(format_log_entry(entry)).style(log_level_style(entry.level)))
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Logs "));
    f.render_widget(list, area);
}

fn format_log_entry(entry: &LogEntry) -> String {
    format!(
        "[{}] {:5} {}",
        entry.timestamp.format("%H:%M:%S"),
        entry.level.as_str(),
        entry.message
    )
}

fn log_level_style(level: LogLevel) -> Style {
    match level {
        LogLevel::Error => Style::default().fg(Color::Red),
        LogLevel::Warn => Style::default().fg(Color::Yellow),
        LogLevel::Info => Style::default(),
        LogLevel::Debug | LogLevel::Trace => Style::default().fg(Color::DarkGray),
    }
}

/// Truncate or pad `text` to exactly `width` display columns
fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        // keep one column as a separator
        if used + w > width - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(&" ".repeat(width - used));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_pads_and_truncates_by_display_width() {
        assert_eq!(fit("ab", 5), "ab   ");
        assert_eq!(fit("abcdefgh", 5), "abcd ");
        // wide chars take two columns
        assert_eq!(fit("日本語", 5), "日本 ");
    }
}
