// Demo module - hosts one grid container against the in-memory host
//
// Two front ends share the same DemoSession:
// - run_tui: draws the open surface, the status line and captured logs
// - run_headless: runs a few scheduler ticks and logs the surface rows

pub mod app;
pub mod session;
mod ui;

use crate::config::Config;
use crate::logging::LogBuffer;
use anyhow::{Context, Result};
use app::DemoApp;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use session::DemoSession;
use std::io;
use std::time::Duration;
use tracing::info;

/// Run the interactive demo
///
/// Sets up the terminal, opens the demo container, runs the event loop and
/// restores the terminal when done.
pub async fn run_tui(config: &Config, log_buffer: LogBuffer) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let session = DemoSession::new(config);
    session.open();
    let mut app = DemoApp::new(session, log_buffer);

    let result = run_event_loop(&mut terminal, &mut app).await;

    app.session.shutdown();

    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Redraw on a fixed cadence; the scheduler updates the surface on its own thread
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut DemoApp,
) -> Result<()> {
    let mut redraw = tokio::time::interval(Duration::from_millis(100));

    loop {
        terminal
            .draw(|f| ui::draw(f, app))
            .context("Failed to draw terminal")?;

        tokio::select! {
            _ = async {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    if let Ok(Event::Key(key)) = event::read() {
                        app.handle_key(key);
                    }
                }
            } => {}

            _ = redraw.tick() => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Run the demo without a terminal UI
///
/// Opens the container, lets the scheduler run for `ticks` intervals, logs
/// the surface and exercises the click button once.
pub async fn run_headless(config: &Config, ticks: u64) -> Result<()> {
    let session = DemoSession::new(config);
    session.open();
    info!(
        "Demo container #{} open: {} slots, refresh {}",
        session.container.id(),
        session.capacity(),
        if config.demo.refresh { "on" } else { "off" }
    );

    let interval = config.scheduler.interval();
    let wait = interval
        .checked_mul(u32::try_from(ticks).unwrap_or(u32::MAX))
        .unwrap_or(interval);
    tokio::time::sleep(wait).await;
    info!("Scheduler at step {}", session.scheduler.step());

    log_rows(&session);

    let clicks = session.clicks();
    if let Some(event) = session.click(session::BUTTON_SLOT) {
        info!(
            "Clicked slot {} ({}), clicks {} -> {}",
            event.slot,
            if event.cancelled { "cancelled" } else { "allowed" },
            clicks,
            session.clicks()
        );
    }

    session.close();
    session.shutdown();
    Ok(())
}

fn log_rows(session: &DemoSession) {
    let Some(rows) = session.rows() else {
        info!("(closed)");
        return;
    };
    for (index, row) in rows.iter().enumerate() {
        let cells: Vec<&str> = row
            .iter()
            .map(|content| if content.is_empty() { "." } else { content.as_str() })
            .collect();
        info!("row {}: {}", index, cells.join(" | "));
    }
}
