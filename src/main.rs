// slotgrid - grid container runtime with a terminal demo host
//
// The library does the work; this binary wires it up:
// - CLI (clap): demo / config subcommands
// - Config: env > ~/.config/slotgrid/config.toml > defaults
// - Logging (tracing): stdout in headless mode, captured into the TUI otherwise
// - Demo: one container on the in-memory host, driven by the shared scheduler

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use slotgrid::config::Config;
use slotgrid::demo;
use slotgrid::logging::{self, LogBuffer};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Demo {
        headless: false,
        ticks: 6,
    });

    // config --show/--path/--reset exit early
    if cli::handle_config(&command)? {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
            eprintln!("║  CONFIG ERROR - Failed to load configuration                 ║");
            eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
            eprintln!("  Error: {:#}\n", e);
            eprintln!("  Tip: `slotgrid config --reset` rewrites the file with defaults.\n");
            std::process::exit(1);
        }
    };

    let (headless, ticks) = match command {
        Commands::Demo { headless, ticks } => (headless || !config.enable_tui, ticks),
        Commands::Config { .. } => return Ok(()),
    };

    // TUI mode captures logs so they don't garble the display
    let log_buffer = LogBuffer::new();
    let _file_guard = logging::init(&config.logging, (!headless).then(|| log_buffer.clone()))?;

    info!(
        "slotgrid {} starting ({} mode, {}ms ticks)",
        slotgrid::config::VERSION,
        if headless { "headless" } else { "tui" },
        config.scheduler.interval().as_millis()
    );

    if headless {
        demo::run_headless(&config, ticks).await
    } else {
        demo::run_tui(&config, log_buffer).await
    }
}
