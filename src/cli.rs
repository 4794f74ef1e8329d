// CLI module - command-line argument parsing and handlers
//
// Subcommands:
// - demo [--headless]: host a container in the terminal
// - config --show: Display effective configuration
// - config --path: Show config file path
// - config --reset: Regenerate config file with defaults

use anyhow::Context;
use clap::{Parser, Subcommand};
use slotgrid::config::{Config, VERSION};
use std::io::Write;

/// slotgrid - grid container runtime with a terminal demo host
#[derive(Parser)]
#[command(name = "slotgrid")]
#[command(version = VERSION)]
#[command(about = "Grid container runtime with a terminal demo host", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the demo host (default when no command is given)
    Demo {
        /// Run a fixed number of ticks and log the surface instead of drawing a TUI
        #[arg(long)]
        headless: bool,

        /// Ticks to run in headless mode
        #[arg(long, default_value_t = 6)]
        ticks: u64,
    },

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

/// Handle `config` commands. Returns true if one was handled (exit after).
pub fn handle_config(command: &Commands) -> anyhow::Result<bool> {
    let Commands::Config { show, reset, path } = *command else {
        return Ok(false);
    };

    if path {
        handle_config_path()?;
    } else if show {
        handle_config_show()?;
    } else if reset {
        handle_config_reset()?;
    } else {
        // No flag provided, show help
        println!("Usage: slotgrid config [--show|--reset|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --path    Show config file path");
    }
    Ok(true)
}

fn config_path() -> anyhow::Result<std::path::PathBuf> {
    Config::config_path().context("Could not determine config path")
}

fn handle_config_path() -> anyhow::Result<()> {
    println!("{}", config_path()?.display());
    Ok(())
}

fn handle_config_show() -> anyhow::Result<()> {
    let config = Config::load()?;

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());
    println!("# enable_tui = {} (SLOTGRID_NO_TUI)", config.enable_tui);

    // Show source info
    println!();
    let path = config_path()?;
    if path.exists() {
        println!("# Source: {}", path.display());
    } else {
        println!("# Source: defaults (no config file)");
    }
    Ok(())
}

fn handle_config_reset() -> anyhow::Result<()> {
    let path = config_path()?;

    // Confirm if file exists
    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        std::io::stderr().flush().context("Failed to flush stderr")?;

        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .context("Failed to read answer")?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
    }

    Config::write_default_if_missing(&path)?;
    println!("Config reset to defaults: {}", path.display());
    Ok(())
}
