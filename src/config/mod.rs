//! Configuration for the grid runtime and its demo host
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/slotgrid/config.toml)
//! 3. Built-in defaults (lowest priority)

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod observability;
mod runtime;
mod serialization;

#[cfg(test)]
mod tests;

pub use observability::{FileLogging, LogRotation, LoggingConfig};
pub use runtime::{
    DemoConfig, FileDemoConfig, FileGridDefaults, FileSchedulerConfig, GridDefaults,
    SchedulerConfig,
};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Tick timer settings
    pub scheduler: SchedulerConfig,

    /// Defaults applied to containers created from config
    pub grid: GridDefaults,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Terminal demo settings
    pub demo: DemoConfig,

    /// Whether the demo draws a terminal UI (can be disabled for headless mode)
    pub enable_tui: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            grid: GridDefaults::default(),
            logging: LoggingConfig::default(),
            demo: DemoConfig::default(),
            enable_tui: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    /// Optional [scheduler] section
    pub scheduler: Option<FileSchedulerConfig>,

    /// Optional [grid] section
    pub grid: Option<FileGridDefaults>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,

    /// Optional [demo] section
    pub demo: Option<FileDemoConfig>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/slotgrid/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("slotgrid").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    /// Called during startup to help users discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };
        // Config is optional, so failures here are ignored
        let _ = Self::write_default_if_missing(&path);
    }

    /// Write the default template at `path` unless something is already there
    pub fn write_default_if_missing(path: &Path) -> anyhow::Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, Self::default().to_toml())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(true)
    }

    /// Parse config file contents (no environment overrides)
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let file: FileConfig = toml::from_str(contents)?;
        Ok(Self::from_file(file))
    }

    /// Read and parse the config file at `path`
    ///
    /// A missing file is not an error: it yields defaults.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    /// Load configuration: env vars > file > defaults
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) => Self::from_path(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(file: FileConfig) -> Self {
        Self {
            scheduler: SchedulerConfig::from_file(file.scheduler),
            grid: GridDefaults::from_file(file.grid),
            logging: LoggingConfig::from_file(file.logging),
            demo: DemoConfig::from_file(file.demo),
            enable_tui: true,
        }
    }

    /// Apply environment overrides, reading variables through `var`
    pub(crate) fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Tick interval: env > file > default
        if let Some(ms) = var("SLOTGRID_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            self.scheduler.interval_ms = ms;
        }

        // Log level: env > file > default (RUST_LOG still wins at init)
        if let Some(level) = var("SLOTGRID_LOG_LEVEL") {
            self.logging.level = level;
        }

        // TUI toggle: env only (runtime flag)
        if let Some(v) = var("SLOTGRID_NO_TUI") {
            self.enable_tui = v != "1" && v.to_lowercase() != "true";
        }
    }
}
