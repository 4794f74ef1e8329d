//! Runtime configuration: scheduler cadence, container defaults, demo

use serde::Deserialize;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Scheduler
// ─────────────────────────────────────────────────────────────────────────────

/// Scheduler timer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Milliseconds between ticks. One tick is one nominal host update, so a
    /// render + refresh cycle spans two.
    pub interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { interval_ms: 50 }
    }
}

/// Scheduler settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileSchedulerConfig {
    pub interval_ms: Option<u64>,
}

impl SchedulerConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileSchedulerConfig>) -> Self {
        let file = file.unwrap_or_default();
        Self {
            interval_ms: file.interval_ms.unwrap_or(Self::default().interval_ms),
        }
    }

    /// Tick period; zero is bumped to 1ms so the timer thread never spins
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Container defaults
// ─────────────────────────────────────────────────────────────────────────────

/// Starting values for containers built with `GridContainer::with_defaults`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridDefaults {
    /// Slot count, a multiple of 9 below 54
    pub default_size: usize,
    pub default_title: String,
    /// Cancel clicks on slots no cell claims
    pub interaction_cancelled: bool,
}

impl Default for GridDefaults {
    fn default() -> Self {
        Self {
            default_size: 9,
            default_title: String::new(),
            interaction_cancelled: false,
        }
    }
}

/// Container defaults as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileGridDefaults {
    pub default_size: Option<usize>,
    pub default_title: Option<String>,
    pub interaction_cancelled: Option<bool>,
}

impl GridDefaults {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileGridDefaults>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            default_size: file.default_size.unwrap_or(defaults.default_size),
            default_title: file.default_title.unwrap_or(defaults.default_title),
            interaction_cancelled: file
                .interaction_cancelled
                .unwrap_or(defaults.interaction_cancelled),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Demo
// ─────────────────────────────────────────────────────────────────────────────

/// Terminal demo settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// Register the demo container with the scheduler
    pub refresh: bool,
    /// Slot count of the demo container
    pub size: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            refresh: true,
            size: 27,
        }
    }
}

/// Demo settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileDemoConfig {
    pub refresh: Option<bool>,
    pub size: Option<usize>,
}

impl DemoConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileDemoConfig>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            refresh: file.refresh.unwrap_or(defaults.refresh),
            size: file.size.unwrap_or(defaults.size),
        }
    }
}
