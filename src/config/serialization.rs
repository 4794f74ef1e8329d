//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

impl Config {
    /// Render the effective configuration as a commented config file
    pub fn to_toml(&self) -> String {
        format!(
            r#"# slotgrid configuration

# Refresh scheduler
[scheduler]
# Milliseconds per tick; a render + refresh cycle takes two ticks
interval_ms = {interval_ms}

# Defaults for containers built from config
[grid]
# Multiple of 9, below 54
default_size = {default_size}
default_title = {default_title:?}
# Cancel clicks on slots no cell claims
interaction_cancelled = {interaction_cancelled}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = {log_level:?}
# File logging (in addition to TUI buffer or stdout)
file_enabled = {log_file_enabled}
file_dir = {log_file_dir:?}
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = {log_file_prefix:?}

# Terminal demo
[demo]
refresh = {demo_refresh}
size = {demo_size}
"#,
            interval_ms = self.scheduler.interval_ms,
            default_size = self.grid.default_size,
            default_title = self.grid.default_title,
            interaction_cancelled = self.grid.interaction_cancelled,
            log_level = self.logging.level,
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = self.logging.file_dir.display().to_string(),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = self.logging.file_prefix,
            demo_refresh = self.demo.refresh,
            demo_size = self.demo.size,
        )
    }
}
