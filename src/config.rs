//! Engine configuration.
//!
//! ## Example: TOML configuration
//!
//! ```toml
//! printer_name = "Voron 2.4"
//! klippy_timeout_secs = 30
//! klippy_poll_interval_ms = 1000
//! resync_interval_secs = 60
//! ```
//!
//! `resync_interval_secs` is carried for the scheduler that drives periodic
//! `resync()` calls; the engine itself never schedules anything with it.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::time::Duration;

/// Placeholder label when no printer name is configured.
pub const DEFAULT_PRINTER_NAME: &str = "_Default";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Identifying label used in log output.
    #[serde(default)]
    pub printer_name: Option<String>,
    /// Upper bound on waiting for Klippy to report ready.
    #[serde(default = "default_klippy_timeout_secs")]
    pub klippy_timeout_secs: u64,
    /// Delay between readiness polls.
    #[serde(default = "default_klippy_poll_interval_ms")]
    pub klippy_poll_interval_ms: u64,
    /// Suggested cadence for the caller-driven resync loop.
    #[serde(default = "default_resync_interval_secs")]
    pub resync_interval_secs: u64,
}

// Default value functions
fn default_klippy_timeout_secs() -> u64 {
    30
}
fn default_klippy_poll_interval_ms() -> u64 {
    1000
}
fn default_resync_interval_secs() -> u64 {
    60
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            printer_name: None,
            klippy_timeout_secs: default_klippy_timeout_secs(),
            klippy_poll_interval_ms: default_klippy_poll_interval_ms(),
            resync_interval_secs: default_resync_interval_secs(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from a TOML file.
    pub fn load_config(config_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut file = File::open(config_path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let config: SyncConfig = toml::from_str(&contents)?;
        tracing::info!("Loaded sync configuration from: {}", config_path);
        Ok(config)
    }

    pub fn printer_name(&self) -> &str {
        self.printer_name.as_deref().unwrap_or(DEFAULT_PRINTER_NAME)
    }

    pub fn klippy_timeout(&self) -> Duration {
        Duration::from_secs(self.klippy_timeout_secs)
    }

    pub fn klippy_poll_interval(&self) -> Duration {
        Duration::from_millis(self.klippy_poll_interval_ms)
    }

    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }
}
