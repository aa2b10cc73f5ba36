//! Configuration for the radiodial installation
//!
//! All empirically tuned constants live here: the poll cadence, the tuner
//! hysteresis thresholds, the haptic debounce window, the dial calibration
//! pairs and the station table. They ship with the values the installation
//! was tuned with, but operators can override any of them through a TOML
//! file so a re-tuned sensor does not mean a rebuild.
//!
//! # File location
//!
//! `radiodial-rs/config.toml` under the platform config directory
//! (e.g. `~/.config/radiodial-rs/config.toml` on Linux). A missing file is
//! not an error: defaults apply.
//!
//! # Example
//!
//! ```toml
//! [console]
//! driver = "i2c"
//! poll_interval_ms = 20
//!
//! [[stations]]
//! name = "starfield"
//! mhz = 98.0
//! ```

use crate::error::{RadioDialError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for the config directory
pub const APP_ID: &str = "radiodial-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Default poll cadence of the controller side
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 20;

/// Default I2C bus index of the console
pub const DEFAULT_I2C_BUS: u8 = 1;

/// Default I2C address of the sampling device
pub const DEFAULT_I2C_ADDRESS: u16 = 0x50;

/// Default margin by which a rival station must be closer before the tuner
/// switches to it
pub const DEFAULT_SWITCH_MARGIN: i32 = 6;

/// Default hysteresis thresholds (enter thresholds are tighter than leave
/// thresholds so the status cannot chatter at a band edge)
pub const DEFAULT_TUNED_ENTER: i32 = 2;
pub const DEFAULT_TUNED_LEAVE: i32 = 8;
pub const DEFAULT_NEAR_ENTER: i32 = 14;
pub const DEFAULT_NEAR_LEAVE: i32 = 20;

/// Default median smoothing window of the tuner input
pub const DEFAULT_SMOOTHING_WINDOW: usize = 2;

/// Default debounce window for the near-station buzz
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

// ==================== Console ====================

/// Which transport the poller should open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleDriver {
    /// Simulated console, no hardware required
    #[default]
    Sim,
    /// Real console over the I2C bus (needs the `i2c-console` feature)
    I2c,
}

/// Console/transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Transport selection
    pub driver: ConsoleDriver,
    /// I2C bus index (`/dev/i2c-<bus>`)
    pub i2c_bus: u8,
    /// I2C address of the sampling device
    pub i2c_address: u16,
    /// Poll cadence in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            driver: ConsoleDriver::default(),
            i2c_bus: DEFAULT_I2C_BUS,
            i2c_address: DEFAULT_I2C_ADDRESS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

// ==================== Tuner ====================

/// One dial calibration pair: a raw sensor value and the dial frequency
/// printed at that position
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalibrationPoint {
    /// Raw sensor value
    pub value: f64,
    /// Dial frequency in MHz
    pub mhz: f64,
}

/// Tuner state machine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// A rival station must be this much closer before the tuner switches
    pub switch_margin: i32,
    /// Distance at or under which the status enters `Tuned`
    pub tuned_enter: i32,
    /// Distance at or over which `Tuned` decays to near
    pub tuned_leave: i32,
    /// Distance at or under which a far status enters near
    pub near_enter: i32,
    /// Distance at or over which a near status decays to far
    pub near_leave: i32,
    /// Median filter window applied to raw readings before any distance
    /// comparison
    pub smoothing_window: usize,
    /// Three measured (value, frequency) pairs for the dial interpolation
    pub calibration: [CalibrationPoint; 3],
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            switch_margin: DEFAULT_SWITCH_MARGIN,
            tuned_enter: DEFAULT_TUNED_ENTER,
            tuned_leave: DEFAULT_TUNED_LEAVE,
            near_enter: DEFAULT_NEAR_ENTER,
            near_leave: DEFAULT_NEAR_LEAVE,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            // Measured against the dial face of the installed console
            calibration: [
                CalibrationPoint {
                    value: 148.0,
                    mhz: 90.0,
                },
                CalibrationPoint {
                    value: 470.0,
                    mhz: 98.0,
                },
                CalibrationPoint {
                    value: 750.0,
                    mhz: 104.0,
                },
            ],
        }
    }
}

// ==================== Feedback ====================

/// Haptic feedback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Minimum quiet time between status-change buzzes, in milliseconds
    pub debounce_ms: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

// ==================== Stations ====================

/// One selectable program on the virtual dial
///
/// Table order defines the station index used by callers that map indices
/// to art programs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    /// Program name, for logs
    pub name: String,
    /// Dial frequency of the station in MHz
    pub mhz: f64,
}

impl StationConfig {
    /// Frequency in tenths of MHz, the unit the tuner mapping works in
    pub fn freq_tenths(&self) -> i32 {
        (self.mhz * 10.0).round() as i32
    }
}

// ==================== App config ====================

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Console/transport settings
    pub console: ConsoleConfig,
    /// Tuner state machine settings
    pub tuner: TunerConfig,
    /// Haptic feedback settings
    pub feedback: FeedbackConfig,
    /// Optional directory for rolling log files; stdout only when unset
    pub log_dir: Option<PathBuf>,
    /// Station table, in display order
    pub stations: Vec<StationConfig>,
}

impl AppConfig {
    /// Default config path under the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&text)
            .map_err(|e| RadioDialError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| RadioDialError::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// Load the config from the default location, falling back to defaults
    /// when the file does not exist
    pub fn load_or_default() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => match Self::load(&path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }
}
