//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Package name of the BugReport app under test
pub const DEFAULT_PACKAGE: &str = "com.google.android.car.bugreport";

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Device and app settings
    #[serde(default)]
    pub device: DeviceConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Where pulled artifacts are written
    #[serde(default)]
    pub output: OutputConfig,
}

/// Device and app settings
#[derive(Debug, Deserialize)]
pub struct DeviceConfig {
    /// adb executable, either a bare name looked up in PATH or a full path
    #[serde(default = "default_adb_path")]
    pub adb_path: PathBuf,

    /// Package of the BugReport app
    #[serde(default = "default_package")]
    pub package: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adb_path: default_adb_path(),
            package: default_package(),
        }
    }
}

fn default_adb_path() -> PathBuf {
    PathBuf::from("adb")
}

fn default_package() -> String {
    DEFAULT_PACKAGE.to_string()
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Progress tick while waiting for a status change
    #[serde(default = "default_poll_tick")]
    pub poll_tick_secs: u64,

    /// Minimum time between two status database pulls
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Time given to the app to create its record after launch
    #[serde(default = "default_settle")]
    pub settle_secs: u64,

    /// Deadline for dumpstate to finish writing the bugreport
    #[serde(default = "default_collection_deadline")]
    pub collection_deadline_secs: u64,

    /// Deadline for the bugreport upload
    #[serde(default = "default_upload_deadline")]
    pub upload_deadline_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            poll_tick_secs: default_poll_tick(),
            check_interval_secs: default_check_interval(),
            settle_secs: default_settle(),
            collection_deadline_secs: default_collection_deadline(),
            upload_deadline_secs: default_upload_deadline(),
        }
    }
}

fn default_poll_tick() -> u64 {
    1
}
fn default_check_interval() -> u64 {
    15
}
fn default_settle() -> u64 {
    15
}
fn default_collection_deadline() -> u64 {
    300
}
fn default_upload_deadline() -> u64 {
    180
}

/// Output settings
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Parent directory of the per-run `aae-bugreport-*` directory
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Timing values used by the status waiter and the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub poll_tick: Duration,
    pub check_interval: Duration,
    pub settle: Duration,
    pub collection_deadline: Duration,
    pub upload_deadline: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Timeouts::default().timing()
    }
}

impl Timeouts {
    pub fn timing(&self) -> Timing {
        Timing {
            poll_tick: Duration::from_secs(self.poll_tick_secs),
            check_interval: Duration::from_secs(self.check_interval_secs),
            settle: Duration::from_secs(self.settle_secs),
            collection_deadline: Duration::from_secs(self.collection_deadline_secs),
            upload_deadline: Duration::from_secs(self.upload_deadline_secs),
        }
    }
}

/// On-device locations used by the BugReport app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePaths {
    pub package: String,
    pub pending_dir: String,
    pub db_dir: String,
    pub db_path: String,
}

impl DevicePaths {
    pub fn for_package(package: &str) -> Self {
        let pending_dir = format!("/data/user/0/{package}/bug_reports_pending");
        let db_dir = format!("/data/user/0/{package}/databases");
        let db_path = format!("{db_dir}/bugreport.db");
        Self {
            package: package.to_string(),
            pending_dir,
            db_dir,
            db_path,
        }
    }

    /// Component name of the activity that starts a bugreport
    pub fn activity(&self) -> String {
        format!("{}/.BugReportActivity", self.package)
    }
}

impl Default for DevicePaths {
    fn default() -> Self {
        Self::for_package(DEFAULT_PACKAGE)
    }
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    pub fn timing(&self) -> Timing {
        self.timeouts.timing()
    }

    pub fn device_paths(&self) -> DevicePaths {
        DevicePaths::for_package(&self.device.package)
    }
}
