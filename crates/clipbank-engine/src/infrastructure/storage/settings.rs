//! TOML settings file.
//!
//! Default location:
//! - Windows:  `%APPDATA%\ClipBank\settings.toml`
//! - Linux:    `$XDG_CONFIG_HOME/clipbank/settings.toml` (or `~/.config/clipbank/…`)
//! - macOS:    `~/Library/Application Support/ClipBank/settings.toml`
//!
//! Every field has a serde default, so a partial file (or none at all) still
//! yields a complete [`Settings`]:
//!
//! ```toml
//! [general]
//! log_level = "debug"
//! paste_grace_ms = 150
//!
//! [slots]
//! slot_count = 20
//! fill_mode = "fixed"
//! auto_promote = true
//! sticky_apps = ["KeePassXC.exe"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use clipbank_core::SlotSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::engine::EngineTimings;

/// Error type for the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// The whole settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub slots: SlotSettings,
}

/// Logging and timing knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Pause between releasing modifiers and sending the action.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// How long clipboard changes stay suppressed after a synthetic paste.
    #[serde(default = "default_paste_grace_ms")]
    pub paste_grace_ms: u64,
    /// Period of the stuck-modifier sweep.
    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: u64,
    /// Quiet period before slot changes are written to disk.
    #[serde(default = "default_persist_debounce_ms")]
    pub persist_debounce_ms: u64,
    /// How long a targeted copy waits for the clipboard to change.
    #[serde(default = "default_copy_timeout_ms")]
    pub copy_timeout_ms: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_settle_delay_ms() -> u64 {
    15
}
fn default_paste_grace_ms() -> u64 {
    100
}
fn default_cleanup_interval_ms() -> u64 {
    500
}
fn default_persist_debounce_ms() -> u64 {
    1000
}
fn default_copy_timeout_ms() -> u64 {
    500
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            settle_delay_ms: default_settle_delay_ms(),
            paste_grace_ms: default_paste_grace_ms(),
            cleanup_interval_ms: default_cleanup_interval_ms(),
            persist_debounce_ms: default_persist_debounce_ms(),
            copy_timeout_ms: default_copy_timeout_ms(),
        }
    }
}

impl GeneralSettings {
    pub fn timings(&self) -> EngineTimings {
        EngineTimings {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            paste_grace: Duration::from_millis(self.paste_grace_ms),
            persist_debounce: Duration::from_millis(self.persist_debounce_ms),
            copy_timeout: Duration::from_millis(self.copy_timeout_ms),
        }
    }

    /// Never zero, so it can drive a `tokio::time::interval`.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms.max(1))
    }
}

// ── Settings file ─────────────────────────────────────────────────────────────

/// The ClipBank directory under the platform config base.
///
/// # Errors
///
/// Returns [`SettingsError::NoPlatformConfigDir`] when the base directory
/// cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, SettingsError> {
    platform_config_dir().ok_or(SettingsError::NoPlatformConfigDir)
}

/// Default path of the settings file.
///
/// # Errors
///
/// Returns [`SettingsError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn default_settings_path() -> Result<PathBuf, SettingsError> {
    Ok(config_dir()?.join("settings.toml"))
}

/// Loads settings from `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] for file-system errors other than "not
/// found", and [`SettingsError::Parse`] if the TOML is malformed.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
        Err(source) => Err(SettingsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `settings` to `path`, creating the directory if needed.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] for file-system failures or
/// [`SettingsError::Serialize`] if serialization fails.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| SettingsError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("ClipBank"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("clipbank"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("ClipBank"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
