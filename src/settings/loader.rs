//! Settings loader with file resolution and environment override support.

use super::error::{SettingsError, SettingsResult};
use super::schema::{LogFormat, Settings};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "UNISERIAL";

/// Settings file name
const SETTINGS_FILE_NAME: &str = "uniserial.toml";

/// Environment variable for an explicit settings path
const SETTINGS_PATH_ENV: &str = "UNISERIAL_CONFIG";

/// Settings loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    /// Resolved settings file path (if any)
    pub settings_path: Option<PathBuf>,
    /// The loaded settings
    pub settings: Settings,
}

impl SettingsLoader {
    /// Load settings using the standard resolution order, then apply
    /// environment overrides.
    pub fn load() -> SettingsResult<Self> {
        let settings_path = resolve_settings_path();

        let mut settings = match settings_path {
            Some(ref path) => load_from_file(path)?,
            None => Settings::default(),
        };

        apply_env_overrides(&mut settings)?;

        Ok(Self {
            settings_path,
            settings,
        })
    }

    /// Load settings from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut settings = load_from_file(&path)?;
        apply_env_overrides(&mut settings)?;

        Ok(Self {
            settings_path: Some(path),
            settings,
        })
    }

    /// Built-in defaults plus environment overrides, no file.
    pub fn with_defaults() -> SettingsResult<Self> {
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings)?;

        Ok(Self {
            settings_path: None,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Save the current settings back to the file they came from.
    pub fn save(&self) -> SettingsResult<()> {
        let path = self
            .settings_path
            .as_ref()
            .ok_or_else(|| SettingsError::MissingRequired("No settings file path set".to_string()))?;

        save_to_file(&self.settings, path)
    }

    /// Save the current settings to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> SettingsResult<()> {
        save_to_file(&self.settings, path.as_ref())
    }

    /// Reload settings from file (if path is set).
    pub fn reload(&mut self) -> SettingsResult<()> {
        if let Some(ref path) = self.settings_path {
            self.settings = load_from_file(path)?;
            apply_env_overrides(&mut self.settings)?;
        }
        Ok(())
    }
}

/// Resolve the settings file path using standard locations.
pub fn resolve_settings_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(SETTINGS_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_settings = PathBuf::from(SETTINGS_FILE_NAME);
    if cwd_settings.exists() {
        return Some(cwd_settings);
    }

    default_settings_path().filter(|path| path.exists())
}

/// Per-user settings file location, whether or not it exists.
pub fn default_settings_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "uniserial")
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE_NAME))
}

fn load_from_file(path: &Path) -> SettingsResult<Settings> {
    let content = std::fs::read_to_string(path).map_err(|e| SettingsError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!("loaded settings from {}", path.display());
    let table: toml::Table = toml::from_str(&content)?;
    check_parity(&table)?;
    toml::Value::Table(table)
        .try_into()
        .map_err(SettingsError::ParseError)
}

/// Surface a bad `serial.parity` as the typed config error rather than a
/// generic deserialization failure.
fn check_parity(table: &toml::Table) -> SettingsResult<()> {
    let parity = table
        .get("serial")
        .and_then(|serial| serial.get("parity"))
        .and_then(|parity| parity.as_str());
    if let Some(parity) = parity {
        parity.parse::<crate::config::Parity>()?;
    }
    Ok(())
}

fn save_to_file(settings: &Settings, path: &Path) -> SettingsResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SettingsError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content).map_err(|e| SettingsError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read `UNISERIAL_<key>` and parse it, if set.
fn env_value<T: FromStr>(key: &str, what: &str) -> SettingsResult<Option<T>> {
    let var = format!("{}_{}", ENV_PREFIX, key);
    match std::env::var(&var) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SettingsError::env_parse(var, format!("Invalid {}", what))),
        Err(_) => Ok(None),
    }
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(format!("{}_{}", ENV_PREFIX, key))
        .ok()
        .map(|val| val.eq_ignore_ascii_case("true") || val == "1")
}

/// Apply environment variable overrides (`UNISERIAL_<SECTION>_<KEY>`).
fn apply_env_overrides(settings: &mut Settings) -> SettingsResult<()> {
    let serial = &mut settings.serial;

    if let Some(val) = env_value("SERIAL_BAUD_RATE", "baud rate")? {
        serial.baud_rate = val;
    }
    if let Some(val) = env_value("SERIAL_DATA_BITS", "data bits")? {
        serial.data_bits = val;
    }
    if let Some(val) = env_value("SERIAL_STOP_BITS", "stop bits")? {
        serial.stop_bits = val;
    }
    if let Ok(val) = std::env::var(format!("{}_SERIAL_PARITY", ENV_PREFIX)) {
        serial.parity = val.parse()?;
    }
    if let Some(val) = env_flag("SERIAL_HARDWARE_FLOW_CONTROL") {
        serial.hardware_flow_control = val;
    }
    if let Some(val) = env_flag("SERIAL_CANONICAL") {
        serial.canonical = val;
    }
    if let Some(val) = env_value("SERIAL_INTER_CHARACTER_TIMEOUT_MS", "timeout")? {
        serial.inter_character_timeout_ms = val;
    }
    if let Some(val) = env_value("SERIAL_MINIMUM_READ_SIZE", "minimum read size")? {
        serial.minimum_read_size = val;
    }

    if let Ok(val) = std::env::var(format!("{}_LOGGING_LEVEL", ENV_PREFIX)) {
        settings.logging.level = val;
    }
    if let Some(val) = env_value::<LogFormat>("LOGGING_FORMAT", "log format")? {
        settings.logging.format = val;
    }

    Ok(())
}
