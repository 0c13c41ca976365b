//! Settings for the `uniserial` binary.
//!
//! TOML-based defaults for port configuration and logging, with environment
//! variable overrides.
//!
//! # Resolution
//!
//! The settings file is looked up in this order:
//!
//! 1. `UNISERIAL_CONFIG` environment variable (explicit path)
//! 2. `./uniserial.toml` (current directory)
//! 3. `uniserial.toml` in the per-user config directory
//!    (`~/.config/uniserial/` on Linux, `%APPDATA%\uniserial\config\` on Windows)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `UNISERIAL_<SECTION>_<KEY>`, for example
//! `UNISERIAL_SERIAL_BAUD_RATE=9600` or `UNISERIAL_LOGGING_FORMAT=json`.
//!
//! # Example
//!
//! ```rust,no_run
//! use uniserial::settings::SettingsLoader;
//!
//! let loader = SettingsLoader::load()?;
//! let request = loader.settings().serial.request_for("arduino");
//! println!("{} at {} baud", request.port_name, request.baud_rate);
//! # Ok::<(), uniserial::settings::SettingsError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{SettingsError, SettingsResult};
pub use loader::{default_settings_path, resolve_settings_path, SettingsLoader};
pub use schema::{LogFormat, LoggingSettings, SerialSettings, Settings};
