//! LabelKit Settings Crate
//!
//! Handles the configuration file: template defaults, page geometry and
//! export preferences, stored as JSON or TOML.

pub mod config;
pub mod error;

pub use config::{
    Config, ExportSettings, LayoutMode, TemplateSettings, APP_DIR, CONFIG_FILE_NAME,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
