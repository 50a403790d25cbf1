//! Configuration file handling for LabelKit
//!
//! Supports JSON and TOML files, chosen by extension. Configuration is
//! organized into sections:
//! - Template defaults for newly generated labels
//! - Page geometry for packed PDF export
//! - Export preferences (layout, quality, output location)

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
use labelkit_core::{PageSettings, Unit};
use labelkit_designer::{
    Border, ElementKind, LabelSize, LabelTemplate, DEFAULT_UUID_LENGTH, MAX_UUID_LENGTH,
    MIN_UUID_LENGTH,
};
use labelkit_export::{ExportOptions, PdfLayout, DEFAULT_SUPERSAMPLE, PDF_FILE_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Name of the application's config directory
pub const APP_DIR: &str = "labelkit";

/// File name used by [`Config::default_path`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Defaults for newly generated labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Number of labels to generate
    pub quantity: usize,
    /// Prepended to the UUID in the QR payload
    pub prefix: String,
    /// Characters of the UUID shown on the label
    pub uuid_length: usize,
    pub company_name: String,
    pub text: String,
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
    pub padding: f64,
    pub prevent_collisions: bool,
    pub allow_elements_outside: bool,
    pub border: Border,
    /// Element kinds switched on in new labels
    pub enabled_elements: Vec<ElementKind>,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            quantity: 1,
            prefix: String::new(),
            uuid_length: DEFAULT_UUID_LENGTH,
            company_name: String::new(),
            text: String::new(),
            width: 100.0,
            height: 50.0,
            unit: Unit::Millimeter,
            padding: 0.0,
            prevent_collisions: false,
            allow_elements_outside: false,
            border: Border::default(),
            enabled_elements: vec![ElementKind::QrCode, ElementKind::Uuid],
        }
    }
}

/// PDF layout choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// One label per page, page sized to the label
    #[default]
    Single,
    /// Labels packed onto the configured page
    Grid,
}

impl std::fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Grid => write!(f, "grid"),
        }
    }
}

impl FromStr for LayoutMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "grid" | "multiple" => Ok(Self::Grid),
            other => Err(ConfigError::out_of_range("export.layout", other)),
        }
    }
}

/// Export preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub layout: LayoutMode,
    /// Rasterization supersampling factor
    pub supersample: u32,
    pub output_dir: PathBuf,
    pub pdf_file_name: String,
    pub json_file_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            layout: LayoutMode::Single,
            supersample: DEFAULT_SUPERSAMPLE,
            output_dir: PathBuf::from("."),
            pdf_file_name: PDF_FILE_NAME.to_string(),
            json_file_name: labelkit_designer::LABELS_FILE_NAME.to_string(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub template: TemplateSettings,
    pub page: PageSettings,
    pub export: ExportSettings,
}

#[derive(Clone, Copy)]
enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> ConfigResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// `<config_dir>/labelkit/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory on this platform".to_string())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;
        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            info!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let template = &self.template;
        if template.quantity == 0 {
            return Err(ConfigError::out_of_range("template.quantity", template.quantity));
        }
        if !(MIN_UUID_LENGTH..=MAX_UUID_LENGTH).contains(&template.uuid_length) {
            return Err(ConfigError::out_of_range(
                "template.uuid_length",
                template.uuid_length,
            ));
        }
        if !(template.width > 0.0) {
            return Err(ConfigError::out_of_range("template.width", template.width));
        }
        if !(template.height > 0.0) {
            return Err(ConfigError::out_of_range("template.height", template.height));
        }
        if !(template.padding >= 0.0) {
            return Err(ConfigError::out_of_range("template.padding", template.padding));
        }
        if !(template.border.width >= 0.0) {
            return Err(ConfigError::out_of_range(
                "template.border.width",
                template.border.width,
            ));
        }

        self.page
            .validate()
            .map_err(|e| ConfigError::InvalidPage(e.to_string()))?;

        if self.export.supersample == 0 {
            return Err(ConfigError::out_of_range("export.supersample", 0));
        }
        if self.export.pdf_file_name.trim().is_empty() {
            return Err(ConfigError::out_of_range("export.pdf_file_name", "\"\""));
        }
        Ok(())
    }

    /// Template for [`labelkit_designer::generate_labels`]
    pub fn to_template(&self) -> LabelTemplate {
        let t = &self.template;
        let size = LabelSize {
            padding: t.padding,
            prevent_collisions: t.prevent_collisions,
            allow_elements_outside: t.allow_elements_outside,
            border: t.border.clone(),
            ..LabelSize::new(t.width, t.height, t.unit)
        };
        LabelTemplate {
            size,
            company_name: t.company_name.clone(),
            prefix: t.prefix.clone(),
            text: t.text.clone(),
            ..LabelTemplate::default()
        }
        .with_enabled(&t.enabled_elements)
    }

    pub fn pdf_layout(&self) -> PdfLayout {
        match self.export.layout {
            LayoutMode::Single => PdfLayout::SinglePerPage,
            LayoutMode::Grid => PdfLayout::Grid(self.page),
        }
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            layout: self.pdf_layout(),
            supersample: self.export.supersample,
            file_name: self.export.pdf_file_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.template.uuid_length, 8);
        assert_eq!(config.export.supersample, 4);
        assert_eq!(config.page, PageSettings::a4());
    }

    #[test]
    fn test_uuid_length_range() {
        let mut config = Config::default();
        config.template.uuid_length = 3;
        assert!(config.validate().is_err());
        config.template.uuid_length = 36;
        assert!(config.validate().is_ok());
        config.template.uuid_length = 37;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_degenerate_values() {
        let mut config = Config::default();
        config.export.supersample = 0;
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::out_of_range("export.supersample", 0)
        );

        let mut config = Config::default();
        config.page.spacing = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPage(_))));

        let mut config = Config::default();
        config.template.width = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_template() {
        let mut config = Config::default();
        config.template.prefix = "SKU-".to_string();
        config.template.unit = Unit::Inch;
        config.template.width = 4.0;
        config.template.height = 2.0;
        let template = config.to_template();

        assert_eq!(template.prefix, "SKU-");
        assert_eq!(template.size.unit, Unit::Inch);
        assert_eq!(template.size.width, 4.0);
        assert!(template.elements.qr_code.enabled);
        assert!(template.elements.uuid.style.enabled);
        assert!(!template.elements.logo.style.enabled);
    }

    #[test]
    fn test_layout_mode_parsing() {
        assert_eq!("grid".parse::<LayoutMode>().unwrap(), LayoutMode::Grid);
        assert_eq!("Single".parse::<LayoutMode>().unwrap(), LayoutMode::Single);
        assert!("sheet".parse::<LayoutMode>().is_err());

        let mut config = Config::default();
        config.export.layout = LayoutMode::Grid;
        assert_eq!(config.pdf_layout(), PdfLayout::Grid(PageSettings::a4()));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = Config::default()
            .save_to_file(Path::new("config.yaml"))
            .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Config(ConfigError::UnsupportedFormat(_))
        ));
    }
}
