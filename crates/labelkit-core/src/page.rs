//! Printable page geometry for multi-label export.

use crate::error::ConfigurationError;
use crate::units::PageUnit;
use serde::{Deserialize, Serialize};

/// Physical page a grid of labels is packed onto.
///
/// Independent of any label's own size. Margins and spacing share the page
/// unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSettings {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub unit: PageUnit,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    /// Gap between neighbouring labels (not applied after the last one)
    pub spacing: f64,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageSettings {
    /// A4 portrait with 10 mm margins and 2 mm spacing
    pub fn a4() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            unit: PageUnit::Millimeter,
            margin_top: 10.0,
            margin_right: 10.0,
            margin_bottom: 10.0,
            margin_left: 10.0,
            spacing: 2.0,
        }
    }

    /// Page size in PDF points
    pub fn size_points(&self) -> (f64, f64) {
        (self.unit.to_points(self.width), self.unit.to_points(self.height))
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ConfigurationError::InvalidPageSettings {
                reason: format!(
                    "page dimensions must be > 0, got {} x {}",
                    self.width, self.height
                ),
            });
        }
        let margins = [
            ("marginTop", self.margin_top),
            ("marginRight", self.margin_right),
            ("marginBottom", self.margin_bottom),
            ("marginLeft", self.margin_left),
            ("spacing", self.spacing),
        ];
        for (name, value) in margins {
            if !(value >= 0.0) {
                return Err(ConfigurationError::InvalidPageSettings {
                    reason: format!("{} must be >= 0, got {}", name, value),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_a4() {
        let page = PageSettings::default();
        assert_eq!(page.width, 210.0);
        assert_eq!(page.height, 297.0);
        assert_eq!(page.spacing, 2.0);
        assert!(page.validate().is_ok());
    }

    #[test]
    fn test_negative_margin_rejected() {
        let mut page = PageSettings::a4();
        page.margin_left = -1.0;
        assert!(page.validate().is_err());
    }

    #[test]
    fn test_zero_size_rejected() {
        let page = PageSettings {
            width: 0.0,
            ..PageSettings::a4()
        };
        assert!(page.validate().is_err());
    }

    #[test]
    fn test_camel_case_wire_format() {
        let json = serde_json::to_value(PageSettings::a4()).unwrap();
        assert_eq!(json["marginTop"], 10.0);
        assert_eq!(json["unit"], "mm");
    }
}
