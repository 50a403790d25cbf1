//! Unit conversion utilities
//!
//! Maps the physical units a label or page is measured in to the two other
//! coordinate spaces the application works with:
//! - rendering pixels (96 px per inch, the CSS pixel definition)
//! - PDF points (72 pt per inch, rounded per unit)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pixels per millimeter
pub const PX_PER_MM: f64 = 3.779528;
/// Pixels per centimeter
pub const PX_PER_CM: f64 = 37.79528;
/// Pixels per inch
pub const PX_PER_IN: f64 = 96.0;

/// PDF points per millimeter
pub const PT_PER_MM: f64 = 2.835;
/// PDF points per centimeter
pub const PT_PER_CM: f64 = 28.35;
/// PDF points per inch
pub const PT_PER_IN: f64 = 72.0;

/// Physical unit a label is measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Millimeters
    #[serde(rename = "mm")]
    Millimeter,
    /// Centimeters
    #[serde(rename = "cm")]
    Centimeter,
    /// Inches
    #[serde(rename = "in")]
    Inch,
}

impl Default for Unit {
    fn default() -> Self {
        Self::Millimeter
    }
}

impl Unit {
    /// Rendering pixels per unit.
    pub fn scale_factor(self) -> f64 {
        match self {
            Self::Millimeter => PX_PER_MM,
            Self::Centimeter => PX_PER_CM,
            Self::Inch => PX_PER_IN,
        }
    }

    /// Convert a length in this unit to PDF points.
    pub fn to_points(self, value: f64) -> f64 {
        match self {
            Self::Millimeter => value * PT_PER_MM,
            Self::Centimeter => value * PT_PER_CM,
            Self::Inch => value * PT_PER_IN,
        }
    }

    /// Short label ("mm", "cm" or "in")
    pub fn label(self) -> &'static str {
        match self {
            Self::Millimeter => "mm",
            Self::Centimeter => "cm",
            Self::Inch => "in",
        }
    }

    /// Parse a unit, falling back to millimeters for anything unrecognised.
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mm" | "millimeter" | "millimeters" => Ok(Self::Millimeter),
            "cm" | "centimeter" | "centimeters" => Ok(Self::Centimeter),
            "in" | "inch" | "inches" => Ok(Self::Inch),
            _ => Err(format!("Unknown unit: {}", s)),
        }
    }
}

/// Physical unit a printable page is measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageUnit {
    /// Millimeters
    #[serde(rename = "mm")]
    Millimeter,
    /// Centimeters
    #[serde(rename = "cm")]
    Centimeter,
}

impl Default for PageUnit {
    fn default() -> Self {
        Self::Millimeter
    }
}

impl PageUnit {
    /// Convert a length in this unit to PDF points.
    pub fn to_points(self, value: f64) -> f64 {
        Unit::from(self).to_points(value)
    }
}

impl From<PageUnit> for Unit {
    fn from(unit: PageUnit) -> Self {
        match unit {
            PageUnit::Millimeter => Unit::Millimeter,
            PageUnit::Centimeter => Unit::Centimeter,
        }
    }
}

impl fmt::Display for PageUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Unit::from(*self).fmt(f)
    }
}

impl FromStr for PageUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Unit>()? {
            Unit::Millimeter => Ok(Self::Millimeter),
            Unit::Centimeter => Ok(Self::Centimeter),
            Unit::Inch => Err("Pages are measured in mm or cm".to_string()),
        }
    }
}

/// Rendering pixels per unit for the given label unit.
pub fn scale_factor(unit: Unit) -> f64 {
    unit.scale_factor()
}

/// Convert pixels to the given unit.
pub fn px_to_units(px: f64, unit: Unit) -> f64 {
    px / unit.scale_factor()
}

/// Format a length for display, e.g. `"12.500 mm"`
pub fn format_length(value: f64, unit: Unit) -> String {
    format!("{:.3} {}", value, unit.label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_factors() {
        assert_eq!(scale_factor(Unit::Millimeter), 3.779528);
        assert_eq!(scale_factor(Unit::Centimeter), 37.79528);
        assert_eq!(scale_factor(Unit::Inch), 96.0);
    }

    #[test]
    fn test_cm_is_ten_mm() {
        let mm = Unit::Millimeter.scale_factor() * 10.0;
        assert!((mm - Unit::Centimeter.scale_factor()).abs() < 1e-9);
    }

    #[test]
    fn test_point_conversion() {
        assert!((Unit::Millimeter.to_points(210.0) - 595.35).abs() < 1e-9);
        assert!((Unit::Centimeter.to_points(2.0) - 56.7).abs() < 1e-9);
        assert_eq!(Unit::Inch.to_points(1.0), 72.0);
        assert_eq!(PageUnit::Centimeter.to_points(1.0), 28.35);
    }

    #[test]
    fn test_unknown_unit_falls_back_to_mm() {
        assert_eq!(Unit::parse_or_default("furlong"), Unit::Millimeter);
        assert_eq!(Unit::parse_or_default("in"), Unit::Inch);
        assert!("furlong".parse::<Unit>().is_err());
    }

    #[test]
    fn test_page_unit_rejects_inches() {
        assert_eq!("cm".parse::<PageUnit>(), Ok(PageUnit::Centimeter));
        assert!("in".parse::<PageUnit>().is_err());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Unit::Inch).unwrap(), "\"in\"");
        let unit: Unit = serde_json::from_str("\"cm\"").unwrap();
        assert_eq!(unit, Unit::Centimeter);
    }

    #[test]
    fn test_px_to_units() {
        assert!((px_to_units(96.0, Unit::Inch) - 1.0).abs() < 1e-12);
        assert_eq!(format_length(12.5, Unit::Millimeter), "12.500 mm");
    }
}
