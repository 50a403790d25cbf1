//! Label data model.
//!
//! Everything here is a plain value type: cloning a [`Label`] yields a
//! structurally independent copy, so editing one instance can never reach
//! into another. The logo's `image_url` is an opaque handle and is copied as
//! a string, never resolved or re-encoded.
//!
//! Field names serialize in camelCase so files written by the browser version
//! of the tool import unchanged.

use labelkit_core::units::Unit;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in the label's physical unit, relative to its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Style and placement shared by all six element kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    pub position: Position,
    /// Pixel size; QR edge length or font size depending on the kind
    pub size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Degrees, 0-359
    #[serde(default)]
    pub rotation: f64,
}

impl ElementStyle {
    pub fn new(x: f64, y: f64, size: f64) -> Self {
        Self {
            position: Position::new(x, y),
            size,
            width: None,
            height: None,
            enabled: false,
            color: None,
            rotation: 0.0,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Stored width, or `size` when the width is unset or zero.
    pub fn width_or_size(&self) -> f64 {
        match self.width {
            Some(w) if w != 0.0 => w,
            _ => self.size,
        }
    }

    /// Stored height, or `size` when the height is unset or zero.
    pub fn height_or_size(&self) -> f64 {
        match self.height {
            Some(h) if h != 0.0 => h,
            _ => self.size,
        }
    }

    /// Rotation normalised into `[0, 360)`.
    pub fn normalized_rotation(&self) -> f64 {
        self.rotation.rem_euclid(360.0)
    }
}

/// Horizontal alignment of a text element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Text layout options carried by the text kinds.
///
/// When `multiline` is set, `width`/`height` describe the wrap box in the
/// label's physical unit and must equal the owning element's `width`/`height`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub multiline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
}

fn default_line_height() -> f64 {
    1.2
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            align: TextAlign::Left,
            multiline: false,
            max_width: Some(80.0),
            line_height: default_line_height(),
            width: None,
            height: None,
            color: Some("#000000".to_string()),
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

/// A text-kind element: UUID, custom text, company name or product name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    #[serde(flatten)]
    pub style: ElementStyle,
    #[serde(default)]
    pub text_style: TextStyle,
}

impl TextElement {
    pub fn new(x: f64, y: f64, font_size: f64) -> Self {
        Self {
            style: ElementStyle::new(x, y, font_size),
            text_style: TextStyle::default(),
        }
    }

    /// Fill color: text style first, then element, then black.
    pub fn color(&self) -> &str {
        self.text_style
            .color
            .as_deref()
            .or(self.style.color.as_deref())
            .unwrap_or("#000000")
    }
}

/// The logo element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoElement {
    #[serde(flatten)]
    pub style: ElementStyle,
    /// Opaque image handle (file path or data URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Natural width / height of the attached image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,
}

impl Default for LogoElement {
    fn default() -> Self {
        Self {
            style: ElementStyle::new(60.0, 10.0, 40.0),
            image_url: None,
            aspect_ratio: None,
        }
    }
}

/// The six element kinds a label carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    QrCode,
    Uuid,
    Text,
    CompanyName,
    ProductName,
    Logo,
}

impl ElementKind {
    /// All kinds, in paint order.
    pub const ALL: [ElementKind; 6] = [
        ElementKind::QrCode,
        ElementKind::Logo,
        ElementKind::Uuid,
        ElementKind::Text,
        ElementKind::CompanyName,
        ElementKind::ProductName,
    ];

    /// Key used in serialized labels
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::QrCode => "qrCode",
            ElementKind::Uuid => "uuid",
            ElementKind::Text => "text",
            ElementKind::CompanyName => "companyName",
            ElementKind::ProductName => "productName",
            ElementKind::Logo => "logo",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(
            self,
            ElementKind::Uuid | ElementKind::Text | ElementKind::CompanyName | ElementKind::ProductName
        )
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borrowed view of one element, tagged by shape.
#[derive(Debug, Clone, Copy)]
pub enum ElementRef<'a> {
    Qr(&'a ElementStyle),
    Text(&'a TextElement),
    Logo(&'a LogoElement),
}

impl<'a> ElementRef<'a> {
    pub fn style(&self) -> &'a ElementStyle {
        match self {
            ElementRef::Qr(style) => style,
            ElementRef::Text(text) => &text.style,
            ElementRef::Logo(logo) => &logo.style,
        }
    }
}

/// Mutable view of one element, tagged by shape.
#[derive(Debug)]
pub enum ElementMut<'a> {
    Qr(&'a mut ElementStyle),
    Text(&'a mut TextElement),
    Logo(&'a mut LogoElement),
}

impl ElementMut<'_> {
    pub fn style_mut(&mut self) -> &mut ElementStyle {
        match self {
            ElementMut::Qr(style) => style,
            ElementMut::Text(text) => &mut text.style,
            ElementMut::Logo(logo) => &mut logo.style,
        }
    }
}

/// Per-label element set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelElements {
    pub qr_code: ElementStyle,
    pub uuid: TextElement,
    pub company_name: TextElement,
    pub product_name: TextElement,
    pub text: TextElement,
    #[serde(default)]
    pub logo: LogoElement,
}

impl Default for LabelElements {
    fn default() -> Self {
        Self {
            qr_code: ElementStyle::new(10.0, 10.0, 50.0),
            uuid: TextElement::new(10.0, 35.0, 12.0),
            text: TextElement::new(10.0, 25.0, 14.0),
            company_name: TextElement::new(10.0, 45.0, 14.0),
            product_name: TextElement::new(70.0, 45.0, 14.0),
            logo: LogoElement::default(),
        }
    }
}

impl LabelElements {
    pub fn get(&self, kind: ElementKind) -> ElementRef<'_> {
        match kind {
            ElementKind::QrCode => ElementRef::Qr(&self.qr_code),
            ElementKind::Uuid => ElementRef::Text(&self.uuid),
            ElementKind::Text => ElementRef::Text(&self.text),
            ElementKind::CompanyName => ElementRef::Text(&self.company_name),
            ElementKind::ProductName => ElementRef::Text(&self.product_name),
            ElementKind::Logo => ElementRef::Logo(&self.logo),
        }
    }

    pub fn get_mut(&mut self, kind: ElementKind) -> ElementMut<'_> {
        match kind {
            ElementKind::QrCode => ElementMut::Qr(&mut self.qr_code),
            ElementKind::Uuid => ElementMut::Text(&mut self.uuid),
            ElementKind::Text => ElementMut::Text(&mut self.text),
            ElementKind::CompanyName => ElementMut::Text(&mut self.company_name),
            ElementKind::ProductName => ElementMut::Text(&mut self.product_name),
            ElementKind::Logo => ElementMut::Logo(&mut self.logo),
        }
    }

    pub fn style(&self, kind: ElementKind) -> &ElementStyle {
        self.get(kind).style()
    }

    pub fn style_mut(&mut self, kind: ElementKind) -> &mut ElementStyle {
        match kind {
            ElementKind::QrCode => &mut self.qr_code,
            ElementKind::Uuid => &mut self.uuid.style,
            ElementKind::Text => &mut self.text.style,
            ElementKind::CompanyName => &mut self.company_name.style,
            ElementKind::ProductName => &mut self.product_name.style,
            ElementKind::Logo => &mut self.logo.style,
        }
    }

    /// Text element for a text kind; `None` for the QR code and logo.
    pub fn text_element_mut(&mut self, kind: ElementKind) -> Option<&mut TextElement> {
        match self.get_mut(kind) {
            ElementMut::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Enabled elements other than `kind`.
    pub fn enabled_others(&self, kind: ElementKind) -> Vec<&ElementStyle> {
        ElementKind::ALL
            .iter()
            .filter(|other| **other != kind)
            .map(|other| self.style(*other))
            .filter(|style| style.enabled)
            .collect()
    }

    pub fn enabled_kinds(&self) -> Vec<ElementKind> {
        ElementKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.style(*kind).enabled)
            .collect()
    }

    /// Copy every element position from `source`, leaving all other fields.
    pub fn adopt_positions(&mut self, source: &LabelElements) {
        for kind in ElementKind::ALL {
            self.style_mut(kind).position = source.style(kind).position;
        }
    }
}

/// Optional frame drawn around the label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub enabled: bool,
    /// Stroke width in the label unit
    pub width: f64,
    pub color: String,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            enabled: false,
            width: 0.3,
            color: "#000000".to_string(),
        }
    }
}

/// Label dimensions and the placement envelope.
///
/// Elements must stay inside `[padding, width - padding] x
/// [padding, height - padding]` unless `allow_elements_outside` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSize {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub padding: f64,
    #[serde(default)]
    pub element_spacing: f64,
    #[serde(default)]
    pub prevent_collisions: bool,
    #[serde(default)]
    pub allow_elements_outside: bool,
    #[serde(default)]
    pub border: Border,
}

impl Default for LabelSize {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 50.0,
            unit: Unit::Millimeter,
            padding: 0.0,
            element_spacing: 0.0,
            prevent_collisions: false,
            allow_elements_outside: false,
            border: Border::default(),
        }
    }
}

impl LabelSize {
    pub fn new(width: f64, height: f64, unit: Unit) -> Self {
        Self {
            width,
            height,
            unit,
            ..Self::default()
        }
    }

    /// Rendering pixels per label unit
    pub fn scale_factor(&self) -> f64 {
        self.unit.scale_factor()
    }

    /// Padding as stored, with NaN read as zero. Negative values are kept.
    pub fn effective_padding(&self) -> f64 {
        if self.padding.is_nan() {
            0.0
        } else {
            self.padding
        }
    }

    /// Width and height in PDF points
    pub fn size_points(&self) -> (f64, f64) {
        (self.unit.to_points(self.width), self.unit.to_points(self.height))
    }
}

/// One generated label instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    /// Identity of this instance in the working set
    pub id: String,
    pub size: LabelSize,
    pub elements: LabelElements,
    #[serde(default)]
    pub company_name: String,
    /// Full identifier encoded in the QR code; never edited
    pub uuid: String,
    /// Prefix of `uuid`, recomputed whenever the length setting changes
    pub short_uuid: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub text: String,
}

impl Label {
    /// Text encoded in the QR code
    pub fn qr_payload(&self) -> String {
        format!("{}{}", self.prefix, self.uuid)
    }

    /// Content shown by a text element; `None` for QR code and logo.
    pub fn text_for(&self, kind: ElementKind) -> Option<&str> {
        match kind {
            ElementKind::Uuid => Some(&self.short_uuid),
            ElementKind::Text => Some(&self.text),
            ElementKind::CompanyName => Some(&self.company_name),
            ElementKind::ProductName => Some(&self.product_name),
            ElementKind::QrCode | ElementKind::Logo => None,
        }
    }

    pub fn short_uuid_len(&self) -> usize {
        self.short_uuid.chars().count()
    }
}

/// Starting configuration for a batch of labels.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelTemplate {
    pub size: LabelSize,
    pub elements: LabelElements,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub text: String,
}

impl LabelTemplate {
    /// Enable exactly the given element kinds.
    pub fn with_enabled(mut self, kinds: &[ElementKind]) -> Self {
        for kind in ElementKind::ALL {
            self.elements.style_mut(kind).enabled = kinds.contains(&kind);
        }
        self
    }
}
