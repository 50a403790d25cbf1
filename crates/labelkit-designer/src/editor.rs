//! Interactive label editor controller.
//!
//! [`LabelEditor`] works on a draft copy of one label. Every committed change
//! runs the placement rules: positions are clamped to the label envelope and,
//! when collision prevention is on, moved off other enabled elements. The
//! draft is only written back by [`LabelEditor::save`].

use crate::collision::resolve_placement;
use crate::constraints::{constrain_element, constrain_element_at, position_limits};
use crate::logo::Dimension;
use crate::model::{ElementKind, Label, LabelSize, Position, TextAlign};
use crate::text_layout::{text_dimensions, TextMeasure};
use labelkit_core::units::px_to_units;
use labelkit_core::ValidationError;
use tracing::debug;

/// Padding applied when padding is switched on
pub const DEFAULT_PADDING: f64 = 5.0;
/// Element spacing applied when spacing is switched on
pub const DEFAULT_ELEMENT_SPACING: f64 = 1.0;
/// Smallest element size that passes validation
pub const MIN_ELEMENT_SIZE: f64 = 1.0;

#[derive(Debug, Clone, Copy)]
struct DragState {
    kind: ElementKind,
    pointer_start: (f64, f64),
    element_start: Position,
}

/// Problems found on a single element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementValidation {
    pub x_out_of_range: bool,
    pub y_out_of_range: bool,
    pub size_too_small: bool,
}

impl ElementValidation {
    pub fn is_valid(&self) -> bool {
        !(self.x_out_of_range || self.y_out_of_range || self.size_too_small)
    }
}

/// Editing session for one label
#[derive(Debug, Clone)]
pub struct LabelEditor {
    original: Label,
    draft: Label,
    padding_enabled: bool,
    spacing_enabled: bool,
    drag: Option<DragState>,
    dirty: bool,
}

fn invalid(field: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

impl LabelEditor {
    pub fn new(label: &Label) -> Self {
        Self {
            original: label.clone(),
            draft: label.clone(),
            padding_enabled: label.size.padding > 0.0,
            spacing_enabled: label.size.element_spacing > 0.0,
            drag: None,
            dirty: false,
        }
    }

    /// The current draft, including unsaved edits
    pub fn draft(&self) -> &Label {
        &self.draft
    }

    pub fn size(&self) -> &LabelSize {
        &self.draft.size
    }

    pub fn scale(&self) -> f64 {
        self.draft.size.scale_factor()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_padding_enabled(&self) -> bool {
        self.padding_enabled
    }

    pub fn is_spacing_enabled(&self) -> bool {
        self.spacing_enabled
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Start dragging `kind` from a pointer position in screen pixels.
    pub fn begin_drag(&mut self, kind: ElementKind, pointer_x: f64, pointer_y: f64) {
        self.drag = Some(DragState {
            kind,
            pointer_start: (pointer_x, pointer_y),
            element_start: self.draft.elements.style(kind).position,
        });
    }

    /// Move the dragged element with the pointer.
    ///
    /// The pixel delta is converted with the label's scale factor and the
    /// result clamped to the envelope. Returns the new position, or `None`
    /// when no drag is active.
    pub fn drag_to(&mut self, pointer_x: f64, pointer_y: f64) -> Option<Position> {
        let drag = self.drag?;
        let unit = self.draft.size.unit;
        let target = Position::new(
            drag.element_start.x + px_to_units(pointer_x - drag.pointer_start.0, unit),
            drag.element_start.y + px_to_units(pointer_y - drag.pointer_start.1, unit),
        );
        let size = self.draft.size.clone();
        let style = self.draft.elements.style_mut(drag.kind);
        style.position = constrain_element_at(style, target, &size);
        self.dirty = true;
        Some(style.position)
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Place `kind` at `position`, applying the envelope and collision rules.
    pub fn move_element(&mut self, kind: ElementKind, position: Position) -> Position {
        let size = self.draft.size.clone();
        let constrained = constrain_element_at(self.draft.elements.style(kind), position, &size);
        self.draft.elements.style_mut(kind).position = constrained;
        let resolved = self.resolve(kind);
        self.dirty = true;
        resolved
    }

    fn resolve(&mut self, kind: ElementKind) -> Position {
        let scale = self.scale();
        let elements = &self.draft.elements;
        let resolved = resolve_placement(
            elements.style(kind),
            &elements.enabled_others(kind),
            &self.draft.size,
            scale,
        );
        self.draft.elements.style_mut(kind).position = resolved;
        resolved
    }

    fn reconstrain(&mut self, kind: ElementKind) {
        let size = self.draft.size.clone();
        let style = self.draft.elements.style_mut(kind);
        style.position = constrain_element(style, &size);
    }

    /// Enable or disable an element; enabling resolves its placement.
    pub fn set_enabled(&mut self, kind: ElementKind, enabled: bool) {
        self.draft.elements.style_mut(kind).enabled = enabled;
        if enabled {
            self.reconstrain(kind);
            self.resolve(kind);
        }
        self.dirty = true;
    }

    /// Change an element's pixel size.
    pub fn resize_element(&mut self, kind: ElementKind, size: f64) -> Result<(), ValidationError> {
        if !size.is_finite() {
            return Err(invalid("size", format!("{} is not a number", size)));
        }
        self.draft.elements.style_mut(kind).size = size;
        self.reconstrain(kind);
        self.dirty = true;
        Ok(())
    }

    /// Resize the wrap box of a multiline text element.
    ///
    /// Element and text style dimensions are updated together.
    pub fn resize_text_box(
        &mut self,
        kind: ElementKind,
        width: f64,
        height: f64,
    ) -> Result<(), ValidationError> {
        if !(width > 0.0 && height > 0.0) {
            return Err(invalid(
                "textBox",
                format!("dimensions must be > 0, got {} x {}", width, height),
            ));
        }
        let text = self
            .draft
            .elements
            .text_element_mut(kind)
            .ok_or_else(|| invalid("textBox", format!("{} is not a text element", kind)))?;
        if !text.text_style.multiline {
            return Err(invalid("textBox", format!("{} is not multiline", kind)));
        }
        text.style.width = Some(width);
        text.style.height = Some(height);
        text.text_style.width = Some(width);
        text.text_style.height = Some(height);
        self.dirty = true;
        Ok(())
    }

    /// Switch multiline wrapping on or off for a text element.
    ///
    /// Turning it on sizes the wrap box from the current content, wrapped at
    /// the style's maximum width (or the label width). Turning it off clears
    /// the box.
    pub fn set_multiline(
        &mut self,
        kind: ElementKind,
        multiline: bool,
        measure: &dyn TextMeasure,
    ) -> Result<(), ValidationError> {
        let scale = self.scale();
        let label_width_px = self.draft.size.width * scale;
        let content = self.draft.text_for(kind).unwrap_or_default().to_string();
        let text = self
            .draft
            .elements
            .text_element_mut(kind)
            .ok_or_else(|| invalid("multiline", format!("{} is not a text element", kind)))?;

        text.text_style.multiline = multiline;
        if multiline {
            let max_width = text.text_style.max_width.unwrap_or(label_width_px);
            let extent = text_dimensions(
                &content,
                text.style.size,
                max_width,
                &text.text_style,
                measure,
            );
            let width = extent.width.max(text.style.size) / scale;
            let height = extent.height / scale;
            text.style.width = Some(width);
            text.style.height = Some(height);
            text.text_style.width = Some(width);
            text.text_style.height = Some(height);
        } else {
            text.style.width = None;
            text.style.height = None;
            text.text_style.width = None;
            text.text_style.height = None;
        }
        self.dirty = true;
        Ok(())
    }

    pub fn set_align(&mut self, kind: ElementKind, align: TextAlign) -> Result<(), ValidationError> {
        let text = self
            .draft
            .elements
            .text_element_mut(kind)
            .ok_or_else(|| invalid("align", format!("{} is not a text element", kind)))?;
        text.text_style.align = align;
        self.dirty = true;
        Ok(())
    }

    /// Text kinds store their color on the text style, others on the element.
    pub fn set_color(&mut self, kind: ElementKind, color: impl Into<String>) {
        let color = color.into();
        match self.draft.elements.text_element_mut(kind) {
            Some(text) => text.text_style.color = Some(color),
            None => self.draft.elements.style_mut(kind).color = Some(color),
        }
        self.dirty = true;
    }

    pub fn set_rotation(&mut self, kind: ElementKind, degrees: f64) {
        if degrees.is_finite() {
            self.draft.elements.style_mut(kind).rotation = degrees.rem_euclid(360.0);
            self.dirty = true;
        }
    }

    pub fn set_content(&mut self, kind: ElementKind, value: impl Into<String>) -> Result<(), ValidationError> {
        let value = value.into();
        match kind {
            ElementKind::Text => self.draft.text = value,
            ElementKind::CompanyName => self.draft.company_name = value,
            ElementKind::ProductName => self.draft.product_name = value,
            _ => return Err(invalid("content", format!("{} content is not editable", kind))),
        }
        self.dirty = true;
        Ok(())
    }

    /// Attach a PNG logo; non-PNG or oversized files are rejected.
    pub fn attach_logo(&mut self, url: impl Into<String>, bytes: &[u8]) -> Result<(), ValidationError> {
        self.draft.elements.logo.attach_image(url, bytes)?;
        self.dirty = true;
        Ok(())
    }

    pub fn rotate_logo(&mut self) {
        self.draft.elements.logo.rotate_quarter();
        self.dirty = true;
    }

    pub fn set_logo_dimension(&mut self, dimension: Dimension, value: f64) -> bool {
        let changed = self.draft.elements.logo.set_dimension(dimension, value);
        self.dirty |= changed;
        changed
    }

    pub fn remove_logo(&mut self) {
        self.draft.elements.logo.remove_image();
        self.dirty = true;
    }

    /// Toggle padding between [`DEFAULT_PADDING`] and zero.
    pub fn set_padding_enabled(&mut self, enabled: bool) {
        self.padding_enabled = enabled;
        self.draft.size.padding = if enabled { DEFAULT_PADDING } else { 0.0 };
        self.dirty = true;
    }

    /// Returns `false` for negative or NaN input, which is ignored.
    pub fn set_padding(&mut self, padding: f64) -> bool {
        if !(padding >= 0.0) {
            return false;
        }
        self.draft.size.padding = padding;
        self.dirty = true;
        true
    }

    /// Toggle element spacing between [`DEFAULT_ELEMENT_SPACING`] and zero.
    pub fn set_spacing_enabled(&mut self, enabled: bool) {
        self.spacing_enabled = enabled;
        self.draft.size.element_spacing = if enabled {
            DEFAULT_ELEMENT_SPACING
        } else {
            0.0
        };
        self.dirty = true;
    }

    /// Returns `false` for negative or NaN input, which is ignored.
    pub fn set_spacing(&mut self, spacing: f64) -> bool {
        if !(spacing >= 0.0) {
            return false;
        }
        self.draft.size.element_spacing = spacing;
        self.dirty = true;
        true
    }

    pub fn set_prevent_collisions(&mut self, enabled: bool) {
        self.draft.size.prevent_collisions = enabled;
        self.dirty = true;
    }

    pub fn set_allow_outside(&mut self, enabled: bool) {
        self.draft.size.allow_elements_outside = enabled;
        self.dirty = true;
    }

    /// Check an element's position against the envelope and its size
    /// against [`MIN_ELEMENT_SIZE`].
    pub fn validate_element(&self, kind: ElementKind) -> ElementValidation {
        let style = self.draft.elements.style(kind);
        let mut result = ElementValidation {
            size_too_small: style.size < MIN_ELEMENT_SIZE,
            ..ElementValidation::default()
        };
        if let Some(limits) = position_limits(style.size, &self.draft.size, style.width) {
            let p = style.position;
            result.x_out_of_range = p.x < limits.min_x || p.x > limits.max_x;
            result.y_out_of_range = p.y < limits.min_y || p.y > limits.max_y;
        }
        result
    }

    /// Validation results for every enabled element that has a problem
    pub fn invalid_elements(&self) -> Vec<(ElementKind, ElementValidation)> {
        self.draft
            .elements
            .enabled_kinds()
            .into_iter()
            .map(|kind| (kind, self.validate_element(kind)))
            .filter(|(_, validation)| !validation.is_valid())
            .collect()
    }

    /// Commit the draft and return the edited label.
    pub fn save(&mut self) -> Label {
        self.drag = None;
        self.dirty = false;
        self.original = self.draft.clone();
        debug!("Saved edits to label {}", self.draft.id);
        self.draft.clone()
    }

    /// Drop every unsaved edit.
    pub fn cancel(&mut self) {
        self.draft = self.original.clone();
        self.padding_enabled = self.draft.size.padding > 0.0;
        self.spacing_enabled = self.draft.size.element_spacing > 0.0;
        self.drag = None;
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::generate_labels;
    use crate::model::LabelTemplate;
    use crate::text_layout::ApproxMeasure;

    fn editor() -> LabelEditor {
        let template = LabelTemplate::default().with_enabled(&[ElementKind::QrCode, ElementKind::Uuid]);
        let labels = generate_labels(1, &template, 8).unwrap();
        LabelEditor::new(&labels[0])
    }

    #[test]
    fn test_drag_converts_pixels_to_units() {
        let mut editor = editor();
        let scale = editor.scale();
        editor.begin_drag(ElementKind::QrCode, 100.0, 100.0);
        let p = editor.drag_to(100.0 + 5.0 * scale, 100.0).unwrap();
        assert!((p.x - 15.0).abs() < 1e-9);
        assert_eq!(p.y, 10.0);
        assert!(editor.is_dirty());
        editor.end_drag();
        assert!(editor.drag_to(0.0, 0.0).is_none());
    }

    #[test]
    fn test_drag_is_clamped() {
        let mut editor = editor();
        editor.begin_drag(ElementKind::QrCode, 0.0, 0.0);
        let p = editor.drag_to(-10_000.0, -10_000.0).unwrap();
        assert_eq!(p, Position::new(0.0, 0.0));
    }

    #[test]
    fn test_padding_toggle_values() {
        let mut editor = editor();
        editor.set_padding_enabled(true);
        assert_eq!(editor.size().padding, 5.0);
        editor.set_spacing_enabled(true);
        assert_eq!(editor.size().element_spacing, 1.0);
        editor.set_padding_enabled(false);
        assert_eq!(editor.size().padding, 0.0);
        assert!(!editor.set_spacing(-1.0));
        assert!(!editor.set_padding(f64::NAN));
        assert_eq!(editor.size().element_spacing, 1.0);
    }

    #[test]
    fn test_move_resolves_collisions() {
        let mut editor = editor();
        editor.set_prevent_collisions(true);
        let qr = editor.draft().elements.qr_code.position;
        let p = editor.move_element(ElementKind::Uuid, qr);
        assert_ne!(p, qr);
    }

    #[test]
    fn test_validate_flags_small_size_and_out_of_range() {
        let mut editor = editor();
        editor.set_allow_outside(true);
        editor.move_element(ElementKind::QrCode, Position::new(-5.0, 200.0));
        editor.set_allow_outside(false);
        editor.resize_element(ElementKind::Uuid, 0.5).unwrap();
        let qr = editor.validate_element(ElementKind::QrCode);
        assert!(qr.x_out_of_range && qr.y_out_of_range);
        assert!(editor.validate_element(ElementKind::Uuid).size_too_small);
        assert_eq!(editor.invalid_elements().len(), 2);
    }

    #[test]
    fn test_multiline_box_is_kept_in_sync() {
        let mut editor = editor();
        editor.set_content(ElementKind::Text, "several words of custom text").unwrap();
        editor
            .set_multiline(ElementKind::Text, true, &ApproxMeasure::default())
            .unwrap();
        let text = &editor.draft().elements.text;
        assert_eq!(text.style.width, text.text_style.width);
        assert!(text.style.height.unwrap() > 0.0);

        editor.resize_text_box(ElementKind::Text, 30.0, 12.0).unwrap();
        let text = &editor.draft().elements.text;
        assert_eq!(text.style.width, Some(30.0));
        assert_eq!(text.text_style.height, Some(12.0));

        assert!(editor.resize_text_box(ElementKind::QrCode, 1.0, 1.0).is_err());
        assert!(editor.resize_text_box(ElementKind::Text, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_cancel_discards_draft() {
        let mut editor = editor();
        let before = editor.draft().clone();
        editor.set_rotation(ElementKind::QrCode, 450.0);
        assert_eq!(editor.draft().elements.qr_code.rotation, 90.0);
        editor.cancel();
        assert_eq!(editor.draft(), &before);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_save_returns_draft() {
        let mut editor = editor();
        editor.set_content(ElementKind::ProductName, "Bolt").unwrap();
        editor.set_color(ElementKind::QrCode, "#112233");
        let saved = editor.save();
        assert_eq!(saved.product_name, "Bolt");
        assert_eq!(saved.elements.qr_code.color.as_deref(), Some("#112233"));
        assert!(!editor.is_dirty());
        editor.cancel();
        assert_eq!(editor.draft().product_name, "Bolt");
    }
}
