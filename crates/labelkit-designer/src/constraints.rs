//! Placement constraint solver.
//!
//! Keeps an element inside `[padding, width - padding] x [padding, height -
//! padding]` of its label. An element larger than that envelope pins to the
//! padding origin instead of failing.

use crate::model::{ElementStyle, LabelSize, Position};

/// Legal range for an element's top-left corner, per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionLimits {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl PositionLimits {
    pub fn contains(&self, position: Position) -> bool {
        position.x >= self.min_x
            && position.x <= self.max_x
            && position.y >= self.min_y
            && position.y <= self.max_y
    }

    /// Clamp to the limits; the lower bound wins when the range is inverted.
    pub fn clamp(&self, position: Position) -> Position {
        Position::new(
            position.x.min(self.max_x).max(self.min_x),
            position.y.min(self.max_y).max(self.min_y),
        )
    }
}

/// Limits for an element of the given pixel size on `label`.
///
/// Returns `None` when the label allows elements outside its bounds.
pub fn position_limits(
    element_size_px: f64,
    label: &LabelSize,
    element_width_px: Option<f64>,
) -> Option<PositionLimits> {
    if label.allow_elements_outside {
        return None;
    }

    let scale = label.scale_factor();
    let padding = label.effective_padding();
    let width_px = match element_width_px {
        Some(w) if w != 0.0 => w,
        _ => element_size_px,
    };
    let width_units = width_px / scale;
    let height_units = element_size_px / scale;

    Some(PositionLimits {
        min_x: padding,
        max_x: label.width - width_units - padding,
        min_y: padding,
        max_y: label.height - height_units - padding,
    })
}

/// Clamp `position` so the element stays inside the label envelope.
pub fn constrain_position(
    position: Position,
    element_size_px: f64,
    label: &LabelSize,
    element_width_px: Option<f64>,
) -> Position {
    match position_limits(element_size_px, label, element_width_px) {
        Some(limits) => limits.clamp(position),
        None => position,
    }
}

/// Constrain an element at an arbitrary candidate position
pub fn constrain_element_at(element: &ElementStyle, position: Position, label: &LabelSize) -> Position {
    constrain_position(position, element.size, label, element.width)
}

/// Constrain an element at its own position
pub fn constrain_element(element: &ElementStyle, label: &LabelSize) -> Position {
    constrain_element_at(element, element.position, label)
}
