//! Axis-aligned bounding boxes for positioned elements.
//!
//! Bounds are expressed in the label's physical unit. Element sizes are
//! stored in rendering pixels and divided by the unit's scale factor.

use crate::model::{ElementStyle, Position};

/// Axis-aligned rectangle in label units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Bounds {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Box anchored at `origin` with the given extent.
    pub fn from_origin(origin: Position, width: f64, height: f64) -> Self {
        Self::new(origin.x, origin.y, origin.x + width, origin.y + height)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Strict overlap test; boxes that share an edge do not overlap.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        !(self.right <= other.left
            || other.right <= self.left
            || self.bottom <= other.top
            || other.bottom <= self.top)
    }
}

/// Width and height of an element in label units.
///
/// Width is the stored `width` (or `size` when unset); height is always `size`.
pub fn element_extent(element: &ElementStyle, scale: f64) -> (f64, f64) {
    (element.width_or_size() / scale, element.size / scale)
}

/// Bounding box of an element at its current position
pub fn element_bounds(element: &ElementStyle, scale: f64) -> Bounds {
    element_bounds_at(element, element.position, scale)
}

/// Bounding box the element would have at `position`
pub fn element_bounds_at(element: &ElementStyle, position: Position, scale: f64) -> Bounds {
    let (width, height) = element_extent(element, scale);
    Bounds::from_origin(position, width, height)
}

pub fn overlaps(a: &Bounds, b: &Bounds) -> bool {
    a.overlaps(b)
}
