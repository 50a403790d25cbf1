//! Collision resolver.
//!
//! When collision prevention is on, an element that overlaps another enabled
//! element is moved to the first free point of a coarse grid over the legal
//! interior. The grid has `GRID_DIVISIONS + 1` points per axis and is scanned
//! with x in the outer loop. If every grid point collides, the element keeps
//! its constrained original position and the overlap is accepted.

use crate::constraints::constrain_element;
use crate::geometry::{element_bounds, element_bounds_at, element_extent, Bounds};
use crate::model::{ElementStyle, LabelSize, Position};
use tracing::debug;

/// Number of steps per axis in the placement search grid
pub const GRID_DIVISIONS: u32 = 10;

fn collides(candidate: &Bounds, others: &[Bounds]) -> bool {
    others.iter().any(|other| candidate.overlaps(other))
}

/// Find a placement for `candidate` that avoids the other enabled elements.
///
/// Disabled entries in `others` are ignored.
pub fn resolve_placement(
    candidate: &ElementStyle,
    others: &[&ElementStyle],
    label: &LabelSize,
    scale: f64,
) -> Position {
    if !label.prevent_collisions || label.allow_elements_outside {
        return candidate.position;
    }

    let obstacles: Vec<Bounds> = others
        .iter()
        .filter(|other| other.enabled)
        .map(|other| element_bounds(other, scale))
        .collect();

    if !collides(&element_bounds(candidate, scale), &obstacles) {
        return candidate.position;
    }

    let padding = label.effective_padding();
    let (width, height) = element_extent(candidate, scale);
    let divisions = f64::from(GRID_DIVISIONS);
    let step_x = (label.width - width - 2.0 * padding) / divisions;
    let step_y = (label.height - height - 2.0 * padding) / divisions;

    for i in 0..=GRID_DIVISIONS {
        for j in 0..=GRID_DIVISIONS {
            let position = Position::new(
                padding + f64::from(i) * step_x,
                padding + f64::from(j) * step_y,
            );
            if !collides(&element_bounds_at(candidate, position, scale), &obstacles) {
                return position;
            }
        }
    }

    debug!(
        "No free grid cell among {} obstacles, keeping constrained position",
        obstacles.len()
    );
    constrain_element(candidate, label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::overlaps;
    use labelkit_core::units::Unit;

    fn label() -> LabelSize {
        LabelSize {
            prevent_collisions: true,
            ..LabelSize::new(100.0, 50.0, Unit::Millimeter)
        }
    }

    fn qr(x: f64, y: f64) -> ElementStyle {
        ElementStyle::new(x, y, 50.0).enabled(true)
    }

    #[test]
    fn test_two_qr_codes_are_separated() {
        let size = label();
        let scale = size.scale_factor();
        let fixed = qr(10.0, 10.0);
        let mut moving = qr(10.0, 10.0);

        moving.position = resolve_placement(&moving, &[&fixed], &size, scale);

        assert!(!overlaps(
            &element_bounds(&moving, scale),
            &element_bounds(&fixed, scale)
        ));
        // First free cell in scan order is column 0, row 7
        assert_eq!(moving.position.x, 0.0);
        let step_y = (50.0 - 50.0 / scale) / 10.0;
        assert!((moving.position.y - 7.0 * step_y).abs() < 1e-9);
    }

    #[test]
    fn test_no_overlap_keeps_position() {
        let size = label();
        let scale = size.scale_factor();
        let fixed = qr(60.0, 10.0);
        let moving = qr(10.0, 10.0);
        assert_eq!(
            resolve_placement(&moving, &[&fixed], &size, scale),
            Position::new(10.0, 10.0)
        );
    }

    #[test]
    fn test_disabled_elements_are_ignored() {
        let size = label();
        let scale = size.scale_factor();
        let fixed = ElementStyle::new(10.0, 10.0, 50.0);
        let moving = qr(10.0, 10.0);
        assert_eq!(
            resolve_placement(&moving, &[&fixed], &size, scale),
            Position::new(10.0, 10.0)
        );
    }

    #[test]
    fn test_inactive_when_prevention_off_or_outside_allowed() {
        let mut size = label();
        let scale = size.scale_factor();
        let fixed = qr(10.0, 10.0);
        let moving = qr(10.0, 10.0);

        size.prevent_collisions = false;
        assert_eq!(
            resolve_placement(&moving, &[&fixed], &size, scale),
            moving.position
        );

        size.prevent_collisions = true;
        size.allow_elements_outside = true;
        assert_eq!(
            resolve_placement(&moving, &[&fixed], &size, scale),
            moving.position
        );
    }

    #[test]
    fn test_exhausted_grid_falls_back_to_constrained_position() {
        let size = label();
        let scale = size.scale_factor();
        // Covers the whole label
        let mut wall = ElementStyle::new(0.0, 0.0, 50.0 * scale).enabled(true);
        wall.width = Some(100.0 * scale);
        let moving = qr(90.0, 20.0);

        let position = resolve_placement(&moving, &[&wall], &size, scale);
        let extent = 50.0 / scale;
        assert!((position.x - (100.0 - extent)).abs() < 1e-9);
        assert_eq!(position.y, 20.0);
    }
}
