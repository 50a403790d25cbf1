//! Logo element operations.
//!
//! The logo box keeps the attached image's aspect ratio through resizes.
//! `aspect_ratio` always describes the image in its natural orientation; a
//! quarter-turn swaps the stored box, so resizes after an odd number of
//! quarter-turns use the inverse ratio.

use crate::model::LogoElement;
use image::{ImageFormat, ImageReader};
use labelkit_core::ValidationError;
use std::io::Cursor;
use tracing::debug;

/// Largest accepted logo file
pub const MAX_LOGO_BYTES: usize = 1024 * 1024;

/// Which side of the logo box is being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Width,
    Height,
}

fn invalid_logo(reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: "logo".to_string(),
        reason: reason.into(),
    }
}

/// Check that `bytes` is a PNG no larger than [`MAX_LOGO_BYTES`] and return
/// its pixel dimensions.
pub fn inspect_png(bytes: &[u8]) -> Result<(u32, u32), ValidationError> {
    if bytes.len() > MAX_LOGO_BYTES {
        return Err(invalid_logo(format!(
            "file is {} bytes, limit is {}",
            bytes.len(),
            MAX_LOGO_BYTES
        )));
    }
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| invalid_logo(e.to_string()))?;
    if reader.format() != Some(ImageFormat::Png) {
        return Err(invalid_logo("not a PNG image"));
    }
    reader
        .into_dimensions()
        .map_err(|e| invalid_logo(format!("unreadable PNG: {}", e)))
}

impl LogoElement {
    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }

    fn is_quarter_turned(&self) -> bool {
        (self.style.normalized_rotation() / 90.0).round() as i64 % 2 == 1
    }

    /// Width / height of the box in its current orientation
    fn box_aspect(&self) -> Option<f64> {
        self.aspect_ratio.map(|aspect| {
            if self.is_quarter_turned() {
                1.0 / aspect
            } else {
                aspect
            }
        })
    }

    /// Attach a PNG logo. `url` is what the rasterizer loads (a path or a
    /// `data:` URL) and `bytes` the file content it refers to.
    ///
    /// The box becomes `size` wide and `size / aspect` tall.
    pub fn attach_image(&mut self, url: impl Into<String>, bytes: &[u8]) -> Result<(), ValidationError> {
        let (width, height) = inspect_png(bytes)?;
        self.set_image(url.into(), width, height)
    }

    fn set_image(&mut self, url: String, natural_width: u32, natural_height: u32) -> Result<(), ValidationError> {
        if natural_width == 0 || natural_height == 0 {
            return Err(invalid_logo(format!(
                "image has empty dimensions {}x{}",
                natural_width, natural_height
            )));
        }
        let aspect = f64::from(natural_width) / f64::from(natural_height);
        self.image_url = Some(url);
        self.aspect_ratio = Some(aspect);
        self.style.width = Some(self.style.size);
        self.style.height = Some(self.style.size / aspect);
        debug!("Attached logo with aspect ratio {:.3}", aspect);
        Ok(())
    }

    /// Rotate 90 degrees clockwise, swapping the box sides.
    pub fn rotate_quarter(&mut self) {
        let width = self.style.width_or_size();
        let height = self.style.height_or_size();
        self.style.rotation = (self.style.rotation + 90.0).rem_euclid(360.0);
        self.style.width = Some(height);
        self.style.height = Some(width);
    }

    /// Set one side of the box; the other follows the aspect ratio when an
    /// image is attached, otherwise the box stays square.
    ///
    /// Returns `false` and leaves the box untouched for non-positive or NaN
    /// input.
    pub fn set_dimension(&mut self, dimension: Dimension, value: f64) -> bool {
        if !(value > 0.0) {
            return false;
        }
        let aspect = self.box_aspect();
        let (width, height) = match dimension {
            Dimension::Width => (value, aspect.map_or(value, |a| value / a)),
            Dimension::Height => (aspect.map_or(value, |a| value * a), value),
        };
        self.style.width = Some(width);
        self.style.height = Some(height);
        true
    }

    /// Detach the image and reset the box to `size` x `size`, unrotated.
    pub fn remove_image(&mut self) {
        self.image_url = None;
        self.aspect_ratio = None;
        self.style.rotation = 0.0;
        self.style.width = Some(self.style.size);
        self.style.height = Some(self.style.size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbaImage::new(width, height)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_attach_sets_box_from_aspect() {
        let mut logo = LogoElement::default();
        logo.attach_image("logo.png", &png(200, 100)).unwrap();
        assert_eq!(logo.aspect_ratio, Some(2.0));
        assert_eq!(logo.style.width, Some(40.0));
        assert_eq!(logo.style.height, Some(20.0));
    }

    #[test]
    fn test_rotate_swaps_sides() {
        let mut logo = LogoElement::default();
        logo.attach_image("logo.png", &png(200, 100)).unwrap();
        logo.rotate_quarter();
        assert_eq!(logo.style.rotation, 90.0);
        assert_eq!(logo.style.width, Some(20.0));
        assert_eq!(logo.style.height, Some(40.0));

        for _ in 0..3 {
            logo.rotate_quarter();
        }
        assert_eq!(logo.style.rotation, 0.0);
        assert_eq!(logo.style.width, Some(40.0));
    }

    #[test]
    fn test_dimension_keeps_aspect() {
        let mut logo = LogoElement::default();
        logo.attach_image("logo.png", &png(300, 100)).unwrap();
        assert!(logo.set_dimension(Dimension::Width, 60.0));
        assert_eq!(logo.style.height, Some(20.0));
        assert!(logo.set_dimension(Dimension::Height, 10.0));
        assert_eq!(logo.style.width, Some(30.0));
    }

    #[test]
    fn test_dimension_after_rotation_uses_rotated_box() {
        let mut logo = LogoElement::default();
        logo.attach_image("logo.png", &png(200, 100)).unwrap();
        logo.rotate_quarter();
        assert!(logo.set_dimension(Dimension::Width, 10.0));
        assert_eq!(logo.style.height, Some(20.0));
    }

    #[test]
    fn test_non_positive_dimension_ignored() {
        let mut logo = LogoElement::default();
        assert!(!logo.set_dimension(Dimension::Width, 0.0));
        assert!(!logo.set_dimension(Dimension::Height, f64::NAN));
        assert_eq!(logo.style.width, None);
        assert!(logo.set_dimension(Dimension::Width, 12.0));
        assert_eq!(logo.style.height, Some(12.0));
    }

    #[test]
    fn test_remove_resets_box() {
        let mut logo = LogoElement::default();
        logo.attach_image("logo.png", &png(200, 100)).unwrap();
        logo.rotate_quarter();
        logo.remove_image();
        assert!(!logo.has_image());
        assert_eq!(logo.style.rotation, 0.0);
        assert_eq!(logo.style.width, Some(40.0));
        assert_eq!(logo.style.height, Some(40.0));
    }

    #[test]
    fn test_inspect_png() {
        assert_eq!(inspect_png(&png(64, 32)).unwrap(), (64, 32));
        assert!(inspect_png(b"GIF89a not a png at all!").is_err());
        assert!(inspect_png(&[0x89, b'P', b'N', b'G']).is_err());
        let mut huge = png(1, 1);
        huge.resize(MAX_LOGO_BYTES + 1, 0);
        assert!(inspect_png(&huge).is_err());
    }

    #[test]
    fn test_attach_rejects_non_png() {
        let mut logo = LogoElement::default();
        let gif = b"GIF89a\x04\x00\x04\x00\x00\x00\x00;";
        assert!(logo.attach_image("logo.gif", gif).is_err());
        assert!(!logo.has_image());

        let mut oversized = png(2, 2);
        oversized.resize(MAX_LOGO_BYTES + 1, 0);
        assert!(logo.attach_image("logo.png", &oversized).is_err());
        assert_eq!(logo.aspect_ratio, None);
    }
}
