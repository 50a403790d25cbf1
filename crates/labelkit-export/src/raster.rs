//! Label rasterization.
//!
//! Every enabled element is drawn into its own pixmap and composited onto a
//! white label canvas at `position x scale`, rotated about its own center.
//! The scale is the unit's pixel factor multiplied by the supersample factor,
//! so the resulting image is sharp when placed at the label's physical size.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops::FilterType, Rgb, RgbImage, RgbaImage};
use labelkit_core::ExportError;
use labelkit_designer::font_manager;
use labelkit_designer::text_layout::{wrap_lines, FontMeasure, TextMeasure};
use labelkit_designer::{ElementKind, ElementRef, ElementStyle, Label, LogoElement, TextAlign, TextElement};
use qrcode::{EcLevel, QrCode};
use rusttype::{point as rt_point, Font, Scale};
use std::path::{Path, PathBuf};
use tiny_skia::{
    Color, ColorU8, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};
use tracing::warn;

/// Supersampling factor used for print output
pub const DEFAULT_SUPERSAMPLE: u32 = 4;

/// Rendering parameters for one label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterRequest {
    pub supersample: u32,
}

impl Default for RasterRequest {
    fn default() -> Self {
        Self {
            supersample: DEFAULT_SUPERSAMPLE,
        }
    }
}

impl RasterRequest {
    /// Output pixels per label unit
    pub fn pixel_scale(&self, label: &Label) -> f64 {
        label.size.scale_factor() * f64::from(self.supersample.max(1))
    }
}

/// Turns a label into an image
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(&self, label: &Label, request: &RasterRequest) -> Result<RgbImage, ExportError>;
}

/// Parse `#rgb` or `#rrggbb`, falling back to black.
pub fn parse_color(value: &str) -> Color {
    let hex = value.trim().trim_start_matches('#');
    let channels = match hex.len() {
        6 => u32::from_str_radix(hex, 16)
            .ok()
            .map(|v| ((v >> 16) as u8, (v >> 8) as u8, v as u8)),
        3 => u16::from_str_radix(hex, 16).ok().map(|v| {
            let expand = |n: u16| ((n & 0xf) * 17) as u8;
            (expand(v >> 8), expand(v >> 4), expand(v))
        }),
        _ => None,
    };
    let (r, g, b) = channels.unwrap_or((0, 0, 0));
    Color::from_rgba8(r, g, b, 255)
}

struct Layer {
    pixmap: Pixmap,
    left: f64,
    top: f64,
}

/// Rasterizer built on tiny-skia, rusttype and the `qrcode` encoder
#[derive(Debug, Clone, Default)]
pub struct SkiaRasterizer {
    asset_root: Option<PathBuf>,
}

impl SkiaRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative logo paths against `root`.
    pub fn with_asset_root(root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: Some(root.into()),
        }
    }

    /// Render synchronously.
    pub fn render(&self, label: &Label, request: &RasterRequest) -> Result<RgbImage, ExportError> {
        let scale = request.pixel_scale(label);
        let supersample = f64::from(request.supersample.max(1));
        let width = (label.size.width * scale).round().max(1.0) as u32;
        let height = (label.size.height * scale).round().max(1.0) as u32;

        let mut canvas = Pixmap::new(width, height).ok_or_else(|| {
            ExportError::rasterization(&label.id, format!("cannot allocate {}x{} canvas", width, height))
        })?;
        canvas.fill(Color::WHITE);

        for kind in ElementKind::ALL {
            let element = label.elements.get(kind);
            if !element.style().enabled {
                continue;
            }
            let layer = match element {
                ElementRef::Qr(style) => Some(self.render_qr(label, style, scale, supersample)?),
                ElementRef::Text(text) => render_text(label, kind, text, scale, supersample),
                ElementRef::Logo(logo) => self.render_logo(label, logo, scale)?,
            };
            if let Some(layer) = layer {
                composite(&mut canvas, &layer, element.style().normalized_rotation());
            }
        }

        if label.size.border.enabled {
            draw_border(&mut canvas, label, scale);
        }

        let data = canvas.data();
        Ok(RgbImage::from_fn(width, height, |x, y| {
            let idx = ((y * width + x) * 4) as usize;
            Rgb([data[idx], data[idx + 1], data[idx + 2]])
        }))
    }

    fn render_qr(
        &self,
        label: &Label,
        style: &ElementStyle,
        scale: f64,
        supersample: f64,
    ) -> Result<Layer, ExportError> {
        let code = QrCode::with_error_correction_level(label.qr_payload().as_bytes(), EcLevel::H)
            .map_err(|e| ExportError::rasterization(&label.id, format!("QR encoding failed: {}", e)))?;

        let side = (style.size * supersample).round().max(1.0) as u32;
        let mut pixmap = Pixmap::new(side, side).ok_or_else(|| {
            ExportError::rasterization(&label.id, format!("cannot allocate {}px QR code", side))
        })?;
        pixmap.fill(Color::WHITE);

        let modules = code.width();
        let module = f64::from(side) / modules as f64;
        let mut paint = Paint::default();
        paint.set_color(parse_color(style.color.as_deref().unwrap_or("#000000")));
        paint.anti_alias = false;

        for (i, color) in code.to_colors().iter().enumerate() {
            if *color != qrcode::Color::Dark {
                continue;
            }
            let x = (i % modules) as f64 * module;
            let y = (i / modules) as f64 * module;
            // Overdraw by a hair so neighbouring modules leave no seams
            if let Some(rect) = Rect::from_xywh(x as f32, y as f32, module as f32 + 0.5, module as f32 + 0.5) {
                pixmap.fill_rect(rect, &paint, Transform::identity(), None);
            }
        }

        Ok(Layer {
            pixmap,
            left: style.position.x * scale,
            top: style.position.y * scale,
        })
    }

    fn render_logo(&self, label: &Label, logo: &LogoElement, scale: f64) -> Result<Option<Layer>, ExportError> {
        let Some(url) = logo.image_url.as_deref() else {
            return Ok(None);
        };
        let image = self
            .load_image(url)
            .map_err(|reason| ExportError::rasterization(&label.id, format!("logo: {}", reason)))?;

        let box_w = (logo.style.width_or_size() * scale).round().max(1.0) as u32;
        let box_h = (logo.style.height_or_size() * scale).round().max(1.0) as u32;
        let mut pixmap = Pixmap::new(box_w, box_h).ok_or_else(|| {
            ExportError::rasterization(&label.id, format!("cannot allocate {}x{} logo", box_w, box_h))
        })?;

        // object-fit: contain
        let fit = (f64::from(box_w) / f64::from(image.width()))
            .min(f64::from(box_h) / f64::from(image.height()));
        let fit_w = ((f64::from(image.width()) * fit).round() as u32).clamp(1, box_w);
        let fit_h = ((f64::from(image.height()) * fit).round() as u32).clamp(1, box_h);
        let resized = image::imageops::resize(&image, fit_w, fit_h, FilterType::Triangle);
        let offset_x = (box_w - fit_w) / 2;
        let offset_y = (box_h - fit_h) / 2;

        let pixels = pixmap.pixels_mut();
        for (x, y, px) in resized.enumerate_pixels() {
            let [r, g, b, a] = px.0;
            let idx = ((y + offset_y) * box_w + x + offset_x) as usize;
            pixels[idx] = ColorU8::from_rgba(r, g, b, a).premultiply();
        }

        Ok(Some(Layer {
            pixmap,
            left: logo.style.position.x * scale,
            top: logo.style.position.y * scale,
        }))
    }

    fn load_image(&self, url: &str) -> Result<RgbaImage, String> {
        let bytes = match url.strip_prefix("data:") {
            Some(rest) => {
                let (meta, payload) = rest.split_once(',').ok_or("malformed data URL")?;
                if !meta.ends_with(";base64") {
                    return Err("only base64 data URLs are supported".to_string());
                }
                STANDARD.decode(payload.trim()).map_err(|e| e.to_string())?
            }
            None => {
                let path = self.resolve_path(Path::new(url));
                std::fs::read(&path).map_err(|e| format!("{}: {}", path.display(), e))?
            }
        };
        image::load_from_memory(&bytes)
            .map(|img| img.to_rgba8())
            .map_err(|e| e.to_string())
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.asset_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl Rasterizer for SkiaRasterizer {
    /// Renders on the blocking pool so the runtime keeps serving other tasks.
    async fn rasterize(&self, label: &Label, request: &RasterRequest) -> Result<RgbImage, ExportError> {
        let rasterizer = self.clone();
        let owned = label.clone();
        let request = *request;
        tokio::task::spawn_blocking(move || rasterizer.render(&owned, &request))
            .await
            .map_err(|e| ExportError::rasterization(&label.id, format!("render task failed: {}", e)))?
    }
}

fn text_font(kind: ElementKind, text: &TextElement) -> Option<&'static Font<'static>> {
    let family = if kind == ElementKind::Uuid {
        "Monospace"
    } else {
        font_manager::DEFAULT_FAMILY
    };
    font_manager::get_font_for(family, text.text_style.bold, text.text_style.italic)
}

fn render_text(
    label: &Label,
    kind: ElementKind,
    text: &TextElement,
    scale: f64,
    supersample: f64,
) -> Option<Layer> {
    let content = label.text_for(kind).filter(|c| !c.is_empty())?;
    let Some(font) = text_font(kind, text) else {
        warn!("Skipping {} on label {}: no font available", kind, label.id);
        return None;
    };
    let measure = FontMeasure::new(font);
    let style = &text.text_style;
    let font_px = text.style.size * supersample;
    let line_height = font_px * style.line_height;

    let (lines, box_w, box_h) = if style.multiline {
        let box_w = style
            .width
            .or(text.style.width)
            .map(|w| w * scale)
            .or(style.max_width.map(|w| w * supersample))
            .unwrap_or(label.size.width * scale);
        let lines = wrap_lines(content, box_w, font_px, &measure);
        let box_h = style
            .height
            .or(text.style.height)
            .map(|h| h * scale)
            .unwrap_or(lines.len() as f64 * line_height);
        (lines, box_w, box_h)
    } else {
        let width = measure.line_width(content, font_px);
        (vec![content.to_string()], width, line_height)
    };

    let pixel_w = box_w.ceil().max(1.0) as u32;
    let pixel_h = box_h.ceil().max(1.0) as u32;
    let mut pixmap = Pixmap::new(pixel_w, pixel_h)?;
    let color = parse_color(text.color()).to_color_u8();
    let rt_scale = Scale::uniform(font_px as f32);
    let ascent = font.v_metrics(rt_scale).ascent;

    for (i, line) in lines.iter().enumerate() {
        let line_w = measure.line_width(line, font_px);
        let x = match style.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => (box_w - line_w) / 2.0,
            TextAlign::Right => box_w - line_w,
        };
        let top = i as f64 * line_height + (line_height - font_px) / 2.0;
        let baseline = rt_point(x as f32, top as f32 + ascent);
        draw_glyphs(&mut pixmap, font, line, rt_scale, baseline, color);
        if style.underline {
            let thickness = (font_px / 15.0).max(1.0);
            let under = top + font_px + thickness;
            if let Some(rect) = Rect::from_xywh(x as f32, under as f32, line_w as f32, thickness as f32) {
                let mut paint = Paint::default();
                paint.set_color_rgba8(color.red(), color.green(), color.blue(), 255);
                pixmap.fill_rect(rect, &paint, Transform::identity(), None);
            }
        }
    }

    let anchor = text.style.position.x * scale;
    let extent = text.style.width_or_size() * scale;
    let left = match (style.multiline, style.align) {
        (false, TextAlign::Center) => anchor + extent / 2.0 - box_w / 2.0,
        (false, TextAlign::Right) => anchor + extent - box_w,
        _ => anchor,
    };

    Some(Layer {
        pixmap,
        left,
        top: text.style.position.y * scale,
    })
}

fn draw_glyphs(
    pixmap: &mut Pixmap,
    font: &Font<'static>,
    text: &str,
    scale: Scale,
    start: rusttype::Point<f32>,
    color: ColorU8,
) {
    let width = pixmap.width() as i32;
    let height = pixmap.height() as i32;
    let data = pixmap.data_mut();

    for glyph in font.layout(text, scale, start) {
        let Some(bounding_box) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, v| {
            let px = gx as i32 + bounding_box.min.x;
            let py = gy as i32 + bounding_box.min.y;
            if px < 0 || px >= width || py < 0 || py >= height {
                return;
            }
            let alpha = v.clamp(0.0, 1.0);
            if alpha <= 0.0 {
                return;
            }
            let idx = ((py * width + px) * 4) as usize;
            let pixel = &mut data[idx..idx + 4];
            // Source-over with premultiplied destination
            let src = [color.red(), color.green(), color.blue(), 255];
            for c in 0..4 {
                let s = f32::from(src[c]) * alpha;
                let d = f32::from(pixel[c]) * (1.0 - alpha);
                pixel[c] = (s + d).round().min(255.0) as u8;
            }
        });
    }
}

fn composite(canvas: &mut Pixmap, layer: &Layer, rotation: f64) {
    let w = layer.pixmap.width() as f32;
    let h = layer.pixmap.height() as f32;
    let transform = Transform::from_translate(layer.left as f32, layer.top as f32)
        .pre_concat(Transform::from_rotate_at(rotation as f32, w / 2.0, h / 2.0));
    canvas.draw_pixmap(
        0,
        0,
        layer.pixmap.as_ref(),
        &PixmapPaint::default(),
        transform,
        None,
    );
}

fn draw_border(canvas: &mut Pixmap, label: &Label, scale: f64) {
    let border = &label.size.border;
    let stroke_width = (border.width * scale) as f32;
    if stroke_width <= 0.0 {
        return;
    }
    let inset = stroke_width / 2.0;
    let rect = Rect::from_xywh(
        inset,
        inset,
        canvas.width() as f32 - stroke_width,
        canvas.height() as f32 - stroke_width,
    );
    let Some(path) = rect.map(PathBuilder::from_rect) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(parse_color(&border.color));
    paint.anti_alias = true;
    let stroke = Stroke {
        width: stroke_width,
        ..Stroke::default()
    };
    canvas.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelkit_designer::{generate_labels, LabelTemplate};

    fn label_with(kinds: &[ElementKind]) -> Label {
        let template = LabelTemplate::default().with_enabled(kinds);
        generate_labels(1, &template, 8).unwrap().remove(0)
    }

    fn is_dark(px: &Rgb<u8>) -> bool {
        px.0.iter().all(|c| *c < 64)
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff0000").to_color_u8().red(), 255);
        assert_eq!(parse_color("#0f0").to_color_u8().green(), 255);
        assert_eq!(parse_color("nonsense").to_color_u8().red(), 0);
    }

    #[test]
    fn test_canvas_size_includes_supersampling() {
        let label = label_with(&[]);
        let image = SkiaRasterizer::new()
            .render(&label, &RasterRequest { supersample: 2 })
            .unwrap();
        assert_eq!(image.width(), (100.0 * 3.779528 * 2.0_f64).round() as u32);
        assert_eq!(image.height(), (50.0 * 3.779528 * 2.0_f64).round() as u32);
        assert!(image.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn test_qr_code_is_drawn_at_position() {
        let label = label_with(&[ElementKind::QrCode]);
        let request = RasterRequest::default();
        let image = SkiaRasterizer::new().render(&label, &request).unwrap();

        let scale = request.pixel_scale(&label);
        let left = (10.0 * scale) as u32;
        let top = (10.0 * scale) as u32;
        let side = 50 * 4;
        let dark_inside = (top..top + side)
            .flat_map(|y| (left..left + side).map(move |x| (x, y)))
            .filter(|(x, y)| is_dark(image.get_pixel(*x, *y)))
            .count();
        assert!(dark_inside > 0);
        // Finder pattern fills the top-left module
        assert!(is_dark(image.get_pixel(left + 2, top + 2)));
        // Nothing outside the code
        assert!(!is_dark(image.get_pixel(left - 5, top - 5)));
    }

    #[test]
    fn test_border_is_stroked() {
        let mut label = label_with(&[]);
        label.size.border.enabled = true;
        label.size.border.width = 1.0;
        let image = SkiaRasterizer::new().render(&label, &RasterRequest::default()).unwrap();
        assert!(is_dark(image.get_pixel(2, 2)));
        assert!(!is_dark(image.get_pixel(image.width() / 2, image.height() / 2)));
    }

    #[test]
    fn test_logo_from_data_url() {
        let mut png = Vec::new();
        RgbaImage::from_pixel(4, 2, image::Rgba([255, 0, 0, 255]))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let url = format!("data:image/png;base64,{}", STANDARD.encode(&png));

        let mut label = label_with(&[ElementKind::Logo]);
        label.elements.logo.attach_image(url, &png).unwrap();
        let request = RasterRequest { supersample: 1 };
        let image = SkiaRasterizer::new().render(&label, &request).unwrap();

        let scale = request.pixel_scale(&label);
        let x = (61.0 * scale) as u32;
        let y = (11.0 * scale) as u32;
        assert_eq!(image.get_pixel(x, y).0, [255, 0, 0]);
    }

    #[test]
    fn test_missing_logo_file_is_rasterization_error() {
        let mut png = Vec::new();
        RgbaImage::new(4, 2)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let mut label = label_with(&[ElementKind::Logo]);
        label.elements.logo.attach_image("does/not/exist.png", &png).unwrap();
        let err = SkiaRasterizer::with_asset_root("/nonexistent")
            .render(&label, &RasterRequest::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::Rasterization { .. }));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_rasterize_matches_blocking_render() {
        let label = label_with(&[ElementKind::QrCode]);
        let request = RasterRequest { supersample: 1 };
        let rasterizer = SkiaRasterizer::new();
        let rendered = rasterizer.rasterize(&label, &request).await.unwrap();
        assert_eq!(rendered, rasterizer.render(&label, &request).unwrap());
    }

    #[test]
    fn test_disabled_logo_without_image_is_skipped() {
        let label = label_with(&[ElementKind::Logo]);
        let image = SkiaRasterizer::new().render(&label, &RasterRequest { supersample: 1 }).unwrap();
        assert!(image.pixels().all(|p| p.0 == [255, 255, 255]));
    }
}
