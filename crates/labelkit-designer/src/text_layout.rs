//! Text measurement and word wrapping.
//!
//! Measurement is abstracted behind [`TextMeasure`] so layout can be computed
//! without a rendering surface. [`FontMeasure`] uses real glyph advances;
//! [`ApproxMeasure`] assumes a fixed advance per character.

use crate::font_manager;
use crate::model::TextStyle;
use rusttype::{point, Font, Scale};

/// Width of a single line of text at a given font size
pub trait TextMeasure {
    fn line_width(&self, text: &str, font_size: f64) -> f64;
}

/// Fixed per-character advance, as a fraction of the font size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproxMeasure {
    pub em_ratio: f64,
}

impl Default for ApproxMeasure {
    fn default() -> Self {
        Self { em_ratio: 0.6 }
    }
}

impl TextMeasure for ApproxMeasure {
    fn line_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * self.em_ratio
    }
}

/// Glyph-accurate measurement with a rusttype font
#[derive(Clone, Copy)]
pub struct FontMeasure {
    font: &'static Font<'static>,
}

impl FontMeasure {
    pub fn new(font: &'static Font<'static>) -> Self {
        Self { font }
    }

    /// Measure with the default system sans-serif font, if one exists.
    pub fn system() -> Option<Self> {
        font_manager::get_font().map(Self::new)
    }

    pub fn font(&self) -> &'static Font<'static> {
        self.font
    }
}

impl TextMeasure for FontMeasure {
    fn line_width(&self, text: &str, font_size: f64) -> f64 {
        let scale = Scale::uniform(font_size as f32);
        self.font
            .layout(text, scale, point(0.0, 0.0))
            .last()
            .map(|glyph| glyph.position().x + glyph.unpositioned().h_metrics().advance_width)
            .map(f64::from)
            .unwrap_or(0.0)
    }
}

/// Size of laid-out text, in the same unit as the font size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f64,
    pub height: f64,
    pub lines: usize,
}

/// Greedy word wrap at `max_width`.
///
/// Words are split on spaces and explicit newlines start a new line. A word
/// wider than `max_width` gets a line of its own rather than being broken.
pub fn wrap_lines(
    text: &str,
    max_width: f64,
    font_size: f64,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split(' ') {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if !line.is_empty() && measure.line_width(&candidate, font_size) > max_width {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            } else {
                line = candidate;
            }
        }
        lines.push(line);
    }
    lines
}

/// Dimensions of `text` rendered with `style`.
///
/// Single-line text is one font size tall and at most `max_width` wide.
/// Multiline text wraps at `max_width` and stacks `line_height` spaced lines.
pub fn text_dimensions(
    text: &str,
    font_size: f64,
    max_width: f64,
    style: &TextStyle,
    measure: &dyn TextMeasure,
) -> TextExtent {
    if !style.multiline {
        return TextExtent {
            width: measure.line_width(text, font_size).min(max_width),
            height: font_size,
            lines: 1,
        };
    }

    let lines = wrap_lines(text, max_width, font_size, measure);
    let widest = lines
        .iter()
        .map(|line| measure.line_width(line, font_size))
        .fold(0.0, f64::max);

    TextExtent {
        width: widest.min(max_width),
        height: lines.len() as f64 * font_size * style.line_height,
        lines: lines.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One unit per character at size 1
    fn unit() -> ApproxMeasure {
        ApproxMeasure { em_ratio: 1.0 }
    }

    #[test]
    fn test_wrap_at_width() {
        let lines = wrap_lines("aaa bbb ccc", 7.0, 1.0, &unit());
        assert_eq!(lines, vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn test_long_word_keeps_own_line() {
        let lines = wrap_lines("a verylongword b", 4.0, 1.0, &unit());
        assert_eq!(lines, vec!["a", "verylongword", "b"]);
    }

    #[test]
    fn test_newline_forces_break() {
        let lines = wrap_lines("one\ntwo", 100.0, 1.0, &unit());
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_single_line_dimensions() {
        let style = TextStyle::default();
        let extent = text_dimensions("hello", 10.0, 30.0, &style, &unit());
        assert_eq!(extent.width, 30.0);
        assert_eq!(extent.height, 10.0);
        assert_eq!(extent.lines, 1);
    }

    #[test]
    fn test_multiline_dimensions() {
        let style = TextStyle {
            multiline: true,
            ..TextStyle::default()
        };
        let extent = text_dimensions("aaa bbb ccc", 1.0, 7.0, &style, &unit());
        assert_eq!(extent.lines, 2);
        assert_eq!(extent.width, 7.0);
        assert!((extent.height - 2.4).abs() < 1e-12);
    }

    #[test]
    fn test_multiline_width_counts_unwrapped_text() {
        let style = TextStyle {
            multiline: true,
            ..TextStyle::default()
        };
        let extent = text_dimensions("ab", 1.0, 10.0, &style, &unit());
        assert_eq!(extent.width, 2.0);
        assert_eq!(extent.lines, 1);
    }

    #[test]
    fn test_font_measure_grows_with_text() {
        if let Some(measure) = FontMeasure::system() {
            let short = measure.line_width("ab", 12.0);
            let long = measure.line_width("abcdef", 12.0);
            assert!(long > short);
            assert_eq!(measure.line_width("", 12.0), 0.0);
        }
    }
}
