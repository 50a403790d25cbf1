//! System font lookup for text measurement and rendering.
//!
//! Faces are discovered once through `fontdb` and parsed with `rusttype`.
//! Loaded fonts are cached for the life of the process. No font is bundled,
//! so every lookup may come back empty on a machine without system fonts.

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use rusttype::Font;
use std::{
    collections::HashMap,
    fs,
    sync::{Mutex, OnceLock},
};
use tracing::{debug, warn};

/// Family used for label text
pub const DEFAULT_FAMILY: &str = "Sans";

#[derive(Clone, Eq, PartialEq, Hash)]
struct FontKey {
    family: String,
    bold: bool,
    italic: bool,
}

fn db() -> &'static Database {
    static DB: OnceLock<Database> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = Database::new();
        db.load_system_fonts();
        debug!("Loaded {} system font faces", db.len());
        db
    })
}

/// Font for the requested family and style, falling back to any sans-serif
/// face and then to any face at all.
pub fn get_font_for(family: &str, bold: bool, italic: bool) -> Option<&'static Font<'static>> {
    static CACHE: OnceLock<Mutex<HashMap<FontKey, Option<&'static Font<'static>>>>> =
        OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));

    let key = FontKey {
        family: family.to_string(),
        bold,
        italic,
    };

    if let Some(font) = cache.lock().unwrap_or_else(|p| p.into_inner()).get(&key) {
        return *font;
    }

    let loaded = load_font_from_system(family, bold, italic)
        .or_else(|| load_font_from_system(DEFAULT_FAMILY, bold, italic))
        .or_else(load_any_font);
    let font_ref: Option<&'static Font<'static>> = match loaded {
        Some(font) => Some(Box::leak(Box::new(font))),
        None => {
            warn!("No usable font found for family '{}'", family);
            None
        }
    };

    cache
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .insert(key, font_ref);
    font_ref
}

/// Regular sans-serif font used for label text.
pub fn get_font() -> Option<&'static Font<'static>> {
    get_font_for(DEFAULT_FAMILY, false, false)
}

fn load_font_from_system(family: &str, bold: bool, italic: bool) -> Option<Font<'static>> {
    let families: Vec<Family<'_>> = match family.trim() {
        "" | "Sans" | "sans-serif" => vec![Family::SansSerif],
        "Serif" | "serif" => vec![Family::Serif],
        "Monospace" | "monospace" => vec![Family::Monospace],
        other => vec![Family::Name(other)],
    };

    let query = Query {
        families: &families,
        weight: if bold { Weight::BOLD } else { Weight::NORMAL },
        stretch: Stretch::Normal,
        style: if italic { Style::Italic } else { Style::Normal },
    };

    let id = db().query(&query)?;
    load_face(id)
}

fn load_any_font() -> Option<Font<'static>> {
    db().faces().find_map(|face| load_face(face.id))
}

fn load_face(id: fontdb::ID) -> Option<Font<'static>> {
    let face = db().face(id)?;
    let bytes = match &face.source {
        fontdb::Source::File(path) => fs::read(path).ok()?,
        fontdb::Source::SharedFile(path, _) => fs::read(path).ok()?,
        fontdb::Source::Binary(bytes) => bytes.as_ref().as_ref().to_vec(),
    };
    Font::try_from_vec_and_index(bytes, face.index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_cached() {
        // Either both lookups find the same font or both find none
        let first = get_font().map(|f| f as *const Font<'static>);
        let second = get_font().map(|f| f as *const Font<'static>);
        assert_eq!(first, second);
    }
}
