//! TrueType rasterization backend.
//!
//! The [`Rasterizer`] trait is the seam between text layout and whatever
//! turns a run of text into pixels. [`FontdueRasterizer`] is the default
//! implementation; tests and embedders can substitute their own.

use std::{
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use fontdue::{Font, FontSettings, Metrics};
use lru::LruCache;

use crate::bitmap::Bitmap;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FontId(usize);

impl FontId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FontLoadError {
    #[error("failed to read font file '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse '{}' as TTF/OTF font data: {}", .path.display(), .reason)]
    Malformed { path: PathBuf, reason: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum GlyphError {
    #[error("font {0:?} is not open")]
    UnknownFont(FontId),
}

/// Measures and renders runs of text in opened fonts.
pub trait Rasterizer {
    fn open_font(&mut self, path: &Path, point_size: u32) -> Result<FontId, FontLoadError>;

    fn close_font(&mut self, font: FontId);

    /// The `(width, height)` of `text` in pixels.
    fn measure(&mut self, font: FontId, text: &str) -> Result<(i32, i32), GlyphError>;

    /// Renders `text` to a 1-bit bitmap (pixel 1 = ink). Returns `None` for
    /// empty runs and unknown fonts.
    fn render(&mut self, font: FontId, text: &str) -> Option<Bitmap>;

    fn has_glyph(&mut self, font: FontId, c: char) -> bool;
}

/// Coverage at or above this value counts as ink.
const INK_THRESHOLD: u8 = 128;

struct LoadedFont {
    font: Font,
    px: f32,
    ascent: i32,
    line_height: i32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct GlyphKey {
    font: FontId,
    c: char,
}

struct RasterizedGlyph {
    metrics: Metrics,
    coverage: Vec<u8>,
}

/// A [`Rasterizer`] backed by `fontdue`. Rasterized glyphs are kept in an
/// LRU cache so repeated runs only pay for layout.
pub struct FontdueRasterizer {
    fonts: Vec<Option<LoadedFont>>,
    glyphs: LruCache<GlyphKey, Rc<RasterizedGlyph>>,
}

impl FontdueRasterizer {
    pub fn new(glyph_cache_size: usize) -> Self {
        Self {
            fonts: Vec::new(),
            glyphs: LruCache::new(glyph_cache_size.max(1)),
        }
    }

    /// Opens a font from memory. `path` is only used in error messages.
    pub fn open_font_data(
        &mut self,
        data: Vec<u8>,
        point_size: u32,
        path: &Path,
    ) -> Result<FontId, FontLoadError> {
        let font = Font::from_bytes(data, FontSettings::default()).map_err(|reason| {
            FontLoadError::Malformed {
                path: path.to_owned(),
                reason,
            }
        })?;
        let px = point_size as f32;
        let line = font
            .horizontal_line_metrics(px)
            .ok_or_else(|| FontLoadError::Malformed {
                path: path.to_owned(),
                reason: "font has no horizontal line metrics",
            })?;

        let id = FontId(self.fonts.len());
        self.fonts.push(Some(LoadedFont {
            font,
            px,
            ascent: line.ascent.ceil() as i32,
            line_height: line.new_line_size.ceil() as i32,
        }));
        Ok(id)
    }

    fn font(&self, id: FontId) -> Option<&LoadedFont> {
        self.fonts.get(id.0).and_then(Option::as_ref)
    }

    fn glyph(&mut self, id: FontId, c: char) -> Option<Rc<RasterizedGlyph>> {
        let key = GlyphKey { font: id, c };
        if let Some(glyph) = self.glyphs.get(&key) {
            return Some(Rc::clone(glyph));
        }

        let loaded = self.fonts.get(id.0).and_then(Option::as_ref)?;
        let (metrics, coverage) = loaded.font.rasterize(c, loaded.px);
        let glyph = Rc::new(RasterizedGlyph { metrics, coverage });
        self.glyphs.put(key, Rc::clone(&glyph));
        Some(glyph)
    }
}

impl Default for FontdueRasterizer {
    fn default() -> Self {
        Self::new(crate::context::Settings::default().glyph_raster_cache_size)
    }
}

fn advance(metrics: &Metrics) -> i32 {
    metrics.advance_width.round() as i32
}

impl Rasterizer for FontdueRasterizer {
    fn open_font(&mut self, path: &Path, point_size: u32) -> Result<FontId, FontLoadError> {
        let data = fs::read(path).map_err(|source| FontLoadError::Io {
            path: path.to_owned(),
            source,
        })?;
        self.open_font_data(data, point_size, path)
    }

    fn close_font(&mut self, font: FontId) {
        if let Some(slot) = self.fonts.get_mut(font.0) {
            *slot = None;
        }
        // Glyph keys of a closed font can never be looked up again.
        self.glyphs = LruCache::new(self.glyphs.cap());
    }

    fn measure(&mut self, font: FontId, text: &str) -> Result<(i32, i32), GlyphError> {
        let loaded = self.font(font).ok_or(GlyphError::UnknownFont(font))?;
        let width = text
            .chars()
            .map(|c| advance(&loaded.font.metrics(c, loaded.px)))
            .sum();
        Ok((width, loaded.line_height))
    }

    fn render(&mut self, font: FontId, text: &str) -> Option<Bitmap> {
        let (width, height) = self.measure(font, text).ok()?;
        if width <= 0 || height <= 0 {
            return None;
        }
        let ascent = self.font(font)?.ascent;

        let mut bitmap = Bitmap::new(width as usize, height as usize);
        let mut pen = 0;
        for c in text.chars() {
            let glyph = self.glyph(font, c)?;
            let m = &glyph.metrics;
            let left = pen + m.xmin;
            let top = ascent - (m.ymin + m.height as i32);
            for gy in 0..m.height {
                for gx in 0..m.width {
                    if glyph.coverage[gy * m.width + gx] < INK_THRESHOLD {
                        continue;
                    }
                    let x = left + gx as i32;
                    let y = top + gy as i32;
                    if x >= 0 && y >= 0 {
                        bitmap.set(x as usize, y as usize, 1);
                    }
                }
            }
            pen += advance(m);
        }
        Some(bitmap)
    }

    fn has_glyph(&mut self, font: FontId, c: char) -> bool {
        match self.font(font) {
            Some(loaded) => loaded.font.lookup_glyph_index(c) != 0,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_io_error() {
        let mut rasterizer = FontdueRasterizer::new(16);
        let err = rasterizer
            .open_font(Path::new("/nonexistent/font.ttf"), 12)
            .unwrap_err();
        assert!(matches!(err, FontLoadError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/font.ttf"));
    }

    #[test]
    fn garbage_data_is_malformed() {
        let mut rasterizer = FontdueRasterizer::new(16);
        let err = rasterizer
            .open_font_data(b"definitely not a font".to_vec(), 12, Path::new("junk.ttf"))
            .unwrap_err();
        assert!(matches!(err, FontLoadError::Malformed { .. }));
    }

    #[test]
    fn unknown_fonts_degrade() {
        let mut rasterizer = FontdueRasterizer::new(16);
        let font = FontId::new(3);
        assert!(matches!(
            rasterizer.measure(font, "abc"),
            Err(GlyphError::UnknownFont(_))
        ));
        assert!(rasterizer.render(font, "abc").is_none());
        assert!(!rasterizer.has_glyph(font, 'a'));
    }
}
