//! Deterministic fonts and rasterizers for unit tests.

use std::{cell::Cell, io, path::Path, rc::Rc};

use crate::{
    bitmap::Bitmap,
    context::TextContext,
    font::{FontDescriptor, FontSetConfig, FontSize},
    rasterizer::{FontId, FontLoadError, GlyphError, Rasterizer},
    sprite_font::SpriteFont,
};

/// Every glyph is 6 pixels wide (12 in big text) and fully inked, except
/// in tiny text, which the marquee reads column by column:
/// `A` is one column with row 0 set, `B` one column with row 1 set,
/// space is two blank columns and anything else is two columns with
/// the first fully set.
pub struct MonoFont {
    normal: Bitmap,
    big: Bitmap,
    tiny_a: Bitmap,
    tiny_b: Bitmap,
    tiny_blank: Bitmap,
    tiny_other: Bitmap,
}

pub const MONO_WIDTH: i32 = 6;

fn solid(width: usize, height: usize) -> Bitmap {
    let mut bitmap = Bitmap::new(width, height);
    for y in 0..height {
        for x in 0..width {
            bitmap.set(x, y, 1);
        }
    }
    bitmap
}

impl MonoFont {
    pub fn new() -> Self {
        let mut tiny_a = Bitmap::new(1, 8);
        tiny_a.set(0, 0, 1);
        let mut tiny_b = Bitmap::new(1, 8);
        tiny_b.set(0, 1, 1);
        let mut tiny_other = Bitmap::new(2, 8);
        for y in 0..8 {
            tiny_other.set(0, y, 1);
        }
        Self {
            normal: solid(5, 7),
            big: solid(10, 14),
            tiny_a,
            tiny_b,
            tiny_blank: Bitmap::new(2, 8),
            tiny_other,
        }
    }
}

impl SpriteFont for MonoFont {
    fn glyph_width(&self, size: FontSize, codepoint: u32) -> i32 {
        match size {
            FontSize::Tiny => self.glyph(size, codepoint).map_or(0, |g| g.width() as i32),
            FontSize::Big => MONO_WIDTH * 2,
            _ => MONO_WIDTH,
        }
    }

    fn glyph(&self, size: FontSize, codepoint: u32) -> Option<&Bitmap> {
        Some(match size {
            FontSize::Tiny => match char::from_u32(codepoint) {
                Some('A') => &self.tiny_a,
                Some('B') => &self.tiny_b,
                Some(' ') => &self.tiny_blank,
                _ => &self.tiny_other,
            },
            FontSize::Big => &self.big,
            _ => &self.normal,
        })
    }
}

/// Shared call counters of a [`CountingRasterizer`].
#[derive(Clone, Default)]
pub struct RasterCounters {
    renders: Rc<Cell<usize>>,
    measures: Rc<Cell<usize>>,
    fail_renders: Rc<Cell<bool>>,
}

impl RasterCounters {
    /// Makes every later `render` call return `None`.
    pub fn fail_renders(&self) {
        self.fail_renders.set(true);
    }

    pub fn renders(&self) -> usize {
        self.renders.get()
    }

    pub fn measures(&self) -> usize {
        self.measures.get()
    }
}

/// Each character is 7 pixels wide and 12 tall, with its first column inked.
/// Paths containing "missing" fail to open, and rendering can be made to
/// fail through [`RasterCounters::fail_renders`].
pub struct CountingRasterizer {
    counters: RasterCounters,
    open: Vec<bool>,
}

pub const RASTER_WIDTH: i32 = 7;
pub const RASTER_HEIGHT: i32 = 12;

impl CountingRasterizer {
    pub fn new() -> Self {
        Self {
            counters: RasterCounters::default(),
            open: Vec::new(),
        }
    }

    pub fn counters(&self) -> RasterCounters {
        self.counters.clone()
    }

    fn is_open(&self, font: FontId) -> bool {
        self.open.get(font.index()).copied().unwrap_or(false)
    }
}

impl Rasterizer for CountingRasterizer {
    fn open_font(&mut self, path: &Path, _point_size: u32) -> Result<FontId, FontLoadError> {
        if path.to_string_lossy().contains("missing") {
            return Err(FontLoadError::Io {
                path: path.to_owned(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such font"),
            });
        }
        self.open.push(true);
        Ok(FontId::new(self.open.len() - 1))
    }

    fn close_font(&mut self, font: FontId) {
        if let Some(open) = self.open.get_mut(font.index()) {
            *open = false;
        }
    }

    fn measure(&mut self, font: FontId, text: &str) -> Result<(i32, i32), GlyphError> {
        if !self.is_open(font) {
            return Err(GlyphError::UnknownFont(font));
        }
        self.counters.measures.set(self.counters.measures.get() + 1);
        Ok((text.chars().count() as i32 * RASTER_WIDTH, RASTER_HEIGHT))
    }

    fn render(&mut self, font: FontId, text: &str) -> Option<Bitmap> {
        if !self.is_open(font) || text.is_empty() || self.counters.fail_renders.get() {
            return None;
        }
        self.counters.renders.set(self.counters.renders.get() + 1);
        let chars = text.chars().count();
        let mut bitmap = Bitmap::new(chars * RASTER_WIDTH as usize, RASTER_HEIGHT as usize);
        for i in 0..chars {
            for y in 0..RASTER_HEIGHT as usize {
                bitmap.set(i * RASTER_WIDTH as usize, y, 1);
            }
        }
        Some(bitmap)
    }

    fn has_glyph(&mut self, font: FontId, _c: char) -> bool {
        self.is_open(font)
    }
}

/// A context drawing only with [`MonoFont`].
pub fn mono_context() -> TextContext {
    TextContext::builder()
        .sprite_font(MonoFont::new())
        .rasterizer(CountingRasterizer::new())
        .build()
}

fn descriptor(name: &str, line_height: i32) -> FontDescriptor {
    FontDescriptor {
        path: name.into(),
        point_size: 9,
        offset_x: 0,
        offset_y: 0,
        line_height,
    }
}

/// A context with TrueType fonts for tiny and medium text.
pub fn truetype_context() -> (TextContext, RasterCounters) {
    let rasterizer = CountingRasterizer::new();
    let counters = rasterizer.counters();
    let mut cx = TextContext::builder()
        .sprite_font(MonoFont::new())
        .rasterizer(rasterizer)
        .build();
    cx.load_fonts(&FontSetConfig {
        tiny: Some(descriptor("tiny.ttf", 8)),
        medium: Some(descriptor("medium.ttf", 14)),
        ..Default::default()
    })
    .unwrap();
    (cx, counters)
}
