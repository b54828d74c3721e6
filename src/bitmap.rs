//! 8-bit indexed bitmaps and the surfaces text is drawn onto.

use crate::palette::TextPalette;

/// A row-major 8-bit bitmap. `pitch` is the distance between rows in bytes.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Bitmap {
    pixels: Vec<u8>,
    width: usize,
    height: usize,
    pitch: usize,
}

impl Bitmap {
    /// Creates a zeroed bitmap.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height],
            width,
            height,
            pitch: width,
        }
    }

    /// Wraps existing pixel data.
    ///
    /// # Panics
    /// Panics if `pitch < width` or `pixels` is too short.
    pub fn from_pixels(pixels: Vec<u8>, width: usize, height: usize, pitch: usize) -> Self {
        assert!(pitch >= width, "pitch must be at least the width");
        assert!(
            pixels.len() >= pitch * height.saturating_sub(1) + width * (height > 0) as usize,
            "pixel buffer too small for {}x{} bitmap with pitch {}",
            width,
            height,
            pitch
        );
        Self {
            pixels,
            width,
            height,
            pitch,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Returns the pixel at (x, y), or 0 outside the bitmap.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.pixels[y * self.pitch + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x < self.width && y < self.height {
            self.pixels[y * self.pitch + x] = value;
        }
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.pitch;
        &self.pixels[start..start + self.width]
    }

    pub fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|p| *p = 0);
    }

    /// Whether every pixel is zero.
    pub fn is_blank(&self) -> bool {
        (0..self.height).all(|y| self.row(y).iter().all(|&p| p == 0))
    }
}

/// An inclusive pixel rectangle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Effects applied when blitting a rasterized glyph run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphEffects {
    /// Draw palette entry 3 on the four neighbours of each inked pixel.
    pub outline: bool,
    /// Draw palette entry 3 one pixel down and right of each inked pixel.
    pub inset: bool,
}

/// A drawing target for text.
///
/// Coordinates are in surface space and may lie partly or wholly outside
/// it; implementations clip.
pub trait Surface {
    /// Draws a bitmap-font glyph, remapping each non-zero pixel through `palette`.
    /// Pixels whose remapped value is 0 are transparent.
    fn draw_glyph(&mut self, glyph: &Bitmap, x: i32, y: i32, palette: &TextPalette);

    /// Draws a 1-bit rasterized glyph run: pixels equal to 1 are ink.
    fn draw_glyph_bitmap(
        &mut self,
        bitmap: &Bitmap,
        x: i32,
        y: i32,
        palette: &TextPalette,
        effects: GlyphEffects,
    );

    /// Draws an inline image identified by `image`.
    fn draw_image(&mut self, image: u32, x: i32, y: i32);

    fn fill_rect(&mut self, rect: Rect, colour: u8);
}

/// A surface that discards everything, for measuring.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn draw_glyph(&mut self, _glyph: &Bitmap, _x: i32, _y: i32, _palette: &TextPalette) {}

    fn draw_glyph_bitmap(
        &mut self,
        _bitmap: &Bitmap,
        _x: i32,
        _y: i32,
        _palette: &TextPalette,
        _effects: GlyphEffects,
    ) {
    }

    fn draw_image(&mut self, _image: u32, _x: i32, _y: i32) {}

    fn fill_rect(&mut self, _rect: Rect, _colour: u8) {}
}

/// A software 8bpp surface whose top-left pixel sits at `origin`.
///
/// Inline images have no pixel source here; they are recorded in
/// [`IndexedBuffer::images`] for the caller to composite.
#[derive(Clone, Debug)]
pub struct IndexedBuffer {
    bitmap: Bitmap,
    origin: (i32, i32),
    images: Vec<(u32, i32, i32)>,
}

impl IndexedBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_origin(width, height, 0, 0)
    }

    pub fn with_origin(width: usize, height: usize, x: i32, y: i32) -> Self {
        Self {
            bitmap: Bitmap::new(width, height),
            origin: (x, y),
            images: Vec::new(),
        }
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// Inline images drawn so far, as `(image, x, y)`.
    pub fn images(&self) -> &[(u32, i32, i32)] {
        &self.images
    }

    /// Reads a pixel in surface coordinates.
    pub fn pixel(&self, x: i32, y: i32) -> u8 {
        match self.local(x, y) {
            Some((lx, ly)) => self.bitmap.get(lx, ly),
            None => 0,
        }
    }

    pub fn put(&mut self, x: i32, y: i32, colour: u8) {
        if let Some((lx, ly)) = self.local(x, y) {
            self.bitmap.set(lx, ly, colour);
        }
    }

    pub fn clear(&mut self) {
        self.bitmap.clear();
        self.images.clear();
    }

    fn local(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        let lx = x - self.origin.0;
        let ly = y - self.origin.1;
        if lx < 0 || ly < 0 || lx as usize >= self.bitmap.width() || ly as usize >= self.bitmap.height()
        {
            return None;
        }
        Some((lx as usize, ly as usize))
    }

    fn inked_pixels(bitmap: &Bitmap) -> impl Iterator<Item = (i32, i32)> + '_ {
        (0..bitmap.height()).flat_map(move |sy| {
            (0..bitmap.width())
                .filter(move |&sx| bitmap.get(sx, sy) == 1)
                .map(move |sx| (sx as i32, sy as i32))
        })
    }
}

impl Surface for IndexedBuffer {
    fn draw_glyph(&mut self, glyph: &Bitmap, x: i32, y: i32, palette: &TextPalette) {
        for sy in 0..glyph.height() {
            for sx in 0..glyph.width() {
                let value = glyph.get(sx, sy);
                if value == 0 {
                    continue;
                }
                let colour = palette.get(value);
                if colour != 0 {
                    self.put(x + sx as i32, y + sy as i32, colour);
                }
            }
        }
    }

    fn draw_glyph_bitmap(
        &mut self,
        bitmap: &Bitmap,
        x: i32,
        y: i32,
        palette: &TextPalette,
        effects: GlyphEffects,
    ) {
        let colour = palette.primary();
        let highlight = palette.highlight();

        if effects.outline {
            for (sx, sy) in Self::inked_pixels(bitmap) {
                for (dx, dy) in [(1, 0), (-1, 0), (0, -1), (0, 1)] {
                    self.put(x + sx + dx, y + sy + dy, highlight);
                }
            }
        }

        for (sx, sy) in Self::inked_pixels(bitmap) {
            if effects.inset {
                self.put(x + sx + 1, y + sy + 1, highlight);
            }
            self.put(x + sx, y + sy, colour);
        }
    }

    fn draw_image(&mut self, image: u32, x: i32, y: i32) {
        self.images.push((image, x, y));
    }

    fn fill_rect(&mut self, rect: Rect, colour: u8) {
        for y in rect.top..=rect.bottom {
            for x in rect.left..=rect.right {
                self.put(x, y, colour);
            }
        }
    }
}
