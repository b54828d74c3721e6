//! Scrolling ticker-tape marquees.
//!
//! A marquee is a small bitmap showing a window onto a looping string,
//! bent along a path of pixel positions (signs on slopes, banners, curved
//! ride entrances). Each frame the caller asks for the marquee of a
//! [`MarqueeFingerprint`]; identical requests reuse a slot's bitmap, and
//! new ones take over the slot that has gone unused the longest.

use ahash::AHashMap;
use once_cell::sync::Lazy;

use crate::{
    bitmap::Bitmap,
    codepoint,
    context::{Settings, TextContext},
    font::FontSize,
    format::{FormatCode, FormattedString},
    palette::ColourTables,
    sprite_font::SpriteFont,
};

/// Identifies the content of a marquee bitmap.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MarqueeFingerprint {
    pub string_id: u32,
    /// The first two format arguments of the string. The top byte of the
    /// second one is the colour.
    pub args: [u32; 2],
    /// Number of glyph columns scrolled past.
    pub scroll: u16,
    /// Index of the scroll path.
    pub mode: u16,
}

impl MarqueeFingerprint {
    /// The colour byte: low 7 bits colour index, top bit translucent.
    pub fn colour(&self) -> u8 {
        (self.args[1] >> 24) as u8
    }
}

/// The image to draw for a marquee request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MarqueeImage {
    /// The placeholder image for views where marquees are not synthesized.
    Default,
    /// A synthesized marquee with this image id.
    Slot(u32),
}

impl MarqueeImage {
    pub fn image_id(self) -> Option<u32> {
        match self {
            MarqueeImage::Default => None,
            MarqueeImage::Slot(id) => Some(id),
        }
    }
}

/// Told when a marquee image's pixels have changed.
pub trait ImageInvalidator {
    fn invalidate_image(&mut self, image: u32);
}

impl<F> ImageInvalidator for F
where
    F: FnMut(u32),
{
    fn invalidate_image(&mut self, image: u32) {
        self(image)
    }
}

#[derive(Copy, Clone, Debug)]
pub struct MarqueeRequest<'a> {
    pub fingerprint: MarqueeFingerprint,
    /// The formatted string the fingerprint stands for.
    pub text: &'a [u8],
    /// Zero for full-size views; anything else returns [`MarqueeImage::Default`].
    pub zoom_level: u8,
}

/// The pixel positions successive glyph columns are written to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScrollPath {
    points: Vec<(u16, u16)>,
}

impl ScrollPath {
    pub fn new(points: impl IntoIterator<Item = (u16, u16)>) -> Self {
        Self {
            points: points.into_iter().collect(),
        }
    }

    /// Builds a path from flat offsets `y * width + x`, stopping at the
    /// first negative offset.
    pub fn from_raw(offsets: &[i16], width: usize) -> Self {
        let width = width.max(1);
        Self::new(
            offsets
                .iter()
                .take_while(|&&offset| offset >= 0)
                .map(|&offset| {
                    let offset = offset as usize;
                    ((offset % width) as u16, (offset / width) as u16)
                }),
        )
    }

    pub fn points(&self) -> &[(u16, u16)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// One of the ready-made paths for a 64x40 marquee.
    pub fn builtin(mode: u16) -> Option<&'static ScrollPath> {
        BUILTIN_PATHS.get(mode as usize)
    }

    pub fn builtin_paths() -> &'static [ScrollPath] {
        &BUILTIN_PATHS
    }
}

/// How a built-in path is traced: `columns` points from `(x, y)` moving
/// one pixel right each, and one pixel vertically every `run` columns.
#[derive(Copy, Clone)]
enum Trace {
    Line {
        x: u16,
        y: u16,
        columns: u16,
        rise: i16,
        run: u16,
    },
    /// Down to the middle column, then back up.
    Chevron { x: u16, y: u16, columns: u16 },
}

const TRACES: [Trace; 10] = [
    Trace::Line { x: 35, y: 12, columns: 24, rise: -1, run: 2 },
    Trace::Line { x: 5, y: 1, columns: 24, rise: 1, run: 2 },
    Trace::Chevron { x: 12, y: 1, columns: 39 },
    Trace::Line { x: 16, y: 0, columns: 33, rise: 1, run: 2 },
    Trace::Line { x: 15, y: 17, columns: 34, rise: -1, run: 2 },
    Trace::Line { x: 4, y: 12, columns: 24, rise: -1, run: 2 },
    Trace::Line { x: 36, y: 1, columns: 24, rise: 1, run: 2 },
    Trace::Line { x: 0, y: 0, columns: 64, rise: 0, run: 1 },
    Trace::Line { x: 2, y: 30, columns: 61, rise: -1, run: 2 },
    Trace::Line { x: 1, y: 0, columns: 61, rise: 1, run: 2 },
];

static BUILTIN_PATHS: Lazy<Vec<ScrollPath>> =
    Lazy::new(|| TRACES.iter().map(|&trace| trace_path(trace)).collect());

fn trace_path(trace: Trace) -> ScrollPath {
    match trace {
        Trace::Line {
            x,
            y,
            columns,
            rise,
            run,
        } => ScrollPath::new((0..columns).map(|i| {
            let dy = rise as i32 * (i / run) as i32;
            (x + i, (y as i32 + dy).max(0) as u16)
        })),
        Trace::Chevron { x, y, columns } => ScrollPath::new((0..columns).map(|i| {
            let from_edge = i.min(columns - 1 - i);
            (x + i, y + from_edge / 2)
        })),
    }
}

/// The string is repeated at most this many times to fill a path.
///
/// Wrapping stops after the last pass, so a string much shorter than
/// the path leaves the rest of the path blank.
const MAX_REPEATS: usize = 4;

/// Pixel value marking ink in bitmap-font glyphs.
const GLYPH_INK: u8 = 1;

/// Glyph columns are eight rows tall.
const COLUMN_ROWS: usize = 8;

/// Rows at the top of a rasterized tiny-font run above the marquee band.
const RASTER_TOP_ROWS: i32 = 2;
const RASTER_BAND_ROWS: i32 = 7;

struct MarqueeSlot {
    fingerprint: Option<MarqueeFingerprint>,
    last_used: u32,
    bitmap: Bitmap,
}

/// A fixed pool of marquee bitmaps.
pub struct MarqueeEngine {
    slots: Vec<MarqueeSlot>,
    paths: Vec<ScrollPath>,
    counter: u32,
    image_base: u32,
    upper_case: bool,
    /// Column bitmasks of tiny bitmap-font glyphs, row 0 in the low bit.
    glyph_columns: AHashMap<u32, Box<[u8]>>,
}

impl MarqueeEngine {
    /// Creates an engine with the slot count, bitmap size, image ids and
    /// case option of `settings`, using the built-in paths.
    pub fn new(settings: &Settings) -> Self {
        let slots = (0..settings.marquee_slots.max(1))
            .map(|_| MarqueeSlot {
                fingerprint: None,
                last_used: 0,
                bitmap: Bitmap::new(settings.marquee_width, settings.marquee_height),
            })
            .collect();
        Self {
            slots,
            paths: ScrollPath::builtin_paths().to_vec(),
            counter: 0,
            image_base: settings.marquee_image_base,
            upper_case: settings.upper_case_marquees,
            glyph_columns: AHashMap::new(),
        }
    }

    /// Replaces the path table; a fingerprint's `mode` indexes it.
    pub fn with_paths(mut self, paths: Vec<ScrollPath>) -> Self {
        self.paths = paths;
        self
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the image for `request`, synthesizing it into the least
    /// recently used slot unless a slot already holds the same fingerprint.
    pub fn request(
        &mut self,
        cx: &mut TextContext,
        request: MarqueeRequest,
        invalidator: &mut dyn ImageInvalidator,
    ) -> MarqueeImage {
        if request.zoom_level > 0 {
            return MarqueeImage::Default;
        }
        let fingerprint = request.fingerprint;
        if fingerprint.mode as usize >= self.paths.len() {
            log::debug!("No scroll path for marquee mode {}", fingerprint.mode);
            return MarqueeImage::Default;
        }

        self.counter = self.counter.wrapping_add(1);

        let mut oldest = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.fingerprint == Some(fingerprint) {
                slot.last_used = self.counter;
                return MarqueeImage::Slot(self.image_base + index as u32);
            }
        }
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.last_used < self.slots[oldest].last_used {
                oldest = index;
            }
        }

        log::trace!(
            "Marquee slot {} now shows string {} at scroll {}",
            oldest,
            fingerprint.string_id,
            fingerprint.scroll
        );

        let text = if self.upper_case {
            upper_cased(request.text)
        } else {
            FormattedString::from_bytes(request.text)
        };

        let image = self.image_base + oldest as u32;
        let Self {
            slots,
            paths,
            glyph_columns,
            counter,
            ..
        } = &mut *self;
        let slot = &mut slots[oldest];
        slot.fingerprint = Some(fingerprint);
        slot.last_used = *counter;
        slot.bitmap.clear();

        let path = &paths[fingerprint.mode as usize];
        let colour = cx.colours.marquee_colour(fingerprint.colour());
        if !draw_truetype_columns(cx, text.as_bytes(), fingerprint.scroll, path, colour, &mut slot.bitmap) {
            draw_sprite_columns(
                glyph_columns,
                &*cx.sprite_font,
                &cx.colours,
                text.as_bytes(),
                fingerprint.scroll,
                path,
                colour,
                &mut slot.bitmap,
            );
        }

        invalidator.invalidate_image(image);
        MarqueeImage::Slot(image)
    }

    /// The bitmap behind a marquee image.
    pub fn bitmap(&self, image: MarqueeImage) -> Option<&Bitmap> {
        let id = image.image_id()?;
        let index = id.checked_sub(self.image_base)?;
        self.slots.get(index as usize).map(|slot| &slot.bitmap)
    }

    /// Forgets every slot's fingerprint so the next requests synthesize
    /// again, e.g. after the language or the bitmap font changed.
    pub fn invalidate(&mut self) {
        for slot in &mut self.slots {
            slot.fingerprint = None;
        }
        self.glyph_columns.clear();
    }
}

fn upper_cased(text: &[u8]) -> FormattedString {
    let mut out = FormattedString::new();
    for token in codepoint::tokens(text) {
        if token.is_control {
            out.bytes_mut()
                .extend_from_slice(&text[token.start..token.end]);
        } else {
            for c in codepoint::to_char(token.codepoint).to_uppercase() {
                out.push_char(c);
            }
        }
    }
    out
}

fn column_bits(font: &dyn SpriteFont, codepoint: u32) -> Box<[u8]> {
    let width = font.glyph_width(FontSize::Tiny, codepoint).max(0) as usize;
    let glyph = font.glyph(FontSize::Tiny, codepoint);
    (0..width)
        .map(|x| match glyph {
            Some(glyph) => (0..glyph.height().min(COLUMN_ROWS))
                .filter(|&y| glyph.get(x, y) == GLYPH_INK)
                .fold(0u8, |bits, y| bits | 1 << y),
            None => 0,
        })
        .collect()
}

fn write_column(bitmap: &mut Bitmap, (x, y): (u16, u16), bits: u8, colour: u8) {
    let (x, y) = (x as usize, y as usize);
    if x >= bitmap.width() {
        return;
    }
    for row in 0..COLUMN_ROWS {
        if bits & (1 << row) != 0 && y + row < bitmap.height() {
            bitmap.set(x, y + row, colour);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_sprite_columns(
    glyph_columns: &mut AHashMap<u32, Box<[u8]>>,
    font: &dyn SpriteFont,
    colours: &ColourTables,
    text: &[u8],
    scroll: u16,
    path: &ScrollPath,
    mut colour: u8,
    bitmap: &mut Bitmap,
) {
    let mut skip = scroll as usize;
    let mut points = path.points().iter();

    for _ in 0..MAX_REPEATS {
        for token in codepoint::tokens(text) {
            if token.is_control {
                if let FormatCode::Colour(index) = FormatCode::decode(token.codepoint, token.args) {
                    colour = colours.colour_code_primary(index);
                }
                continue;
            }

            let columns = glyph_columns
                .entry(token.codepoint)
                .or_insert_with(|| column_bits(font, token.codepoint));
            for &bits in columns.iter() {
                if skip > 0 {
                    skip -= 1;
                    continue;
                }
                match points.next() {
                    Some(&point) => write_column(bitmap, point, bits, colour),
                    None => return,
                }
            }
        }
    }
}

/// Draws the marquee from the tiny TrueType font. Returns false when no
/// such font is loaded and the bitmap font has to be used instead.
fn draw_truetype_columns(
    cx: &mut TextContext,
    text: &[u8],
    scroll: u16,
    path: &ScrollPath,
    mut colour: u8,
    bitmap: &mut Bitmap,
) -> bool {
    if !cx.is_truetype_active() {
        return false;
    }
    let font = match cx.truetype_font(FontSize::Tiny) {
        Some(font) => font,
        None => return false,
    };

    let mut plain = String::new();
    for token in codepoint::tokens(text) {
        if !token.is_control {
            plain.push(codepoint::to_char(token.codepoint));
        } else if let FormatCode::Colour(index) = FormatCode::decode(token.codepoint, token.args) {
            colour = cx.colours.colour_code_primary(index);
        }
    }

    let tick = cx.draw_tick();
    let rasterizer = &mut cx.rasterizer;
    let run = match cx.bitmap_cache.get_or_insert_with(font.id, &plain, tick, || {
        rasterizer.render(font.id, &plain).map(Into::into)
    }) {
        Some(run) => run,
        None => return true,
    };
    let width = run.width();
    if width == 0 {
        return true;
    }

    let first_row = -font.offset.y;
    let last_row = (run.height() as i32 - RASTER_TOP_ROWS).min(first_row + RASTER_BAND_ROWS);

    let mut skip = scroll as usize;
    let mut x = 0;
    for &(px, py) in path.points() {
        while skip > 0 {
            skip -= 1;
            x = (x + 1) % width;
        }
        for (row, y) in (first_row..last_row).enumerate() {
            let src_y = y + RASTER_TOP_ROWS;
            if src_y < 0 {
                continue;
            }
            let dst = (px as usize, py as usize + row);
            if run.get(x, src_y as usize) != 0 && dst.0 < bitmap.width() && dst.1 < bitmap.height()
            {
                bitmap.set(dst.0, dst.1, colour);
            }
        }
        x = (x + 1) % width;
    }
    true
}
