use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    cache::{CacheStats, GlyphBitmapCache, GlyphWidthCache},
    font::{FontSet, FontSetConfig, FontSize, LoadedFont},
    palette::ColourTables,
    rasterizer::{FontLoadError, FontdueRasterizer, Rasterizer},
    sprite_font::{BuiltinFont, SpriteFont},
};

/// Tunable limits, with defaults matching the classic renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Slots in the rasterized-run cache.
    pub bitmap_cache_capacity: usize,
    /// Slots in the run-width cache.
    pub width_cache_capacity: usize,
    /// Frames after which an unused cache entry may be replaced.
    pub cache_staleness: u32,
    pub marquee_slots: usize,
    pub marquee_width: usize,
    pub marquee_height: usize,
    /// Image id of the first marquee slot; slot `i` is `marquee_image_base + i`.
    pub marquee_image_base: u32,
    pub upper_case_marquees: bool,
    /// Glyphs kept by the default rasterizer.
    pub glyph_raster_cache_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bitmap_cache_capacity: 256,
            width_cache_capacity: 1024,
            cache_staleness: 64,
            marquee_slots: 32,
            marquee_width: 64,
            marquee_height: 40,
            marquee_image_base: 1542,
            upper_case_marquees: false,
            glyph_raster_cache_size: 512,
        }
    }
}

/// Builder for a [`TextContext`].
pub struct TextContextBuilder {
    settings: Settings,
    sprite_font: Option<Box<dyn SpriteFont>>,
    rasterizer: Option<Box<dyn Rasterizer>>,
    colours: ColourTables,
}

impl TextContextBuilder {
    /// Replaces all settings at once, e.g. with values loaded from a config file.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the number of rasterized runs kept between frames.
    ///
    /// The default is 256.
    pub fn bitmap_cache_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0);
        self.settings.bitmap_cache_capacity = capacity;
        self
    }

    /// Sets the number of run widths kept between frames.
    ///
    /// The default is 1024.
    pub fn width_cache_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0);
        self.settings.width_cache_capacity = capacity;
        self
    }

    /// Sets how many frames a cache entry must go unused before its
    /// slot may be reused for another run.
    ///
    /// The default is 64.
    pub fn cache_staleness(mut self, frames: u32) -> Self {
        self.settings.cache_staleness = frames;
        self
    }

    /// Sets the number and size of marquee bitmaps.
    ///
    /// The default is 32 slots of 64x40 pixels.
    pub fn marquee_slots(mut self, slots: usize, width: usize, height: usize) -> Self {
        assert!(slots > 0 && width > 0 && height > 0);
        self.settings.marquee_slots = slots;
        self.settings.marquee_width = width;
        self.settings.marquee_height = height;
        self
    }

    pub fn marquee_image_base(mut self, base: u32) -> Self {
        self.settings.marquee_image_base = base;
        self
    }

    pub fn upper_case_marquees(mut self, enabled: bool) -> Self {
        self.settings.upper_case_marquees = enabled;
        self
    }

    pub fn sprite_font(mut self, font: impl SpriteFont + 'static) -> Self {
        self.sprite_font = Some(Box::new(font));
        self
    }

    pub fn rasterizer(mut self, rasterizer: impl Rasterizer + 'static) -> Self {
        self.rasterizer = Some(Box::new(rasterizer));
        self
    }

    pub fn colour_tables(mut self, colours: ColourTables) -> Self {
        self.colours = colours;
        self
    }

    /// Builds the context.
    pub fn build(self) -> TextContext {
        let settings = self.settings;
        assert!(settings.bitmap_cache_capacity > 0 && settings.width_cache_capacity > 0);

        TextContext {
            bitmap_cache: GlyphBitmapCache::new(
                settings.bitmap_cache_capacity,
                settings.cache_staleness,
            ),
            width_cache: GlyphWidthCache::new(
                settings.width_cache_capacity,
                settings.cache_staleness,
            ),
            sprite_font: self.sprite_font.unwrap_or_else(|| Box::new(BuiltinFont)),
            rasterizer: self.rasterizer.unwrap_or_else(|| {
                Box::new(FontdueRasterizer::new(settings.glyph_raster_cache_size))
            }),
            fonts: FontSet::default(),
            colours: self.colours,
            image_widths: AHashMap::new(),
            draw_tick: 0,
            warned_fallback: [false; 4],
            settings,
        }
    }
}

/// Owns everything text drawing needs between frames: fonts, the two run
/// caches, colour tables and the frame counter.
///
/// Measuring and drawing live in `measure`, `wrap`, `clip` and `draw`.
pub struct TextContext {
    settings: Settings,

    pub(crate) sprite_font: Box<dyn SpriteFont>,
    pub(crate) rasterizer: Box<dyn Rasterizer>,
    fonts: FontSet,

    pub(crate) colours: ColourTables,
    image_widths: AHashMap<u32, i32>,

    pub(crate) bitmap_cache: GlyphBitmapCache,
    pub(crate) width_cache: GlyphWidthCache,
    draw_tick: u32,

    warned_fallback: [bool; 4],
}

impl Default for TextContext {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl TextContext {
    pub fn builder() -> TextContextBuilder {
        TextContextBuilder {
            settings: Settings::default(),
            sprite_font: None,
            rasterizer: None,
            colours: ColourTables::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn colours(&self) -> &ColourTables {
        &self.colours
    }

    pub fn colours_mut(&mut self) -> &mut ColourTables {
        &mut self.colours
    }

    /// Sets the colours used by the WINDOW_COLOUR_1..3 codes.
    pub fn set_window_colours(&mut self, colours: [u8; 3]) {
        self.colours.window_colours = colours;
    }

    /// Registers the width of an inline image so layout can advance past it.
    pub fn register_image(&mut self, image: u32, width: i32) {
        self.image_widths.insert(image, width);
    }

    /// Width of an inline image; unknown images are zero wide.
    pub fn image_width(&self, image: u32) -> i32 {
        self.image_widths.get(&image).copied().unwrap_or(0)
    }

    /// The current frame number used for cache staleness.
    pub fn draw_tick(&self) -> u32 {
        self.draw_tick
    }

    /// Advances the frame counter. Call once per rendered frame.
    pub fn advance_frame(&mut self) {
        self.draw_tick = self.draw_tick.wrapping_add(1);
    }

    /// Opens the TrueType fonts in `config`, replacing any loaded before.
    ///
    /// Sizes whose font fails to load fall back to the bitmap font; the
    /// first failure is returned after every size has been attempted.
    pub fn load_fonts(&mut self, config: &FontSetConfig) -> Result<(), FontLoadError> {
        self.dispose_fonts();
        let (fonts, error) = FontSet::load(config, &mut *self.rasterizer);
        self.fonts = fonts;
        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Closes all TrueType fonts and empties both caches.
    pub fn dispose_fonts(&mut self) {
        let ids: Vec<_> = self.fonts.ids().collect();
        for id in ids {
            self.rasterizer.close_font(id);
        }
        self.fonts = FontSet::default();
        self.bitmap_cache.clear();
        self.width_cache.clear();
        self.warned_fallback = [false; 4];
    }

    /// Whether any TrueType font is loaded.
    pub fn is_truetype_active(&self) -> bool {
        !self.fonts.is_empty()
    }

    /// The TrueType font for `size`, if TrueType text is active and one loaded.
    /// Logs once per size when TrueType is active but the size has none.
    pub(crate) fn truetype_font(&mut self, size: FontSize) -> Option<LoadedFont> {
        let font = self.fonts.get(size);
        if font.is_none() && self.is_truetype_active() && !self.warned_fallback[size.index()] {
            self.warned_fallback[size.index()] = true;
            log::warn!("No TrueType font for {:?} text; using the bitmap font", size);
        }
        font
    }

    /// Distance between baselines of consecutive lines.
    pub fn line_height(&self, size: FontSize) -> i32 {
        match self.fonts.get(size) {
            Some(font) => font.line_height,
            None => size.sprite_line_height(),
        }
    }

    /// Line advance of the "smaller" newline code.
    pub fn line_height_small(&self, size: FontSize) -> i32 {
        self.line_height(size) / 2
    }

    pub fn bitmap_cache_stats(&self) -> CacheStats {
        self.bitmap_cache.stats()
    }

    pub fn width_cache_stats(&self) -> CacheStats {
        self.width_cache.stats()
    }

    /// Reports cache occupancy and hit rates at debug level.
    pub fn log_cache_stats(&self) {
        self.bitmap_cache.log_stats("Glyph bitmap");
        self.width_cache.log_stats("Glyph width");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        font::FontDescriptor,
        testing::{truetype_context, CountingRasterizer},
    };

    fn medium_only() -> FontSetConfig {
        FontSetConfig {
            medium: Some(FontDescriptor {
                path: "medium.ttf".into(),
                point_size: 9,
                offset_x: 0,
                offset_y: 0,
                line_height: 14,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn settings_round_trip_with_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "cache_staleness": 10, "upper_case_marquees": true }"#)
                .unwrap();
        assert_eq!(settings.cache_staleness, 10);
        assert!(settings.upper_case_marquees);
        assert_eq!(settings.bitmap_cache_capacity, 256);
        assert_eq!(settings.width_cache_capacity, 1024);

        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(serde_json::from_str::<Settings>(&json).unwrap(), settings);
    }

    #[test]
    fn builder_sizes_caches() {
        let cx = TextContext::builder()
            .bitmap_cache_capacity(8)
            .width_cache_capacity(16)
            .build();
        assert_eq!(cx.bitmap_cache_stats().capacity, 8);
        assert_eq!(cx.width_cache_stats().capacity, 16);
    }

    #[test]
    #[should_panic]
    fn zero_capacity_is_rejected() {
        let _ = TextContext::builder().bitmap_cache_capacity(0);
    }

    #[test]
    fn line_height_follows_loaded_fonts() {
        let mut cx = TextContext::builder()
            .rasterizer(CountingRasterizer::new())
            .build();
        assert_eq!(cx.line_height(FontSize::Medium), 10);
        assert!(!cx.is_truetype_active());

        cx.load_fonts(&medium_only()).unwrap();
        assert!(cx.is_truetype_active());
        assert_eq!(cx.line_height(FontSize::Medium), 14);
        assert_eq!(cx.line_height_small(FontSize::Medium), 7);
        assert_eq!(cx.line_height(FontSize::Big), 18);

        cx.dispose_fonts();
        assert!(!cx.is_truetype_active());
        assert_eq!(cx.line_height(FontSize::Medium), 10);
    }

    #[test]
    fn images_default_to_zero_width() {
        let mut cx = TextContext::default();
        cx.register_image(7, 12);
        assert_eq!(cx.image_width(7), 12);
        assert_eq!(cx.image_width(8), 0);
    }

    #[test]
    fn bitmap_fallback_warns_once_per_size() {
        let (mut cx, _) = truetype_context();
        assert!(cx.truetype_font(FontSize::Small).is_none());
        assert!(cx.truetype_font(FontSize::Small).is_none());
        assert!(cx.warned_fallback[FontSize::Small.index()]);
        assert!(cx.truetype_font(FontSize::Medium).is_some());
        assert!(!cx.warned_fallback[FontSize::Medium.index()]);

        cx.dispose_fonts();
        assert_eq!(cx.warned_fallback, [false; 4]);
        // bitmap text is expected once no TrueType font is loaded
        assert!(cx.truetype_font(FontSize::Small).is_none());
        assert!(!cx.warned_fallback[FontSize::Small.index()]);

        cx.load_fonts(&medium_only()).unwrap();
        assert!(cx.truetype_font(FontSize::Small).is_none());
        assert!(cx.warned_fallback[FontSize::Small.index()]);
    }
}
