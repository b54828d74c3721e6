//! Text layout, glyph caching and scrolling marquee synthesis for
//! palette-indexed 2D renderers.
//!
//! Strings are byte sequences that mix UTF-8 text with in-band control
//! codes (colour changes, font-size changes, newlines, inline images).
//! A [`TextContext`] measures, wraps, clips and draws them, using either a
//! built-in bitmap font or a TrueType [`Rasterizer`] whose output is kept in
//! two bounded caches. A [`MarqueeEngine`] turns formatted strings into
//! small scrolling ticker-tape bitmaps and reuses them across frames.

mod bitmap;
mod cache;
mod clip;
pub mod codepoint;
mod context;
mod draw;
pub mod font;
pub mod format;
pub mod marquee;
pub mod markup;
mod measure;
mod palette;
mod process;
mod rasterizer;
mod sprite_font;
mod wrap;

#[cfg(test)]
mod testing;

pub use bitmap::{Bitmap, GlyphEffects, IndexedBuffer, NullSurface, Rect, Surface};
pub use cache::{CacheStats, GlyphBitmapCache, GlyphWidthCache, StaleProbeCache};
pub use context::{Settings, TextContext, TextContextBuilder};
pub use draw::Align;
pub use font::{FontDescriptor, FontSetConfig, FontSize};
pub use format::{FormatCode, FormattedString};
pub use marquee::{
    ImageInvalidator, MarqueeEngine, MarqueeFingerprint, MarqueeImage, MarqueeRequest, ScrollPath,
};
pub use measure::string_height;
pub use palette::{ColourShades, ColourTables, PaletteAdjustment, TextColour, TextPalette};
pub use process::{Darkness, DrawFlags, TextDrawState, TextStyle};
pub use rasterizer::{FontId, FontLoadError, FontdueRasterizer, GlyphError, Rasterizer};
pub use sprite_font::{BuiltinFont, SpriteFont};
pub use wrap::WrappedText;
