//! The format-run processor shared by measuring and drawing.
//!
//! A string is walked token by token. Control codes update a
//! [`TextDrawState`]; runs of plain characters are drawn either glyph by
//! glyph from the bitmap font or as one rasterized TrueType run. With
//! [`DrawFlags::NO_DRAW`] set nothing reaches the surface and the state
//! only accumulates extents.

use glam::IVec2;

use crate::{
    bitmap::{GlyphEffects, NullSurface, Surface},
    codepoint::{self, Token},
    context::TextContext,
    font::FontSize,
    format::FormatCode,
    palette::{TextColour, TextPalette},
};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DrawFlags: u32 {
        const INSET = 1 << 0;
        const OUTLINE = 1 << 1;
        const DARK = 1 << 2;
        const EXTRA_DARK = 1 << 3;
        /// Offset each bitmap-font glyph vertically by the next entry of
        /// the y-offset sequence.
        const Y_OFFSET_EFFECT = 1 << 29;
        /// Draw plain runs through the rasterizer.
        const TRUETYPE = 1 << 30;
        /// Measure only.
        const NO_DRAW = 1 << 31;
    }
}

impl Default for DrawFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl DrawFlags {
    /// Flags that survive from one draw call to the next.
    pub const PERSISTENT: DrawFlags = DrawFlags::INSET
        .union(DrawFlags::OUTLINE)
        .union(DrawFlags::DARK)
        .union(DrawFlags::EXTRA_DARK);
}

/// How dark the next indexed colour is drawn.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Darkness {
    #[default]
    Normal,
    Dark,
    ExtraDark,
}

/// Text style carried between draw calls: each draw starts from it and
/// writes the final font size, persistent flags and palette back.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TextStyle {
    pub font_size: FontSize,
    /// Consumed by the next draw with an indexed colour.
    pub darkness: Darkness,
    pub flags: DrawFlags,
    pub palette: TextPalette,
}

impl TextStyle {
    pub fn new(font_size: FontSize) -> Self {
        Self {
            font_size,
            ..Default::default()
        }
    }
}

/// Mutable state while walking one string.
#[derive(Clone, Debug)]
pub struct TextDrawState<'a> {
    pub origin: IVec2,
    pub cursor: IVec2,
    /// Largest cursor position reached on each axis.
    pub max: IVec2,
    pub font_size: FontSize,
    pub darkness: Darkness,
    pub flags: DrawFlags,
    pub palette: TextPalette,
    y_offsets: std::slice::Iter<'a, i8>,
}

impl<'a> TextDrawState<'a> {
    pub fn new(origin: IVec2, style: &TextStyle) -> Self {
        let no_offsets: &'a [i8] = &[];
        Self {
            origin,
            cursor: origin,
            max: origin,
            font_size: style.font_size,
            darkness: style.darkness,
            flags: style.flags,
            palette: style.palette,
            y_offsets: no_offsets.iter(),
        }
    }

    /// A state that only measures.
    pub fn measuring(font_size: FontSize) -> Self {
        let mut state = Self::new(IVec2::ZERO, &TextStyle::new(font_size));
        state.flags = DrawFlags::NO_DRAW;
        state
    }

    /// Enables the per-glyph vertical offset effect. The sequence is
    /// consumed one entry per bitmap-font glyph; once exhausted, offsets are 0.
    pub fn with_y_offsets(mut self, offsets: &'a [i8]) -> Self {
        self.flags |= DrawFlags::Y_OFFSET_EFFECT;
        self.y_offsets = offsets.iter();
        self
    }

    fn next_y_offset(&mut self) -> i32 {
        self.y_offsets.next().copied().unwrap_or(0) as i32
    }

    fn effects(&self) -> GlyphEffects {
        GlyphEffects {
            outline: self.flags.contains(DrawFlags::OUTLINE),
            inset: self.flags.contains(DrawFlags::INSET),
        }
    }

    /// Writes the persistent part of this state back to `style`.
    pub fn store(&self, style: &mut TextStyle) {
        style.font_size = self.font_size;
        style.darkness = self.darkness;
        style.flags = self.flags & DrawFlags::PERSISTENT;
        style.palette = self.palette;
    }
}

impl TextContext {
    /// Walks one line of `text`, drawing onto `surface` unless the state
    /// has [`DrawFlags::NO_DRAW`]. Stops at the end of the line or at a
    /// control code whose arguments are cut off.
    pub fn process_string(
        &mut self,
        surface: &mut dyn Surface,
        text: &[u8],
        state: &mut TextDrawState,
    ) {
        let truetype = state.flags.contains(DrawFlags::TRUETYPE);
        let mut offset = 0;

        while let Some(token) = codepoint::token_at(text, offset) {
            if token.is_control {
                self.process_format_code(surface, &token, state);
                offset = token.end;
            } else if truetype && codepoint::should_use_sprite(token.codepoint) {
                self.draw_character_sprite(surface, token.codepoint, state);
                offset = token.end;
            } else {
                offset = self.process_glyph_run(surface, text, offset, state);
            }
            state.max = state.max.max(state.cursor);
        }
    }

    /// Applies the starting colour of a draw call.
    ///
    /// An indexed colour resets the style flags, applies any pending
    /// darkness (which also forces medium text) and then either an inset
    /// shade pair or the colour's text shade.
    pub fn apply_initial_colour(&self, colour: TextColour, state: &mut TextDrawState) {
        let mut colour = match colour {
            TextColour::Keep => return,
            TextColour::Indexed(c) => c,
        };

        state.flags -= DrawFlags::PERSISTENT;
        if state.darkness != Darkness::Normal {
            state.flags |= DrawFlags::DARK;
            if state.darkness == Darkness::ExtraDark {
                state.flags |= DrawFlags::EXTRA_DARK;
            }
            state.darkness = Darkness::Normal;
            state.font_size = FontSize::Medium;
        }

        if colour & TextColour::OUTLINE != 0 {
            state.flags |= DrawFlags::OUTLINE;
        }
        colour &= !TextColour::OUTLINE;

        if colour & TextColour::INSET == 0 {
            let outline = state.flags.contains(DrawFlags::OUTLINE);
            self.colours
                .apply_window_colour(colour, outline, &mut state.palette);
        } else {
            state.flags |= DrawFlags::INSET;
            colour &= !TextColour::INSET;
            self.colours.apply_inset(
                colour,
                state.flags.contains(DrawFlags::DARK),
                state.flags.contains(DrawFlags::EXTRA_DARK),
                &mut state.palette,
            );
        }
    }

    fn process_format_code(
        &mut self,
        surface: &mut dyn Surface,
        token: &Token,
        state: &mut TextDrawState,
    ) {
        let outline = state.flags.contains(DrawFlags::OUTLINE);
        match FormatCode::decode(token.codepoint, token.args) {
            FormatCode::MoveX(x) => state.cursor.x = state.origin.x + x as i32,
            FormatCode::AdjustPalette(index) => {
                self.colours
                    .apply_adjustment(index, outline, &mut state.palette)
            }
            FormatCode::Newline => {
                state.cursor.x = state.origin.x;
                state.cursor.y += self.line_height(state.font_size);
            }
            FormatCode::NewlineSmaller => {
                state.cursor.x = state.origin.x;
                state.cursor.y += self.line_height_small(state.font_size);
            }
            FormatCode::Font(size) => state.font_size = size,
            FormatCode::Outline => state.flags |= DrawFlags::OUTLINE,
            FormatCode::OutlineOff => state.flags -= DrawFlags::OUTLINE,
            FormatCode::WindowColour(slot) => {
                self.colours
                    .apply_window_slot(slot, outline, &mut state.palette)
            }
            FormatCode::InlineImage(image) => {
                let width = self.image_width(image & 0x7FFFF);
                if !state.flags.contains(DrawFlags::NO_DRAW) {
                    surface.draw_image(image, state.cursor.x, state.cursor.y);
                }
                state.cursor.x += width;
            }
            FormatCode::Colour(index) => {
                self.colours
                    .apply_colour_code(index, outline, &mut state.palette)
            }
            FormatCode::Ignored => {}
        }
    }

    /// Draws the run of plain characters starting at `start` and returns
    /// the offset where the run ends.
    fn process_glyph_run(
        &mut self,
        surface: &mut dyn Surface,
        text: &[u8],
        start: usize,
        state: &mut TextDrawState,
    ) -> usize {
        let truetype = state.flags.contains(DrawFlags::TRUETYPE);
        let mut run = String::new();
        let mut end = start;
        while let Some((cp, next)) = codepoint::next(text, end) {
            if codepoint::is_format_code(cp) || (truetype && codepoint::should_use_sprite(cp)) {
                break;
            }
            run.push(codepoint::to_char(cp));
            end = next;
        }

        if truetype {
            self.draw_run_truetype(surface, &run, state);
        } else {
            self.draw_run_sprite(surface, &run, state);
        }
        end
    }

    fn draw_run_sprite(&mut self, surface: &mut dyn Surface, run: &str, state: &mut TextDrawState) {
        for c in run.chars() {
            self.draw_character_sprite(surface, c as u32, state);
        }
    }

    fn draw_character_sprite(
        &mut self,
        surface: &mut dyn Surface,
        codepoint: u32,
        state: &mut TextDrawState,
    ) {
        let width = self.sprite_font.glyph_width(state.font_size, codepoint);
        if !state.flags.contains(DrawFlags::NO_DRAW) {
            let mut y = state.cursor.y;
            if state.flags.contains(DrawFlags::Y_OFFSET_EFFECT) {
                y += state.next_y_offset();
            }
            if let Some(glyph) = self.sprite_font.glyph(state.font_size, codepoint) {
                surface.draw_glyph(glyph, state.cursor.x, y, &state.palette);
            }
        }
        state.cursor.x += width;
    }

    fn draw_run_truetype(
        &mut self,
        surface: &mut dyn Surface,
        run: &str,
        state: &mut TextDrawState,
    ) {
        let font = match self.truetype_font(state.font_size) {
            Some(font) => font,
            None => return self.draw_run_sprite(surface, run, state),
        };
        let tick = self.draw_tick();

        if state.flags.contains(DrawFlags::NO_DRAW) {
            let rasterizer = &mut self.rasterizer;
            let width = self
                .width_cache
                .get_or_insert_with(font.id, run, tick, || {
                    rasterizer
                        .measure(font.id, run)
                        .map(|(width, _)| width)
                        .map_err(|e| log::debug!("Unable to measure {:?}: {}", run, e))
                        .ok()
                })
                .unwrap_or(0);
            state.cursor.x += width;
            return;
        }

        let rasterizer = &mut self.rasterizer;
        let bitmap = match self
            .bitmap_cache
            .get_or_insert_with(font.id, run, tick, || rasterizer.render(font.id, run).map(Into::into))
        {
            Some(bitmap) => bitmap,
            None => return,
        };

        let position = state.cursor + font.offset;
        surface.draw_glyph_bitmap(&bitmap, position.x, position.y, &state.palette, state.effects());
        state.cursor.x += bitmap.width() as i32;
    }

    /// The furthest cursor position reached by `text`, without drawing.
    pub(crate) fn measure_extent(&mut self, text: &[u8], font_size: FontSize) -> IVec2 {
        let mut state = TextDrawState::measuring(font_size);
        if self.is_truetype_active() {
            state.flags |= DrawFlags::TRUETYPE;
        }
        self.process_string(&mut NullSurface, text, &mut state);
        state.max
    }
}
