//! Draw helpers built on the format-run processor.
//!
//! Every helper starts from the caller's [`TextStyle`] and writes the
//! resulting style back, so a colour or font change in one string carries
//! into the next draw unless the next call sets a colour of its own.

use glam::{ivec2, IVec2};

use crate::{
    bitmap::{Rect, Surface},
    codepoint,
    context::TextContext,
    format::{code, FormattedString},
    measure::string_height,
    palette::TextColour,
    process::{DrawFlags, TextDrawState, TextStyle},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Align {
    Left,
    Centre,
    Right,
}

impl TextContext {
    /// Draws one line of `text` with its left edge at (x, y) and returns
    /// the final cursor position.
    pub fn draw_string(
        &mut self,
        surface: &mut dyn Surface,
        text: impl AsRef<[u8]>,
        colour: TextColour,
        x: i32,
        y: i32,
        style: &mut TextStyle,
    ) -> IVec2 {
        self.draw_with_state(surface, text.as_ref(), colour, ivec2(x, y), style, &[], false)
    }

    /// Like [`draw_string`](Self::draw_string), offsetting each glyph
    /// vertically by the next entry of `y_offsets`. With
    /// `force_sprite_font` the bitmap font is used even if TrueType fonts
    /// are loaded, since rasterized runs cannot be offset per glyph.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_string_with_y_offsets(
        &mut self,
        surface: &mut dyn Surface,
        text: impl AsRef<[u8]>,
        colour: TextColour,
        x: i32,
        y: i32,
        y_offsets: &[i8],
        force_sprite_font: bool,
        style: &mut TextStyle,
    ) -> IVec2 {
        self.draw_with_state(
            surface,
            text.as_ref(),
            colour,
            ivec2(x, y),
            style,
            y_offsets,
            force_sprite_font,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_with_state(
        &mut self,
        surface: &mut dyn Surface,
        text: &[u8],
        colour: TextColour,
        origin: IVec2,
        style: &mut TextStyle,
        y_offsets: &[i8],
        force_sprite_font: bool,
    ) -> IVec2 {
        let mut state = TextDrawState::new(origin, style);
        if !y_offsets.is_empty() {
            state = state.with_y_offsets(y_offsets);
        }
        if self.is_truetype_active() && !force_sprite_font {
            state.flags |= DrawFlags::TRUETYPE;
        }
        self.apply_initial_colour(colour, &mut state);
        self.process_string(surface, text, &mut state);
        state.store(style);
        state.cursor
    }

    /// Applies `colour` to `style` without drawing anything.
    pub fn set_text_colour(&self, colour: TextColour, style: &mut TextStyle) {
        let mut state = TextDrawState::new(IVec2::ZERO, style);
        self.apply_initial_colour(colour, &mut state);
        state.store(style);
    }

    /// Draws `text` aligned horizontally on `x`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_string_aligned(
        &mut self,
        surface: &mut dyn Surface,
        text: impl AsRef<[u8]>,
        colour: TextColour,
        x: i32,
        y: i32,
        align: Align,
        style: &mut TextStyle,
    ) -> IVec2 {
        let text = text.as_ref();
        let x = self.aligned_x(text, x, align, style);
        self.draw_string(surface, text, colour, x, y, style)
    }

    /// Draws `text` with its vertical centre on `y`.
    pub fn draw_string_vertically_centred(
        &mut self,
        surface: &mut dyn Surface,
        text: impl AsRef<[u8]>,
        colour: TextColour,
        x: i32,
        y: i32,
        style: &mut TextStyle,
    ) -> IVec2 {
        let text = text.as_ref();
        let y = y - string_height(text, style.font_size) / 2;
        self.draw_string(surface, text, colour, x, y, style)
    }

    /// Clips `text` to `width` and draws it; with [`Align::Centre`] the
    /// clipped text is centred on `x`, with [`Align::Right`] it ends at `x`.
    /// Returns the clipped width.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_string_clipped(
        &mut self,
        surface: &mut dyn Surface,
        text: impl AsRef<[u8]>,
        colour: TextColour,
        x: i32,
        y: i32,
        width: i32,
        align: Align,
        style: &mut TextStyle,
    ) -> i32 {
        let mut buffer = FormattedString::from_bytes(text.as_ref());
        let clipped_width = self.clip_string(&mut buffer, width, style.font_size);
        let x = match align {
            Align::Left => x,
            Align::Centre => x - (clipped_width - 1) / 2,
            Align::Right => x - clipped_width,
        };
        self.draw_string(surface, buffer.as_bytes(), colour, x, y, style);
        clipped_width
    }

    /// Wraps `text` to `width` and draws the lines downwards from (x, y).
    /// With [`Align::Centre`] each line is centred on `x` and the block is
    /// centred vertically on `y`. Returns the height of the block.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_string_wrapped(
        &mut self,
        surface: &mut dyn Surface,
        text: impl AsRef<[u8]>,
        colour: TextColour,
        x: i32,
        y: i32,
        width: i32,
        align: Align,
        style: &mut TextStyle,
    ) -> i32 {
        self.draw_wrapped_lines(surface, text.as_ref(), colour, x, y, width, align, None, style)
    }

    /// Draws centred wrapped text revealing only the first `visible_chars`
    /// characters, for typewriter effects. Control codes are not counted.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_string_centred_wrapped_partial(
        &mut self,
        surface: &mut dyn Surface,
        text: impl AsRef<[u8]>,
        colour: TextColour,
        x: i32,
        y: i32,
        width: i32,
        visible_chars: usize,
        style: &mut TextStyle,
    ) -> i32 {
        self.draw_wrapped_lines(
            surface,
            text.as_ref(),
            colour,
            x,
            y,
            width,
            Align::Centre,
            Some(visible_chars),
            style,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_wrapped_lines(
        &mut self,
        surface: &mut dyn Surface,
        text: &[u8],
        colour: TextColour,
        x: i32,
        y: i32,
        width: i32,
        align: Align,
        visible_chars: Option<usize>,
        style: &mut TextStyle,
    ) -> i32 {
        self.set_text_colour(colour, style);
        style.flags = DrawFlags::empty();

        let mut buffer = FormattedString::from_bytes(text);
        let wrapped = self.wrap_string(&mut buffer, width, style.font_size);
        let mut line_height = wrapped.line_height;

        let mut line_y = y;
        if align == Align::Centre {
            if text.first() == Some(&(code::OUTLINE as u8)) {
                line_height += 1;
            }
            line_y -= (line_height / 2) * (wrapped.line_count as i32 - 1);
        }
        let top = line_y;

        let mut remaining = visible_chars;
        for line in buffer.lines() {
            let line = match remaining {
                Some(remaining) => visible_prefix(line, remaining),
                None => line,
            };
            if let Some(remaining) = remaining.as_mut() {
                *remaining = remaining.saturating_sub(visible_count(line));
            }

            let line_x = match align {
                Align::Left => x,
                _ => self.aligned_x(line, x, align, style),
            };
            self.draw_string(surface, line, TextColour::Keep, line_x, line_y, style);
            line_y += line_height;

            if remaining == Some(0) {
                break;
            }
        }
        line_y - top
    }

    /// Draws `text` and underlines it with the ink colour, plus a shadow
    /// line one pixel down and right when the palette has a shadow colour.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_string_underlined(
        &mut self,
        surface: &mut dyn Surface,
        text: impl AsRef<[u8]>,
        colour: TextColour,
        x: i32,
        y: i32,
        align: Align,
        style: &mut TextStyle,
    ) -> i32 {
        let text = text.as_ref();
        let width = self.string_width(text, style.font_size);
        let x = match align {
            Align::Left => x,
            Align::Centre => x - width / 2,
            Align::Right => x - width,
        };
        self.draw_string(surface, text, colour, x, y, style);

        let underline_y = y + UNDERLINE_OFFSET;
        surface.fill_rect(
            Rect::new(x, underline_y, x + width, underline_y),
            style.palette.primary(),
        );
        if style.palette.shadow() != 0 {
            surface.fill_rect(
                Rect::new(x + 1, underline_y + 1, x + width + 1, underline_y + 1),
                style.palette.shadow(),
            );
        }
        width
    }

    fn aligned_x(&mut self, text: &[u8], x: i32, align: Align, style: &TextStyle) -> i32 {
        match align {
            Align::Left => x,
            Align::Centre => x - self.string_width(text, style.font_size) / 2,
            Align::Right => x - self.string_width(text, style.font_size),
        }
    }
}

const UNDERLINE_OFFSET: i32 = 11;

/// Number of visible characters in a line.
fn visible_count(line: &[u8]) -> usize {
    codepoint::tokens(line).filter(|t| !t.is_control).count()
}

/// The prefix of `line` holding at most `chars` visible characters,
/// keeping control codes that precede the cut.
fn visible_prefix(line: &[u8], chars: usize) -> &[u8] {
    let mut seen = 0;
    for token in codepoint::tokens(line) {
        if token.is_control {
            continue;
        }
        if seen == chars {
            return &line[..token.start];
        }
        seen += 1;
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bitmap::IndexedBuffer,
        font::FontSize,
        format::FormatCode,
        palette::TextPalette,
        testing::{mono_context, MONO_WIDTH},
    };

    fn inked_columns(buffer: &IndexedBuffer, y: i32) -> Vec<i32> {
        (0..buffer.bitmap().width() as i32)
            .filter(|&x| buffer.pixel(x, y) != 0)
            .collect()
    }

    #[test]
    fn style_carries_between_draws() {
        let mut cx = mono_context();
        let mut buffer = IndexedBuffer::new(64, 32);
        let mut style = TextStyle::new(FontSize::Medium);

        let mut s = FormattedString::new();
        s.push_code(FormatCode::Colour(2))
            .push_code(FormatCode::Font(FontSize::Big))
            .push_str("a");
        cx.draw_string(&mut buffer, &s, TextColour::Indexed(4), 0, 0, &mut style);
        let after_first = style;
        assert_eq!(style.font_size, FontSize::Big);

        // Keep: the second draw starts from the stored palette and size
        let end = cx.draw_string(&mut buffer, "b", TextColour::Keep, 0, 16, &mut style);
        assert_eq!(end.x, 2 * MONO_WIDTH);
        assert_eq!(style.palette, after_first.palette);
    }

    #[test]
    fn transient_flags_are_not_stored() {
        let mut cx = mono_context();
        let mut buffer = IndexedBuffer::new(64, 32);
        let mut style = TextStyle::new(FontSize::Medium);
        cx.draw_string_with_y_offsets(
            &mut buffer,
            "ab",
            TextColour::outlined(1),
            0,
            0,
            &[1, 2],
            true,
            &mut style,
        );
        assert_eq!(style.flags, DrawFlags::OUTLINE);
    }

    #[test]
    fn alignment_moves_the_left_edge() {
        let mut cx = mono_context();
        let mut style = TextStyle {
            palette: TextPalette([0, 3, 0, 0, 0, 0, 0, 0]),
            ..TextStyle::new(FontSize::Medium)
        };

        let mut buffer = IndexedBuffer::new(64, 16);
        cx.draw_string_aligned(&mut buffer, "ab", TextColour::Keep, 40, 0, Align::Right, &mut style);
        assert_eq!(inked_columns(&buffer, 0).first(), Some(&28));

        let mut buffer = IndexedBuffer::new(64, 16);
        cx.draw_string_aligned(&mut buffer, "ab", TextColour::Keep, 40, 0, Align::Centre, &mut style);
        assert_eq!(inked_columns(&buffer, 0).first(), Some(&34));
    }

    #[test]
    fn clipped_draw_returns_clipped_width() {
        let mut cx = mono_context();
        let mut buffer = IndexedBuffer::new(128, 16);
        let mut style = TextStyle::new(FontSize::Medium);
        let width = cx.draw_string_clipped(
            &mut buffer,
            "HelloWorld",
            TextColour::Indexed(1),
            0,
            0,
            37,
            Align::Left,
            &mut style,
        );
        assert_eq!(width, 6 * MONO_WIDTH);
    }

    #[test]
    fn wrapped_draw_reports_block_height() {
        let mut cx = mono_context();
        let mut buffer = IndexedBuffer::new(128, 64);
        let mut style = TextStyle::new(FontSize::Medium);
        let height = cx.draw_string_wrapped(
            &mut buffer,
            "aa bb cc",
            TextColour::Indexed(1),
            0,
            0,
            4 * MONO_WIDTH,
            Align::Left,
            &mut style,
        );
        assert_eq!(height, 3 * 10);
        assert_eq!(style.font_size, FontSize::Medium);
    }

    #[test]
    fn partial_draw_reveals_prefix() {
        assert_eq!(visible_prefix(b"abcd", 2), b"ab");
        assert_eq!(visible_prefix(b"ab", 5), b"ab");
        let mut s = FormattedString::new();
        s.push_str("a").push_code(FormatCode::Outline).push_str("bc");
        assert_eq!(visible_prefix(s.as_bytes(), 1), &s.as_bytes()[..2]);

        let mut cx = mono_context();
        let mut style = TextStyle::new(FontSize::Medium);
        let mut buffer = IndexedBuffer::new(128, 64);
        let height = cx.draw_string_centred_wrapped_partial(
            &mut buffer,
            "aa bb cc",
            TextColour::Indexed(1),
            64,
            32,
            4 * MONO_WIDTH,
            3,
            &mut style,
        );
        // "aa" and the first character of "bb"
        assert_eq!(height, 2 * 10);
    }

    #[test]
    fn underline_uses_ink_and_shadow() {
        let mut cx = mono_context();
        let mut buffer = IndexedBuffer::new(64, 32);
        let mut style = TextStyle {
            palette: TextPalette([0, 5, 6, 0, 0, 0, 0, 0]),
            ..TextStyle::new(FontSize::Medium)
        };
        let width = cx.draw_string_underlined(
            &mut buffer,
            "ab",
            TextColour::Keep,
            0,
            0,
            Align::Left,
            &mut style,
        );
        assert_eq!(width, 2 * MONO_WIDTH);
        assert_eq!(buffer.pixel(0, 11), 5);
        assert_eq!(buffer.pixel(width, 11), 5);
        assert_eq!(buffer.pixel(0, 12), 0);
        assert_eq!(buffer.pixel(1, 12), 6);
    }

    #[test]
    fn vertical_centring_uses_string_height() {
        let mut cx = mono_context();
        let mut buffer = IndexedBuffer::new(64, 64);
        let mut style = TextStyle {
            palette: TextPalette([0, 5, 0, 0, 0, 0, 0, 0]),
            ..TextStyle::new(FontSize::Medium)
        };
        cx.draw_string_vertically_centred(&mut buffer, "a", TextColour::Keep, 0, 20, &mut style);
        assert_eq!(buffer.pixel(0, 14), 0);
        assert_eq!(buffer.pixel(0, 15), 5);
    }
}
