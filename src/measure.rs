use crate::{
    codepoint,
    context::TextContext,
    font::FontSize,
    format::FormatCode,
};

impl TextContext {
    /// The width of one line of `text` in pixels, starting in `font_size`.
    ///
    /// This is the furthest x the cursor reaches, so MOVE_X and NEWLINE
    /// codes are taken into account.
    pub fn string_width(&mut self, text: impl AsRef<[u8]>, font_size: FontSize) -> i32 {
        self.measure_extent(text.as_ref(), font_size).x
    }

    /// The width of the widest segment between newline codes.
    pub fn string_width_new_lined(&mut self, text: impl AsRef<[u8]>, font_size: FontSize) -> i32 {
        let text = text.as_ref();
        let mut widest = 0;
        let mut segment_start = 0;
        let mut segment_font = font_size;
        let mut font = font_size;

        for token in codepoint::tokens(text) {
            if !token.is_control {
                continue;
            }
            match FormatCode::decode(token.codepoint, token.args) {
                FormatCode::Font(size) => font = size,
                code if code.is_newline() => {
                    let width = self.string_width(&text[segment_start..token.end], segment_font);
                    widest = widest.max(width);
                    segment_start = token.end;
                    segment_font = font;
                }
                _ => {}
            }
        }

        let width = self.string_width(&text[segment_start..], segment_font);
        widest.max(width)
    }
}

/// The height of `text` in pixels when drawn with the bitmap font,
/// starting in `font_size`.
///
/// The first line counts fully; each newline code adds the line height of
/// the font size in effect at that point (half of it for the smaller newline).
pub fn string_height(text: impl AsRef<[u8]>, font_size: FontSize) -> i32 {
    let mut font = font_size;
    let mut height = font.sprite_line_height();
    for token in codepoint::tokens(text.as_ref()) {
        if !token.is_control {
            continue;
        }
        match FormatCode::decode(token.codepoint, token.args) {
            FormatCode::Newline => height += font.sprite_line_height(),
            FormatCode::NewlineSmaller => height += font.sprite_line_height() / 2,
            FormatCode::Font(size) => font = size,
            _ => {}
        }
    }
    height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        format::FormattedString,
        testing::{mono_context, truetype_context, MONO_WIDTH, RASTER_WIDTH},
    };

    fn random_text(rng: &fastrand::Rng) -> FormattedString {
        let mut s = FormattedString::new();
        for _ in 0..rng.usize(0..24) {
            match rng.u8(0..10) {
                0 => {
                    s.push_code(FormatCode::Font(FontSize::Big));
                }
                1 => {
                    s.push_code(FormatCode::MoveX(rng.u8(..)));
                }
                2 => {
                    s.push_code(FormatCode::Colour(rng.u8(0..14)));
                }
                _ => {
                    s.push_char(rng.alphanumeric());
                }
            }
        }
        s
    }

    #[test]
    fn width_counts_glyph_advances() {
        let mut cx = mono_context();
        assert_eq!(cx.string_width("abc", FontSize::Medium), 3 * MONO_WIDTH);
        assert_eq!(cx.string_width("", FontSize::Medium), 0);

        let mut s = FormattedString::new();
        s.push_str("a").push_code(FormatCode::Font(FontSize::Big)).push_str("b");
        assert_eq!(cx.string_width(&s, FontSize::Medium), MONO_WIDTH * 3);
    }

    #[test]
    fn width_is_idempotent() {
        let rng = fastrand::Rng::with_seed(7);
        let mut cx = mono_context();
        for _ in 0..200 {
            let s = random_text(&rng);
            let first = cx.string_width(&s, FontSize::Medium);
            let second = cx.string_width(&s, FontSize::Medium);
            assert_eq!(first, second);
            assert!(first >= 0);
        }
    }

    #[test]
    fn truetype_width_uses_width_cache() {
        let (mut cx, counters) = truetype_context();
        assert_eq!(cx.string_width("abcd", FontSize::Medium), 4 * RASTER_WIDTH);
        assert_eq!(cx.string_width("abcd", FontSize::Medium), 4 * RASTER_WIDTH);
        assert_eq!(counters.measures(), 1);
        assert_eq!(counters.renders(), 0);
        assert_eq!(cx.width_cache_stats().hits, 1);
        // no font for small text: measured with the bitmap font
        assert_eq!(cx.string_width("abcd", FontSize::Small), 4 * MONO_WIDTH);
    }

    #[test]
    fn new_lined_width_takes_widest_segment() {
        let mut cx = mono_context();
        let mut s = FormattedString::new();
        s.push_str("ab")
            .push_code(FormatCode::Newline)
            .push_str("abcd")
            .push_code(FormatCode::NewlineSmaller)
            .push_str("a");
        assert_eq!(cx.string_width_new_lined(&s, FontSize::Medium), 4 * MONO_WIDTH);
    }

    #[test]
    fn height_counts_newlines() {
        assert_eq!(string_height("abc", FontSize::Medium), 10);
        assert_eq!(string_height("abc", FontSize::Big), 18);

        let mut s = FormattedString::new();
        s.push_str("a")
            .push_code(FormatCode::Newline)
            .push_code(FormatCode::Font(FontSize::Tiny))
            .push_str("b")
            .push_code(FormatCode::NewlineSmaller)
            .push_str("c");
        assert_eq!(string_height(&s, FontSize::Medium), 10 + 10 + 3);
    }
}
