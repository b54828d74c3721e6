//! Bitmap fonts.
//!
//! Glyph bitmaps hold palette indices: 1 for ink and 2 for the drop shadow,
//! which is only visible when the text palette gives entry 2 a colour.

use once_cell::sync::Lazy;

use crate::{bitmap::Bitmap, font::FontSize};

/// A source of palette-indexed glyph bitmaps for each text size.
pub trait SpriteFont {
    /// Horizontal advance of `codepoint` in pixels.
    fn glyph_width(&self, size: FontSize, codepoint: u32) -> i32;

    /// The glyph bitmap for `codepoint`. `None` draws nothing but still advances.
    fn glyph(&self, size: FontSize, codepoint: u32) -> Option<&Bitmap>;
}

/// A proportional 5x7 font covering printable ASCII and the symbols
/// that are always drawn from the bitmap font. Big text is doubled.
/// Unknown codepoints draw as `?`.
#[derive(Copy, Clone, Debug, Default)]
pub struct BuiltinFont;

impl SpriteFont for BuiltinFont {
    fn glyph_width(&self, size: FontSize, codepoint: u32) -> i32 {
        let advance = GLYPHS.advances[glyph_index(codepoint)];
        match size {
            FontSize::Big => advance * 2,
            _ => advance,
        }
    }

    fn glyph(&self, size: FontSize, codepoint: u32) -> Option<&Bitmap> {
        let index = glyph_index(codepoint);
        match size {
            FontSize::Big => GLYPHS.big.get(index),
            _ => GLYPHS.normal.get(index),
        }
    }
}

const SPACE_WIDTH: i32 = 4;
const QUESTION_MARK: usize = (b'?' - b' ') as usize;

fn glyph_index(codepoint: u32) -> usize {
    match codepoint {
        0x20..=0x7E => (codepoint - 0x20) as usize,
        _ => SYMBOLS
            .iter()
            .position(|(c, _)| *c as u32 == codepoint)
            .map(|i| ASCII.len() + i)
            .unwrap_or(QUESTION_MARK),
    }
}

struct GlyphTable {
    normal: Vec<Bitmap>,
    big: Vec<Bitmap>,
    advances: Vec<i32>,
}

static GLYPHS: Lazy<GlyphTable> = Lazy::new(|| {
    let columns = ASCII.iter().chain(SYMBOLS.iter().map(|(_, cols)| cols));
    let mut table = GlyphTable {
        normal: Vec::new(),
        big: Vec::new(),
        advances: Vec::new(),
    };
    for cols in columns {
        let normal = render_columns(cols);
        table.big.push(scale2x(&normal));
        table.normal.push(normal);
        table.advances.push(advance(cols));
    }
    table
});

/// Last inked column plus a one pixel gap.
fn advance(cols: &[u8; 5]) -> i32 {
    match cols.iter().rposition(|&c| c != 0) {
        Some(last) => last as i32 + 2,
        None => SPACE_WIDTH,
    }
}

fn render_columns(cols: &[u8; 5]) -> Bitmap {
    let mut bitmap = Bitmap::new(cols.len() + 1, 9);
    for (x, &bits) in cols.iter().enumerate() {
        for y in 0..8 {
            if bits & (1 << y) != 0 {
                bitmap.set(x, y, 1);
            }
        }
    }
    for (x, &bits) in cols.iter().enumerate() {
        for y in 0..8 {
            if bits & (1 << y) != 0 && bitmap.get(x + 1, y + 1) == 0 {
                bitmap.set(x + 1, y + 1, 2);
            }
        }
    }
    bitmap
}

fn scale2x(bitmap: &Bitmap) -> Bitmap {
    let mut big = Bitmap::new(bitmap.width() * 2, bitmap.height() * 2);
    for y in 0..big.height() {
        for x in 0..big.width() {
            big.set(x, y, bitmap.get(x / 2, y / 2));
        }
    }
    big
}

/// Column-encoded glyphs for 0x20..=0x7E; bit 0 is the top row.
#[rustfmt::skip]
const ASCII: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00], // "
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // #
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // $
    [0x23, 0x13, 0x08, 0x64, 0x62], // %
    [0x36, 0x49, 0x56, 0x20, 0x50], // &
    [0x00, 0x05, 0x03, 0x00, 0x00], // '
    [0x00, 0x1C, 0x22, 0x41, 0x00], // (
    [0x00, 0x41, 0x22, 0x1C, 0x00], // )
    [0x2A, 0x1C, 0x7F, 0x1C, 0x2A], // *
    [0x08, 0x08, 0x3E, 0x08, 0x08], // +
    [0x00, 0x80, 0x70, 0x30, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08], // -
    [0x00, 0x00, 0x60, 0x60, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02], // /
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // 0
    [0x00, 0x42, 0x7F, 0x40, 0x00], // 1
    [0x72, 0x49, 0x49, 0x49, 0x46], // 2
    [0x21, 0x41, 0x49, 0x4D, 0x33], // 3
    [0x18, 0x14, 0x12, 0x7F, 0x10], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39], // 5
    [0x3C, 0x4A, 0x49, 0x49, 0x31], // 6
    [0x41, 0x21, 0x11, 0x09, 0x07], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36], // 8
    [0x46, 0x49, 0x49, 0x29, 0x1E], // 9
    [0x00, 0x00, 0x14, 0x00, 0x00], // :
    [0x00, 0x40, 0x34, 0x00, 0x00], // ;
    [0x00, 0x08, 0x14, 0x22, 0x41], // <
    [0x14, 0x14, 0x14, 0x14, 0x14], // =
    [0x00, 0x41, 0x22, 0x14, 0x08], // >
    [0x02, 0x01, 0x59, 0x09, 0x06], // ?
    [0x3E, 0x41, 0x5D, 0x59, 0x4E], // @
    [0x7C, 0x12, 0x11, 0x12, 0x7C], // A
    [0x7F, 0x49, 0x49, 0x49, 0x36], // B
    [0x3E, 0x41, 0x41, 0x41, 0x22], // C
    [0x7F, 0x41, 0x41, 0x41, 0x3E], // D
    [0x7F, 0x49, 0x49, 0x49, 0x41], // E
    [0x7F, 0x09, 0x09, 0x09, 0x01], // F
    [0x3E, 0x41, 0x41, 0x51, 0x73], // G
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // H
    [0x00, 0x41, 0x7F, 0x41, 0x00], // I
    [0x20, 0x40, 0x41, 0x3F, 0x01], // J
    [0x7F, 0x08, 0x14, 0x22, 0x41], // K
    [0x7F, 0x40, 0x40, 0x40, 0x40], // L
    [0x7F, 0x02, 0x1C, 0x02, 0x7F], // M
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // N
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // O
    [0x7F, 0x09, 0x09, 0x09, 0x06], // P
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // Q
    [0x7F, 0x09, 0x19, 0x29, 0x46], // R
    [0x26, 0x49, 0x49, 0x49, 0x32], // S
    [0x03, 0x01, 0x7F, 0x01, 0x03], // T
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // U
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // V
    [0x3F, 0x40, 0x38, 0x40, 0x3F], // W
    [0x63, 0x14, 0x08, 0x14, 0x63], // X
    [0x03, 0x04, 0x78, 0x04, 0x03], // Y
    [0x61, 0x59, 0x49, 0x4D, 0x43], // Z
    [0x00, 0x7F, 0x41, 0x41, 0x41], // [
    [0x02, 0x04, 0x08, 0x10, 0x20], // \
    [0x00, 0x41, 0x41, 0x41, 0x7F], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40], // _
    [0x00, 0x03, 0x07, 0x08, 0x00], // `
    [0x20, 0x54, 0x54, 0x78, 0x40], // a
    [0x7F, 0x28, 0x44, 0x44, 0x38], // b
    [0x38, 0x44, 0x44, 0x44, 0x28], // c
    [0x38, 0x44, 0x44, 0x28, 0x7F], // d
    [0x38, 0x54, 0x54, 0x54, 0x18], // e
    [0x00, 0x08, 0x7E, 0x09, 0x02], // f
    [0x18, 0xA4, 0xA4, 0x9C, 0x78], // g
    [0x7F, 0x08, 0x04, 0x04, 0x78], // h
    [0x00, 0x44, 0x7D, 0x40, 0x00], // i
    [0x20, 0x40, 0x40, 0x3D, 0x00], // j
    [0x7F, 0x10, 0x28, 0x44, 0x00], // k
    [0x00, 0x41, 0x7F, 0x40, 0x00], // l
    [0x7C, 0x04, 0x78, 0x04, 0x78], // m
    [0x7C, 0x08, 0x04, 0x04, 0x78], // n
    [0x38, 0x44, 0x44, 0x44, 0x38], // o
    [0xFC, 0x18, 0x24, 0x24, 0x18], // p
    [0x18, 0x24, 0x24, 0x18, 0xFC], // q
    [0x7C, 0x08, 0x04, 0x04, 0x08], // r
    [0x48, 0x54, 0x54, 0x54, 0x24], // s
    [0x04, 0x04, 0x3F, 0x44, 0x24], // t
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // u
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // v
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // w
    [0x44, 0x28, 0x10, 0x28, 0x44], // x
    [0x4C, 0x90, 0x90, 0x90, 0x7C], // y
    [0x44, 0x64, 0x54, 0x4C, 0x44], // z
    [0x00, 0x08, 0x36, 0x41, 0x00], // {
    [0x00, 0x00, 0x77, 0x00, 0x00], // |
    [0x00, 0x41, 0x36, 0x08, 0x00], // }
    [0x02, 0x01, 0x02, 0x04, 0x02], // ~
];

#[rustfmt::skip]
const SYMBOLS: [(char, [u8; 5]); 12] = [
    ('↑', [0x04, 0x02, 0x7F, 0x02, 0x04]),
    ('↓', [0x10, 0x20, 0x7F, 0x20, 0x10]),
    ('←', [0x08, 0x1C, 0x2A, 0x08, 0x08]),
    ('→', [0x08, 0x08, 0x2A, 0x1C, 0x08]),
    ('✓', [0x10, 0x20, 0x10, 0x08, 0x04]),
    ('✗', [0x22, 0x14, 0x08, 0x14, 0x22]),
    ('«', [0x08, 0x14, 0x2A, 0x14, 0x22]),
    ('»', [0x22, 0x14, 0x2A, 0x14, 0x08]),
    ('▲', [0x30, 0x3C, 0x3F, 0x3C, 0x30]),
    ('▼', [0x06, 0x1E, 0x7E, 0x1E, 0x06]),
    ('“', [0x00, 0x06, 0x00, 0x06, 0x00]),
    ('”', [0x00, 0x03, 0x00, 0x03, 0x00]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_are_proportional() {
        let font = BuiltinFont;
        assert_eq!(font.glyph_width(FontSize::Medium, ' ' as u32), SPACE_WIDTH);
        // 'I' has ink in columns 1..=3
        assert_eq!(font.glyph_width(FontSize::Medium, 'I' as u32), 5);
        assert_eq!(font.glyph_width(FontSize::Medium, 'W' as u32), 6);
        assert_eq!(font.glyph_width(FontSize::Big, 'W' as u32), 12);
    }

    #[test]
    fn unknown_codepoints_use_question_mark() {
        let font = BuiltinFont;
        assert_eq!(
            font.glyph(FontSize::Small, 0x4E2D),
            font.glyph(FontSize::Small, '?' as u32)
        );
        assert_ne!(
            font.glyph(FontSize::Small, '→' as u32),
            font.glyph(FontSize::Small, '?' as u32)
        );
    }

    #[test]
    fn glyphs_carry_ink_and_shadow() {
        let glyph = BuiltinFont.glyph(FontSize::Medium, '.' as u32).unwrap();
        // '.' occupies columns 2 and 3 of rows 5 and 6
        assert_eq!(glyph.get(2, 5), 1);
        assert_eq!(glyph.get(4, 7), 2);
        let big = BuiltinFont.glyph(FontSize::Big, '.' as u32).unwrap();
        assert_eq!(big.width(), glyph.width() * 2);
        assert_eq!(big.get(5, 11), 1);
    }
}
