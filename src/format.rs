//! In-band control codes and the byte-string type that carries them.

use crate::{codepoint, font::FontSize};

/// Control-code values.
pub mod code {
    pub const MOVE_X: u32 = 1;
    pub const ADJUST_PALETTE: u32 = 2;
    pub const NEWLINE: u32 = 5;
    pub const NEWLINE_SMALLER: u32 = 6;
    pub const TINYFONT: u32 = 7;
    pub const BIGFONT: u32 = 8;
    pub const MEDIUMFONT: u32 = 9;
    pub const SMALLFONT: u32 = 10;
    pub const OUTLINE: u32 = 11;
    pub const OUTLINE_OFF: u32 = 12;
    pub const WINDOW_COLOUR_1: u32 = 13;
    pub const WINDOW_COLOUR_2: u32 = 14;
    pub const WINDOW_COLOUR_3: u32 = 15;
    pub const NEWLINE_X_Y: u32 = 17;
    pub const INLINE_SPRITE: u32 = 23;

    /// First and last codepoints of the C1 band, all of which are control codes.
    pub const RESERVED_START: u32 = 128;
    pub const RESERVED_END: u32 = 159;

    pub const COLOUR_START: u32 = 142;
    pub const COLOUR_END: u32 = 155;
    pub const COLOUR_COUNT: usize = (COLOUR_END - COLOUR_START + 1) as usize;

    pub const BLACK: u32 = 142;
    pub const GREY: u32 = 143;
    pub const WHITE: u32 = 144;
    pub const RED: u32 = 145;
    pub const GREEN: u32 = 146;
    pub const YELLOW: u32 = 147;
    pub const TOPAZ: u32 = 148;
    pub const CELADON: u32 = 149;
    pub const BABYBLUE: u32 = 150;
    pub const PALELAVENDER: u32 = 151;
    pub const PALEGOLD: u32 = 152;
    pub const LIGHTPINK: u32 = 153;
    pub const PEARLAQUA: u32 = 154;
    pub const PALESILVER: u32 = 155;

    /// Markup names of the colour codes, in code order.
    pub const COLOUR_NAMES: [&str; COLOUR_COUNT] = [
        "BLACK",
        "GREY",
        "WHITE",
        "RED",
        "GREEN",
        "YELLOW",
        "TOPAZ",
        "CELADON",
        "BABYBLUE",
        "PALELAVENDER",
        "PALEGOLD",
        "LIGHTPINK",
        "PEARLAQUA",
        "PALESILVER",
    ];
}

/// A decoded control code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormatCode {
    /// Move the cursor to `origin.x + n`.
    MoveX(u8),
    /// Apply an entry of the palette adjustment table.
    AdjustPalette(u8),
    Newline,
    NewlineSmaller,
    Font(FontSize),
    Outline,
    OutlineOff,
    /// One of the three window colour slots (0-based).
    WindowColour(u8),
    /// An inline image, drawn at the cursor.
    InlineImage(u32),
    /// One of the fourteen text colours (0-based).
    Colour(u8),
    /// A reserved code with no effect.
    Ignored,
}

impl FormatCode {
    /// Decodes a control code from its codepoint and argument bytes.
    pub fn decode(codepoint: u32, args: &[u8]) -> Self {
        let arg = args.first().copied().unwrap_or(0);
        match codepoint {
            code::MOVE_X => FormatCode::MoveX(arg),
            code::ADJUST_PALETTE => FormatCode::AdjustPalette(arg),
            code::NEWLINE => FormatCode::Newline,
            code::NEWLINE_SMALLER => FormatCode::NewlineSmaller,
            code::TINYFONT => FormatCode::Font(FontSize::Tiny),
            code::SMALLFONT => FormatCode::Font(FontSize::Small),
            code::MEDIUMFONT => FormatCode::Font(FontSize::Medium),
            code::BIGFONT => FormatCode::Font(FontSize::Big),
            code::OUTLINE => FormatCode::Outline,
            code::OUTLINE_OFF => FormatCode::OutlineOff,
            code::WINDOW_COLOUR_1..=code::WINDOW_COLOUR_3 => {
                FormatCode::WindowColour((codepoint - code::WINDOW_COLOUR_1) as u8)
            }
            code::INLINE_SPRITE => match args {
                &[a, b, c, d] => FormatCode::InlineImage(u32::from_le_bytes([a, b, c, d])),
                _ => FormatCode::Ignored,
            },
            code::COLOUR_START..=code::COLOUR_END => {
                FormatCode::Colour((codepoint - code::COLOUR_START) as u8)
            }
            _ => FormatCode::Ignored,
        }
    }

    /// Appends the encoded control code with its arguments.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match *self {
            FormatCode::MoveX(x) => out.extend_from_slice(&[code::MOVE_X as u8, x]),
            FormatCode::AdjustPalette(i) => {
                out.extend_from_slice(&[code::ADJUST_PALETTE as u8, i])
            }
            FormatCode::Newline => out.push(code::NEWLINE as u8),
            FormatCode::NewlineSmaller => out.push(code::NEWLINE_SMALLER as u8),
            FormatCode::Font(size) => out.push(match size {
                FontSize::Tiny => code::TINYFONT,
                FontSize::Small => code::SMALLFONT,
                FontSize::Medium => code::MEDIUMFONT,
                FontSize::Big => code::BIGFONT,
            } as u8),
            FormatCode::Outline => out.push(code::OUTLINE as u8),
            FormatCode::OutlineOff => out.push(code::OUTLINE_OFF as u8),
            FormatCode::WindowColour(slot) => {
                out.push((code::WINDOW_COLOUR_1 + u32::from(slot.min(2))) as u8)
            }
            FormatCode::InlineImage(id) => {
                out.push(code::INLINE_SPRITE as u8);
                out.extend_from_slice(&id.to_le_bytes());
            }
            FormatCode::Colour(index) => codepoint::push_codepoint(
                out,
                code::COLOUR_START + u32::from(index).min(code::COLOUR_END - code::COLOUR_START),
            ),
            FormatCode::Ignored => {}
        }
    }

    /// Whether this code moves the cursor to a new line.
    pub fn is_newline(&self) -> bool {
        matches!(self, FormatCode::Newline | FormatCode::NewlineSmaller)
    }
}

/// A UTF-8 string with embedded control codes.
///
/// Byte 0 separates lines; the wrapper writes it in place of break spaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FormattedString {
    bytes: Vec<u8>,
}

impl FormattedString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn push_str(&mut self, s: &str) -> &mut Self {
        self.bytes.extend_from_slice(s.as_bytes());
        self
    }

    pub fn push_char(&mut self, c: char) -> &mut Self {
        codepoint::push_codepoint(&mut self.bytes, c as u32);
        self
    }

    pub fn push_code(&mut self, code: FormatCode) -> &mut Self {
        code.encode(&mut self.bytes);
        self
    }

    /// The lines of the string, split on terminator bytes.
    pub fn lines(&self) -> impl Iterator<Item = &[u8]> {
        self.bytes.split(|&b| b == 0)
    }

    /// The visible characters of the first line with control codes removed.
    pub fn to_plain_string(&self) -> String {
        codepoint::tokens(&self.bytes)
            .filter(|t| !t.is_control)
            .map(|t| codepoint::to_char(t.codepoint))
            .collect()
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }
}

impl AsRef<[u8]> for FormattedString {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<&str> for FormattedString {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

impl From<String> for FormattedString {
    fn from(s: String) -> Self {
        Self::from_bytes(s.into_bytes())
    }
}

impl From<Vec<u8>> for FormattedString {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}
