//! Incremental UTF-8 scanning over format-coded byte strings.
//!
//! Every other module walks strings through [`token_at`] / [`tokens`], so
//! control-code argument bytes are always skipped the same way and a
//! truncated argument ends the scan instead of reading past the buffer.

use crate::format::code;

/// Decodes the codepoint starting at `offset` and returns it together with
/// the offset just past it.
///
/// Returns `None` at the end of the buffer or at a line terminator (byte 0).
/// Malformed or truncated sequences decode as the single raw byte, so the
/// scan always makes progress.
pub fn next(bytes: &[u8], offset: usize) -> Option<(u32, usize)> {
    let first = *bytes.get(offset)?;
    if first == 0 {
        return None;
    }

    let (len, init) = match first {
        0x00..=0x7F => return Some((first as u32, offset + 1)),
        0xC0..=0xDF => (2, (first & 0x1F) as u32),
        0xE0..=0xEF => (3, (first & 0x0F) as u32),
        0xF0..=0xF7 => (4, (first & 0x07) as u32),
        _ => return Some((first as u32, offset + 1)),
    };

    let tail = match bytes.get(offset + 1..offset + len) {
        Some(tail) => tail,
        None => return Some((first as u32, offset + 1)),
    };

    let mut codepoint = init;
    for &b in tail {
        if b & 0xC0 != 0x80 {
            return Some((first as u32, offset + 1));
        }
        codepoint = (codepoint << 6) | (b & 0x3F) as u32;
    }
    Some((codepoint, offset + len))
}

/// Whether the codepoint changes drawing state instead of producing a glyph.
pub fn is_format_code(codepoint: u32) -> bool {
    codepoint < 32 || (code::RESERVED_START..=code::RESERVED_END).contains(&codepoint)
}

/// Number of raw argument bytes following a control code.
pub fn format_arg_length(codepoint: u32) -> usize {
    match codepoint {
        1..=4 => 1,
        17..=22 => 2,
        23..=31 => 4,
        _ => 0,
    }
}

/// Symbols drawn from the bitmap font even when a TrueType font is active,
/// because TrueType fonts rarely carry them at the right size.
pub fn should_use_sprite(codepoint: u32) -> bool {
    matches!(
        codepoint,
        0x00AB // «
            | 0x00BB // »
            | 0x2190..=0x2193 // arrows
            | 0x2713 // ✓
            | 0x2717 // ✗
            | 0x201C // “
            | 0x201D // ”
            | 0x25B2 // ▲
            | 0x25BC // ▼
    )
}

/// Converts a decoded codepoint to a `char`. Raw bytes from malformed input
/// map to their Latin-1 character.
pub fn to_char(codepoint: u32) -> char {
    char::from_u32(codepoint).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Appends the UTF-8 encoding of `codepoint`.
pub fn push_codepoint(bytes: &mut Vec<u8>, codepoint: u32) {
    let mut buf = [0u8; 4];
    bytes.extend_from_slice(to_char(codepoint).encode_utf8(&mut buf).as_bytes());
}

/// One decoded element of a formatted string.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub codepoint: u32,
    /// Offset of the first byte of the codepoint.
    pub start: usize,
    /// Offset just past the codepoint and its arguments.
    pub end: usize,
    /// Raw argument bytes (empty for plain codepoints).
    pub args: &'a [u8],
    pub is_control: bool,
}

/// Decodes the token at `offset`, including control-code arguments.
///
/// Returns `None` at the end of the line or when a control code's
/// arguments run past the end of the buffer.
pub fn token_at(bytes: &[u8], offset: usize) -> Option<Token> {
    let (codepoint, next) = next(bytes, offset)?;
    let is_control = is_format_code(codepoint);
    let end = if is_control {
        next + format_arg_length(codepoint)
    } else {
        next
    };
    let args = bytes.get(next..end)?;
    Some(Token {
        codepoint,
        start: offset,
        end,
        args,
        is_control,
    })
}

/// Iterates over the tokens of a single line.
pub fn tokens(bytes: &[u8]) -> Tokens {
    Tokens { bytes, offset: 0 }
}

pub struct Tokens<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = token_at(self.bytes, self.offset)?;
        self.offset = token.end;
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_multibyte() {
        let s = "aé€😀".as_bytes();
        let mut offset = 0;
        let mut out = Vec::new();
        while let Some((cp, next)) = next(s, offset) {
            out.push(cp);
            offset = next;
        }
        assert_eq!(out, vec!['a' as u32, 'é' as u32, '€' as u32, '😀' as u32]);
        assert_eq!(offset, s.len());
    }

    #[test]
    fn malformed_bytes_degrade_to_raw() {
        // lone continuation byte, then a truncated 3-byte sequence
        let s = [0x80, b'a', 0xE2, 0x82];
        assert_eq!(next(&s, 0), Some((0x80, 1)));
        assert_eq!(next(&s, 1), Some(('a' as u32, 2)));
        assert_eq!(next(&s, 2), Some((0xE2, 3)));
        assert_eq!(next(&s, 3), Some((0x82, 4)));
        assert_eq!(next(&s, 4), None);
    }

    #[test]
    fn terminator_ends_line() {
        assert_eq!(next(b"\0abc", 0), None);
    }

    #[test]
    fn classifies_control_codes() {
        assert!(is_format_code(code::NEWLINE));
        assert!(is_format_code(code::COLOUR_START));
        assert!(is_format_code(code::COLOUR_END));
        assert!(!is_format_code('A' as u32));
        assert!(!is_format_code('é' as u32));
        assert_eq!(format_arg_length(code::MOVE_X), 1);
        assert_eq!(format_arg_length(code::NEWLINE_X_Y), 2);
        assert_eq!(format_arg_length(code::INLINE_SPRITE), 4);
        assert_eq!(format_arg_length(code::NEWLINE), 0);
    }

    #[test]
    fn tokens_skip_arguments() {
        // MOVE_X with an argument byte that looks like a printable character
        let s = [b'a', code::MOVE_X as u8, b'Z', b'b'];
        let cps: Vec<_> = tokens(&s).map(|t| t.codepoint).collect();
        assert_eq!(cps, vec!['a' as u32, code::MOVE_X, 'b' as u32]);
    }

    #[test]
    fn truncated_arguments_stop_the_scan() {
        let s = [b'a', code::INLINE_SPRITE as u8, 1, 2];
        let cps: Vec<_> = tokens(&s).map(|t| t.codepoint).collect();
        assert_eq!(cps, vec!['a' as u32]);
    }
}
