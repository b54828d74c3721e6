//! Greedy word wrapping in place.
//!
//! The wrapper walks a line, remembering the last space seen. When the
//! text measured so far no longer fits, it rewinds to that space, turns it
//! into a line terminator and starts the next line after it. Explicit
//! newline codes are turned into terminators as well.

use crate::{
    codepoint,
    context::TextContext,
    font::FontSize,
    format::{code, FormatCode, FormattedString},
};

/// The result of wrapping a string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrappedText {
    /// Byte offsets of the terminators written into the string.
    pub breaks: Vec<usize>,
    /// Width of the widest line.
    pub max_width: i32,
    /// Number of lines, i.e. `breaks.len() + 1`.
    pub line_count: usize,
    pub font_size: FontSize,
    pub line_height: i32,
}

impl TextContext {
    /// Wraps `text` to `width` pixels by writing terminator bytes into it.
    ///
    /// Breaks happen only at spaces. A word wider than `width` stays on one
    /// line and overflows rather than being split.
    pub fn wrap_string(
        &mut self,
        text: &mut FormattedString,
        width: i32,
        font_size: FontSize,
    ) -> WrappedText {
        let bytes = text.bytes_mut();
        let mut breaks = Vec::new();
        let mut max_width = 0;

        let mut line_start = 0;
        let mut line_width = 0;
        let mut chars_on_line = 0;
        // font at the cursor and at the start of the current line
        let mut font = font_size;
        let mut line_font = font_size;
        // last space on the current line, the line width before it and the font there
        let mut word_break: Option<(usize, i32, FontSize)> = None;
        let mut offset = 0;

        loop {
            let (codepoint, start, end, is_control, format_code) =
                match codepoint::token_at(bytes, offset) {
                    Some(t) => (
                        t.codepoint,
                        t.start,
                        t.end,
                        t.is_control,
                        FormatCode::decode(t.codepoint, t.args),
                    ),
                    None => break,
                };

            if codepoint == code::NEWLINE {
                bytes[start] = 0;
                breaks.push(start);
                max_width = max_width.max(line_width);
                line_start = end;
                line_font = font;
                line_width = 0;
                chars_on_line = 0;
                word_break = None;
                offset = end;
                continue;
            }
            if is_control {
                if let FormatCode::Font(size) = format_code {
                    font = size;
                }
                offset = end;
                continue;
            }

            if codepoint == ' ' as u32 {
                word_break = Some((start, line_width, font));
            }

            let measured = self.string_width(&bytes[line_start..end], line_font);
            match word_break {
                Some((space, width_before, space_font)) if measured > width && chars_on_line > 0 => {
                    bytes[space] = 0;
                    breaks.push(space);
                    max_width = max_width.max(width_before);
                    line_start = space + 1;
                    font = space_font;
                    line_font = space_font;
                    line_width = 0;
                    chars_on_line = 0;
                    word_break = None;
                    offset = line_start;
                }
                _ => {
                    line_width = measured;
                    chars_on_line += 1;
                    offset = end;
                }
            }
        }
        max_width = max_width.max(line_width);

        WrappedText {
            line_count: breaks.len() + 1,
            breaks,
            max_width,
            font_size,
            line_height: self.line_height(font_size),
        }
    }
}
