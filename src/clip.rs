use std::path::MAIN_SEPARATOR;

use crate::{
    codepoint,
    context::TextContext,
    font::FontSize,
    format::FormattedString,
};

const ELLIPSIS: &str = "...";

/// Budgets narrower than this clip to nothing.
const MIN_CLIP_WIDTH: i32 = 6;

impl TextContext {
    /// Shortens `text` so it fits in `width` pixels, ending it with `...`
    /// when anything was cut. Returns the resulting width.
    ///
    /// Text that already fits is left alone. Otherwise the longest prefix
    /// whose width with the ellipsis is strictly less than `width` is kept;
    /// if none is, the text becomes empty.
    pub fn clip_string(
        &mut self,
        text: &mut FormattedString,
        width: i32,
        font_size: FontSize,
    ) -> i32 {
        if width < MIN_CLIP_WIDTH {
            text.clear();
            return 0;
        }

        let full_width = self.string_width(text.as_bytes(), font_size);
        if full_width <= width {
            return full_width;
        }

        let mut candidate = Vec::with_capacity(text.len() + ELLIPSIS.len());
        let mut best = None;
        let mut exhausted = true;
        for token in codepoint::tokens(text.as_bytes()) {
            if token.is_control {
                continue;
            }
            candidate.clear();
            candidate.extend_from_slice(&text.as_bytes()[..token.end]);
            candidate.extend_from_slice(ELLIPSIS.as_bytes());
            let candidate_width = self.string_width(&candidate, font_size);
            if candidate_width < width {
                best = Some((token.end, candidate_width));
            } else {
                exhausted = false;
                break;
            }
        }

        if exhausted {
            // every prefix fits with room to spare; nothing visible to cut
            return full_width;
        }

        let bytes = text.bytes_mut();
        match best {
            Some((cut, clipped_width)) => {
                bytes.truncate(cut);
                bytes.extend_from_slice(ELLIPSIS.as_bytes());
                clipped_width
            }
            None => {
                bytes.clear();
                0
            }
        }
    }

    /// Replaces leading directories of `path` with `...` until it fits in
    /// `width` pixels. Returns the path unchanged if it fits or if even the
    /// shortest form does not.
    pub fn shorten_path(&mut self, path: &str, width: i32, font_size: FontSize) -> String {
        if self.string_width(path, font_size) <= width {
            return path.to_owned();
        }

        for (index, _) in path.match_indices(MAIN_SEPARATOR) {
            let shortened = format!("{}{}", ELLIPSIS, &path[index..]);
            if self.string_width(&shortened, font_size) <= width {
                return shortened;
            }
        }
        path.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        format::FormatCode,
        testing::{mono_context, MONO_WIDTH},
    };

    #[test]
    fn fitting_text_is_untouched() {
        let mut cx = mono_context();
        let mut s = FormattedString::from("Hello");
        assert_eq!(cx.clip_string(&mut s, 100, FontSize::Medium), 5 * MONO_WIDTH);
        assert_eq!(s.as_bytes(), b"Hello");

        let mut s = FormattedString::new();
        assert_eq!(cx.clip_string(&mut s, 10, FontSize::Medium), 0);
        assert!(s.is_empty());
    }

    #[test]
    fn clips_with_ellipsis() {
        let mut cx = mono_context();
        let mut s = FormattedString::from("HelloWorld");
        // "Hel..." is 36 pixels, which must be strictly under the budget
        let width = cx.clip_string(&mut s, 37, FontSize::Medium);
        assert_eq!(s.as_bytes(), b"Hel...");
        assert_eq!(width, 6 * MONO_WIDTH);
    }

    #[test]
    fn nothing_fits_clears() {
        let mut cx = mono_context();
        let mut s = FormattedString::from("HelloWorld");
        assert_eq!(cx.clip_string(&mut s, 20, FontSize::Medium), 0);
        assert!(s.is_empty());

        let mut s = FormattedString::from("HelloWorld");
        assert_eq!(cx.clip_string(&mut s, 5, FontSize::Medium), 0);
        assert!(s.is_empty());
    }

    #[test]
    fn argument_bytes_are_never_cut() {
        let mut cx = mono_context();
        let mut s = FormattedString::new();
        s.push_str("ab")
            .push_code(FormatCode::InlineImage(0x0A0A_0A0A))
            .push_str("cdefgh");
        cx.clip_string(&mut s, 6 * MONO_WIDTH + 1, FontSize::Medium);

        let mut expected = FormattedString::new();
        expected
            .push_str("ab")
            .push_code(FormatCode::InlineImage(0x0A0A_0A0A))
            .push_str("c...");
        assert_eq!(s, expected);
    }

    #[test]
    fn clipping_is_idempotent() {
        let rng = fastrand::Rng::with_seed(11);
        let mut cx = mono_context();
        for _ in 0..200 {
            let text: String = (0..rng.usize(0..20)).map(|_| rng.alphanumeric()).collect();
            let width = rng.i32(0..120);
            let mut once = FormattedString::from(text.as_str());
            let first = cx.clip_string(&mut once, width, FontSize::Medium);
            let mut twice = once.clone();
            let second = cx.clip_string(&mut twice, width, FontSize::Medium);
            assert_eq!(once, twice);
            assert_eq!(first, second);
            assert!(first <= width.max(0));
        }
    }

    #[test]
    fn shortens_leading_directories() {
        let mut cx = mono_context();
        let sep = MAIN_SEPARATOR;
        let path = format!("home{0}user{0}park.sv6", sep);
        let tail = format!("...{}park.sv6", sep);
        let fits_tail = cx.string_width(&tail, FontSize::Medium);

        assert_eq!(cx.shorten_path(&path, 1000, FontSize::Medium), path);
        assert_eq!(cx.shorten_path(&path, fits_tail, FontSize::Medium), tail);
        assert_eq!(cx.shorten_path(&path, 1, FontSize::Medium), path);
    }
}
