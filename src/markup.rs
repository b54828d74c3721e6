//! A human-readable form of formatted strings.
//!
//! # Syntax
//! Plain text is copied as is. Control codes and symbols are written as
//! names in braces:
//!
//! `{RED}Warning:{WHITE} ride has crashed{NEWLINE}{SMALLFONT}Details`
//!
//! Codes with an argument take it after a colon:
//!
//! `Price{MOVE_X:120}£5.00 {INLINE_SPRITE:5183}`
//!
//! Recognized names are the colour names (`BLACK` .. `PALESILVER`),
//! `NEWLINE`, `NEWLINE_SMALLER`, `TINYFONT`, `SMALLFONT`, `MEDIUMFONT`,
//! `BIGFONT`, `OUTLINE`, `OUTLINE_OFF`, `WINDOW_COLOUR_1` .. `WINDOW_COLOUR_3`,
//! `MOVE_X:n`, `ADJUST_PALETTE:n`, `INLINE_SPRITE:n` and the symbols
//! `UP`, `DOWN`, `LEFT`, `RIGHT`, `TICK`, `CROSS`, `SMALLUP`, `SMALLDOWN`,
//! `OPENQUOTES`, `ENDQUOTES`, `LEFTGUILLEMET` and `RIGHTGUILLEMET`.

use std::str::FromStr;

use anyhow::{bail, Context};
use logos::Logos;

use crate::{
    font::FontSize,
    format::{code, FormatCode, FormattedString},
};

#[derive(Copy, Clone, Debug, Logos, PartialEq, Eq)]
enum Token {
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    #[regex("[^{}]+")]
    Text,

    #[error]
    Error,
}

const SYMBOLS: [(&str, char); 12] = [
    ("UP", '↑'),
    ("DOWN", '↓'),
    ("LEFT", '←'),
    ("RIGHT", '→'),
    ("TICK", '✓'),
    ("CROSS", '✗'),
    ("SMALLUP", '▲'),
    ("SMALLDOWN", '▼'),
    ("OPENQUOTES", '“'),
    ("ENDQUOTES", '”'),
    ("LEFTGUILLEMET", '«'),
    ("RIGHTGUILLEMET", '»'),
];

/// Compiles markup into a [`FormattedString`].
pub fn parse(markup: &str) -> anyhow::Result<FormattedString> {
    let mut tokens = Token::lexer(markup).spanned();
    let mut out = FormattedString::new();

    while let Some((token, span)) = tokens.next() {
        match token {
            Token::Text => {
                out.push_str(&markup[span]);
            }
            Token::LBrace => {
                let name = match tokens.next() {
                    Some((Token::Text, span)) => &markup[span],
                    _ => bail!("expected a code name after '{{' at {}", span.start),
                };
                if !matches!(tokens.next(), Some((Token::RBrace, _))) {
                    bail!("unterminated code '{}'", name);
                }
                apply_directive(name.trim(), &mut out)?;
            }
            Token::RBrace => bail!("unmatched '}}' at {}", span.start),
            Token::Error => bail!("unexpected input at {}", span.start),
        }
    }

    Ok(out)
}

fn apply_directive(name: &str, out: &mut FormattedString) -> anyhow::Result<()> {
    if let Some((name, argument)) = name.split_once(':') {
        let argument = argument.trim();
        let format_code = match name.trim() {
            "MOVE_X" => FormatCode::MoveX(parse_argument(name, argument)?),
            "ADJUST_PALETTE" => FormatCode::AdjustPalette(parse_argument(name, argument)?),
            "INLINE_SPRITE" => FormatCode::InlineImage(parse_argument(name, argument)?),
            _ => bail!("code '{}' takes no argument", name),
        };
        out.push_code(format_code);
        return Ok(());
    }

    let format_code = match name {
        "NEWLINE" => FormatCode::Newline,
        "NEWLINE_SMALLER" => FormatCode::NewlineSmaller,
        "TINYFONT" => FormatCode::Font(FontSize::Tiny),
        "SMALLFONT" => FormatCode::Font(FontSize::Small),
        "MEDIUMFONT" => FormatCode::Font(FontSize::Medium),
        "BIGFONT" => FormatCode::Font(FontSize::Big),
        "OUTLINE" => FormatCode::Outline,
        "OUTLINE_OFF" => FormatCode::OutlineOff,
        "WINDOW_COLOUR_1" => FormatCode::WindowColour(0),
        "WINDOW_COLOUR_2" => FormatCode::WindowColour(1),
        "WINDOW_COLOUR_3" => FormatCode::WindowColour(2),
        "MOVE_X" | "ADJUST_PALETTE" | "INLINE_SPRITE" => {
            bail!("code '{}' needs an argument", name)
        }
        _ => {
            if let Some(index) = code::COLOUR_NAMES.iter().position(|&c| c == name) {
                FormatCode::Colour(index as u8)
            } else if let Some(&(_, symbol)) = SYMBOLS.iter().find(|(n, _)| *n == name) {
                out.push_char(symbol);
                return Ok(());
            } else {
                bail!("unknown code '{}'", name);
            }
        }
    };
    out.push_code(format_code);
    Ok(())
}

fn parse_argument<T>(name: &str, argument: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(argument).with_context(|| format!("invalid argument '{}' to {}", argument, name))
}
