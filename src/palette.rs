//! Text palettes and the colour tables they are filled from.
//!
//! Bitmap-font glyphs store small palette indices; drawing remaps index `n`
//! through the current [`TextPalette`]. Index 1 is the ink colour, index 2
//! the outline/shadow colour and index 3 the inset highlight.

use serde::{Deserialize, Serialize};

use crate::format::code::COLOUR_COUNT;

/// The eight-entry remap table applied to glyph pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextPalette(pub [u8; 8]);

impl TextPalette {
    pub fn primary(&self) -> u8 {
        self.0[1]
    }

    pub fn shadow(&self) -> u8 {
        self.0[2]
    }

    pub fn highlight(&self) -> u8 {
        self.0[3]
    }

    /// Remaps a glyph pixel value.
    pub fn get(&self, index: u8) -> u8 {
        self.0[(index & 7) as usize]
    }

    /// Writes the four bytes of `value` (little-endian) to entries 1..=4.
    fn set_packed(&mut self, value: u32) {
        self.0[1..5].copy_from_slice(&value.to_le_bytes());
    }
}

/// The colour a draw call starts with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextColour {
    /// Reuse the palette left by the previous draw call.
    Keep,
    /// A colour index combined with the `OUTLINE`, `INSET` and
    /// `TRANSLUCENT` flag bits.
    Indexed(u8),
}

impl TextColour {
    pub const OUTLINE: u8 = 1 << 5;
    pub const INSET: u8 = 1 << 6;
    pub const TRANSLUCENT: u8 = 1 << 7;

    pub fn outlined(colour: u8) -> Self {
        TextColour::Indexed(colour | Self::OUTLINE)
    }

    pub fn inset(colour: u8) -> Self {
        TextColour::Indexed(colour | Self::INSET)
    }
}

impl From<u8> for TextColour {
    fn from(colour: u8) -> Self {
        TextColour::Indexed(colour)
    }
}

/// The shade ramp of one indexed colour.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColourShades {
    pub darkest: u8,
    pub darker: u8,
    pub dark: u8,
    pub mid_dark: u8,
    pub mid_light: u8,
    pub light: u8,
    pub lighter: u8,
    pub lightest: u8,
    /// The shade used for text drawn in this colour.
    pub text: u8,
}

impl ColourShades {
    /// A ramp of consecutive palette entries starting at `base`.
    pub fn ramp(base: u8) -> Self {
        let at = |i: u8| base.saturating_add(i);
        Self {
            darkest: at(0),
            darker: at(1),
            dark: at(2),
            mid_dark: at(4),
            mid_light: at(6),
            light: at(8),
            lighter: at(9),
            lightest: at(11),
            text: at(3),
        }
    }
}

/// A palette adjustment entry selected by the ADJUST_PALETTE code.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaletteAdjustment {
    pub primary: u8,
    /// Written to palette entries 3 and 4.
    pub shadow: [u8; 2],
    /// Written to palette entries 5 and 6.
    pub highlight: [u8; 2],
}

/// Where the palette bytes for text colours come from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColourTables {
    /// Packed palette bytes (entries 1..=4, little-endian) per colour code.
    pub text_colours: [u32; COLOUR_COUNT],
    /// Shade ramps indexed by colour (without flag bits).
    pub shades: Vec<ColourShades>,
    pub adjustments: Vec<PaletteAdjustment>,
    /// The colours referenced by the WINDOW_COLOUR_1..3 codes.
    pub window_colours: [u8; 3],
}

const NUM_COLOURS: u8 = 32;
const FIRST_RAMP_ENTRY: u8 = 10;

impl Default for ColourTables {
    fn default() -> Self {
        let shades: Vec<ColourShades> = (0..NUM_COLOURS)
            .map(|i| ColourShades::ramp(FIRST_RAMP_ENTRY.wrapping_add(i.wrapping_mul(12))))
            .collect();

        let mut text_colours = [0; COLOUR_COUNT];
        for (i, packed) in text_colours.iter_mut().enumerate() {
            let ramp = shades[i % shades.len()];
            *packed = u32::from_le_bytes([ramp.text, ramp.darkest, ramp.darker, 0]);
        }

        let adjustments = shades
            .iter()
            .map(|s| PaletteAdjustment {
                primary: s.text,
                shadow: [s.dark, s.darker],
                highlight: [s.light, s.lighter],
            })
            .collect();

        Self {
            text_colours,
            shades,
            adjustments,
            window_colours: [0; 3],
        }
    }
}

impl ColourTables {
    /// The shade ramp for `colour`, ignoring flag bits.
    pub fn shades(&self, colour: u8) -> ColourShades {
        let index = (colour & !(TextColour::OUTLINE | TextColour::INSET | TextColour::TRANSLUCENT))
            as usize;
        self.shades.get(index).copied().unwrap_or_default()
    }

    /// Applies one of the fourteen colour codes.
    pub fn apply_colour_code(&self, index: u8, outline: bool, palette: &mut TextPalette) {
        let mut value = self.text_colours.get(index as usize).copied().unwrap_or(0);
        if !outline {
            value &= 0xFF00_00FF;
        }
        palette.set_packed(value);
    }

    /// Applies an indexed colour the way window colour codes do.
    pub fn apply_window_colour(&self, colour: u8, outline: bool, palette: &mut TextPalette) {
        let mut value = u32::from(self.shades(colour & !TextColour::TRANSLUCENT).text);
        if outline {
            value |= 0x000A_0A00;
        }
        palette.set_packed(value);
    }

    /// Applies the window colour in `slot` (0..3).
    pub fn apply_window_slot(&self, slot: u8, outline: bool, palette: &mut TextPalette) {
        let colour = self.window_colours[(slot as usize).min(2)];
        self.apply_window_colour(colour, outline, palette);
    }

    /// Applies an inset colour: a primary shade and a highlight two entries up.
    pub fn apply_inset(&self, colour: u8, dark: bool, extra_dark: bool, palette: &mut TextPalette) {
        let shades = self.shades(colour);
        let (primary, highlight) = match (dark, extra_dark) {
            (true, true) => (shades.dark, shades.mid_light),
            (true, false) => (shades.mid_dark, shades.light),
            _ => (shades.mid_light, shades.lighter),
        };
        palette.set_packed(u32::from(primary) | u32::from(highlight) << 16);
    }

    /// Applies a palette adjustment entry. Unknown entries leave the palette unchanged.
    pub fn apply_adjustment(&self, index: u8, outline: bool, palette: &mut TextPalette) {
        let adjustment = match self.adjustments.get(index as usize) {
            Some(a) => a,
            None => return,
        };
        palette.0[1] = adjustment.primary;
        palette.0[2] = outline as u8;
        palette.0[3..5].copy_from_slice(&adjustment.shadow);
        palette.0[5..7].copy_from_slice(&adjustment.highlight);
    }

    /// The ink index used by marquee glyphs for a colour byte.
    pub fn marquee_colour(&self, colour: u8) -> u8 {
        let shades = self.shades(colour & 0x7F);
        if colour & TextColour::TRANSLUCENT != 0 {
            shades.light
        } else {
            shades.mid_dark
        }
    }

    /// The ink index a colour code selects; used where only one colour is drawn.
    pub fn colour_code_primary(&self, index: u8) -> u8 {
        self.text_colours
            .get(index as usize)
            .map(|&v| v as u8)
            .unwrap_or(0)
    }
}
