//! Font sizes and the per-size TrueType font configuration.

use std::path::PathBuf;

use glam::{ivec2, IVec2};
use serde::{Deserialize, Serialize};

use crate::rasterizer::{FontId, FontLoadError, Rasterizer};

/// One of the four text sizes. Each size has its own bitmap font
/// and, optionally, its own TrueType font.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontSize {
    Tiny,
    Small,
    Medium,
    Big,
}

impl Default for FontSize {
    fn default() -> Self {
        Self::Medium
    }
}

impl FontSize {
    pub const ALL: [FontSize; 4] = [
        FontSize::Tiny,
        FontSize::Small,
        FontSize::Medium,
        FontSize::Big,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            FontSize::Tiny => 0,
            FontSize::Small => 1,
            FontSize::Medium => 2,
            FontSize::Big => 3,
        }
    }

    /// Line height of the bitmap font at this size.
    pub fn sprite_line_height(self) -> i32 {
        match self {
            FontSize::Tiny => 6,
            FontSize::Small | FontSize::Medium => 10,
            FontSize::Big => 18,
        }
    }
}

/// A TrueType font file used for one text size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontDescriptor {
    pub path: PathBuf,
    pub point_size: u32,
    /// Added to the cursor before blitting a rasterized run.
    #[serde(default)]
    pub offset_x: i32,
    #[serde(default)]
    pub offset_y: i32,
    pub line_height: i32,
}

/// The TrueType fonts for each text size. Sizes left as `None`
/// are drawn with the bitmap font.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSetConfig {
    pub tiny: Option<FontDescriptor>,
    pub small: Option<FontDescriptor>,
    pub medium: Option<FontDescriptor>,
    pub big: Option<FontDescriptor>,
}

impl FontSetConfig {
    pub fn get(&self, size: FontSize) -> Option<&FontDescriptor> {
        match size {
            FontSize::Tiny => self.tiny.as_ref(),
            FontSize::Small => self.small.as_ref(),
            FontSize::Medium => self.medium.as_ref(),
            FontSize::Big => self.big.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        FontSize::ALL.iter().all(|&size| self.get(size).is_none())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct LoadedFont {
    pub id: FontId,
    pub offset: IVec2,
    pub line_height: i32,
}

/// Fonts opened from a [`FontSetConfig`].
#[derive(Debug, Default)]
pub(crate) struct FontSet {
    fonts: [Option<LoadedFont>; 4],
}

impl FontSet {
    /// Opens every configured font. Sizes that fail to load stay empty;
    /// the first failure is returned alongside the partially loaded set.
    pub fn load(
        config: &FontSetConfig,
        rasterizer: &mut dyn Rasterizer,
    ) -> (Self, Option<FontLoadError>) {
        let mut set = FontSet::default();
        let mut first_error = None;

        for size in FontSize::ALL {
            let descriptor = match config.get(size) {
                Some(d) => d,
                None => continue,
            };
            match rasterizer.open_font(&descriptor.path, descriptor.point_size) {
                Ok(id) => {
                    log::info!(
                        "Loaded font '{}' at {}pt for {:?} text",
                        descriptor.path.display(),
                        descriptor.point_size,
                        size
                    );
                    set.fonts[size.index()] = Some(LoadedFont {
                        id,
                        offset: ivec2(descriptor.offset_x, descriptor.offset_y),
                        line_height: descriptor.line_height,
                    });
                }
                Err(e) => {
                    log::warn!("{}; {:?} text will use the bitmap font", e, size);
                    first_error.get_or_insert(e);
                }
            }
        }

        (set, first_error)
    }

    pub fn get(&self, size: FontSize) -> Option<LoadedFont> {
        self.fonts[size.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.iter().all(Option::is_none)
    }

    pub fn ids(&self) -> impl Iterator<Item = FontId> + '_ {
        self.fonts.iter().flatten().map(|f| f.id)
    }
}
