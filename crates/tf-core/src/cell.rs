use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

/// Remise à zéro du formatage, émise après chaque cellule.
pub const RESET: &str = "\x1b[0m";

/// Glyph used by foreground-glyph cells.
pub const DEFAULT_GLYPH: char = '@';

/// How a pixel becomes a terminal cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellMode {
    /// Colored space: the background color carries the pixel.
    #[default]
    Background,
    /// Fixed glyph colored with the pixel, default background.
    ForegroundGlyph,
    /// Glyph picked by luminance from a density ramp, colored with the pixel.
    GrayscaleDensity,
}

/// One renderable terminal cell. Color is always stored as R, G, B.
///
/// The serialized form resets formatting right after itself, so cells can be
/// concatenated in any order without color bleed.
///
/// # Example
/// ```
/// use tf_core::cell::Cell;
/// let cell = Cell::Background { rgb: [255, 0, 0] };
/// assert_eq!(cell.to_string(), "\x1b[48;2;255;0;0m \x1b[0m");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    /// Space with a colored background.
    Background {
        /// Background color.
        rgb: [u8; 3],
    },
    /// Foreground-colored character on the default background.
    Glyph {
        /// Character to print.
        ch: char,
        /// Foreground color.
        rgb: [u8; 3],
    },
}

impl Cell {
    /// Append the escape-encoded cell to `out` without intermediate allocation.
    #[inline]
    pub fn write_into(&self, out: &mut String) {
        // Écrire dans une String ne peut pas échouer.
        let _ = write!(out, "{self}");
    }

    /// Color carried by the cell, as R, G, B.
    #[must_use]
    pub fn rgb(&self) -> [u8; 3] {
        match *self {
            Self::Background { rgb } | Self::Glyph { rgb, .. } => rgb,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Background { rgb: [r, g, b] } => write!(f, "\x1b[48;2;{r};{g};{b}m {RESET}"),
            Self::Glyph { ch, rgb: [r, g, b] } => write!(f, "\x1b[38;2;{r};{g};{b}m{ch}{RESET}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_cell_encoding() {
        let cell = Cell::Glyph {
            ch: DEFAULT_GLYPH,
            rgb: [1, 22, 233],
        };
        assert_eq!(cell.to_string(), "\x1b[38;2;1;22;233m@\x1b[0m");
    }

    #[test]
    fn every_cell_ends_with_reset() {
        let cells = [
            Cell::Background { rgb: [0, 0, 0] },
            Cell::Background {
                rgb: [255, 255, 255],
            },
            Cell::Glyph {
                ch: '#',
                rgb: [10, 20, 30],
            },
        ];
        for cell in cells {
            assert!(cell.to_string().ends_with(RESET), "{cell:?}");
        }
    }

    #[test]
    fn concatenation_keeps_each_cell_intact() {
        let a = Cell::Background { rgb: [255, 0, 0] };
        let b = Cell::Glyph {
            ch: '@',
            rgb: [0, 0, 255],
        };
        let mut joined = String::new();
        a.write_into(&mut joined);
        b.write_into(&mut joined);
        let (left, right) = joined.split_at(a.to_string().len());
        assert_eq!(left, a.to_string());
        assert_eq!(right, b.to_string());
    }

    #[test]
    fn mode_names_in_toml() {
        #[derive(Deserialize)]
        struct Wrap {
            mode: CellMode,
        }
        let w: Wrap = toml::from_str("mode = \"foreground_glyph\"").unwrap();
        assert_eq!(w.mode, CellMode::ForegroundGlyph);
    }
}
