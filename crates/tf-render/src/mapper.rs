use tf_core::cell::{Cell, CellMode, DEFAULT_GLYPH};
use tf_core::charset::{DensityLut, luma};
use tf_core::config::Settings;
use tf_core::frame::{ChannelOrder, ScaledFrame};

/// Grille de cellules, une ligne par rangée terminal.
pub type CellGrid = Vec<Vec<Cell>>;

/// Remet un triplet dans l'ordre R, G, B.
///
/// # Example
/// ```
/// use tf_core::frame::ChannelOrder;
/// use tf_render::mapper::to_rgb;
/// assert_eq!(to_rgb([1, 2, 3], ChannelOrder::Bgr), [3, 2, 1]);
/// assert_eq!(to_rgb([1, 2, 3], ChannelOrder::Rgb), [1, 2, 3]);
/// ```
#[inline(always)]
#[must_use]
pub fn to_rgb([c0, c1, c2]: [u8; 3], order: ChannelOrder) -> [u8; 3] {
    match order {
        ChannelOrder::Rgb => [c0, c1, c2],
        ChannelOrder::Bgr => [c2, c1, c0],
    }
}

/// Convertit chaque pixel d'une frame redimensionnée en cellule terminal.
///
/// # Example
/// ```
/// use tf_core::cell::{Cell, CellMode};
/// use tf_core::frame::ChannelOrder;
/// use tf_render::mapper::ColorCellMapper;
/// let mapper = ColorCellMapper::new(CellMode::Background, true);
/// let cell = mapper.cell([0, 0, 255], ChannelOrder::Bgr);
/// assert_eq!(cell, Cell::Background { rgb: [255, 0, 0] });
/// ```
pub struct ColorCellMapper {
    mode: CellMode,
    color: bool,
    glyph: char,
    density: DensityLut,
}

impl ColorCellMapper {
    /// Mapper with the default glyph.
    #[must_use]
    pub fn new(mode: CellMode, color: bool) -> Self {
        Self {
            mode,
            color,
            glyph: DEFAULT_GLYPH,
            density: DensityLut::default(),
        }
    }

    /// Mapper configured from session settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            glyph: settings.glyph,
            ..Self::new(settings.mode, settings.color)
        }
    }

    /// Cell for one pixel, channels as delivered in `order`.
    #[inline]
    #[must_use]
    pub fn cell(&self, px: [u8; 3], order: ChannelOrder) -> Cell {
        let rgb = to_rgb(px, order);
        let shown = if self.color {
            rgb
        } else {
            let l = luma(rgb);
            [l, l, l]
        };
        match self.mode {
            CellMode::Background => Cell::Background { rgb: shown },
            CellMode::ForegroundGlyph => Cell::Glyph {
                ch: self.glyph,
                rgb: shown,
            },
            CellMode::GrayscaleDensity => Cell::Glyph {
                ch: self.density.glyph(luma(rgb)),
                rgb: shown,
            },
        }
    }

    /// Map a whole frame; the grid has the frame's rows × cols shape.
    #[must_use]
    pub fn map(&self, scaled: &ScaledFrame) -> CellGrid {
        let order = scaled.order();
        scaled
            .iter_rows()
            .map(|row| row.map(|px| self.cell(px, order)).collect())
            .collect()
    }
}
