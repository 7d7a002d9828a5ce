/// Rampe de densité à 10 niveaux, du plus clair au plus dense.
pub const DENSITY_RAMP: &str = " .:-=+*#%@";

/// Luma BT.601 (poids 0.299 / 0.587 / 0.114) d'un pixel R, G, B.
///
/// # Example
/// ```
/// use tf_core::charset::luma;
/// assert_eq!(luma([255, 255, 255]), 255);
/// assert_eq!(luma([0, 0, 0]), 0);
/// ```
#[inline(always)]
#[must_use]
pub fn luma([r, g, b]: [u8; 3]) -> u8 {
    ((u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114 + 500) / 1000) as u8
}

/// Luminance [0..255] → glyph table, built once per session.
///
/// # Example
/// ```
/// use tf_core::charset::DensityLut;
/// let lut = DensityLut::default();
/// assert_eq!(lut.glyph(0), ' ');
/// assert_eq!(lut.glyph(255), '@');
/// ```
pub struct DensityLut {
    lut: [char; 256],
}

impl DensityLut {
    /// Build a LUT from a ramp ordered lightest→densest.
    ///
    /// Ramps shorter than two glyphs fall back to `" @"`.
    #[must_use]
    pub fn new(ramp: &str) -> Self {
        let glyphs: Vec<char> = ramp.chars().collect();
        if glyphs.len() < 2 {
            return Self::new(" @");
        }
        let steps = glyphs.len() - 1;
        let mut lut = [' '; 256];
        for (lum, slot) in lut.iter_mut().enumerate() {
            *slot = glyphs[lum * steps / 255];
        }
        Self { lut }
    }

    /// Glyph for a luminance value.
    #[inline(always)]
    #[must_use]
    pub fn glyph(&self, luminance: u8) -> char {
        self.lut[usize::from(luminance)]
    }
}

impl Default for DensityLut {
    fn default() -> Self {
        Self::new(DENSITY_RAMP)
    }
}
