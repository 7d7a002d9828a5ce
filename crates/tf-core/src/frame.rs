use crate::error::CoreError;

/// Ordre des canaux tel que livré par le décodeur.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    /// Red, green, blue.
    Rgb,
    /// Blue, green, red (décodeurs vidéo type OpenCV / ffmpeg `bgr24`).
    Bgr,
}

/// Raw pixel frame produced by a source. 3 bytes per pixel, row-major.
///
/// # Example
/// ```
/// use tf_core::frame::{ChannelOrder, RawFrame};
/// let frame = RawFrame::new(vec![0; 2 * 3 * 3], 2, 3, ChannelOrder::Rgb).unwrap();
/// assert_eq!(frame.dimensions(), (2, 3));
/// ```
#[derive(Clone, Debug)]
pub struct RawFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    order: ChannelOrder,
}

impl RawFrame {
    /// Wrap a decoded pixel buffer.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] for a zero side and
    /// [`CoreError::BufferMismatch`] if `data` is not `width × height × 3` bytes.
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        order: ChannelOrder,
    ) -> Result<Self, CoreError> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        if data.len() != width as usize * height as usize * 3 {
            return Err(CoreError::BufferMismatch {
                len: data.len(),
                width,
                height,
            });
        }
        Ok(Self {
            data,
            width,
            height,
            order,
        })
    }

    /// Build a frame from rows of triples, as delivered (used by tests and small sources).
    ///
    /// # Errors
    /// Returns an error if the rows are empty or ragged.
    pub fn from_rows(rows: &[Vec<[u8; 3]>], order: ChannelOrder) -> Result<Self, CoreError> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, Vec::len) as u32;
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for row in rows {
            if row.len() as u32 != width {
                return Err(CoreError::InvalidDimensions { width, height });
            }
            data.extend(row.iter().flatten());
        }
        Self::new(data, width, height, order)
    }

    /// (width, height) in pixels.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Channel order of the stored triples.
    #[must_use]
    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Raw bytes, row-major.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Dimensions de la grille terminal en cellules.
///
/// # Example
/// ```
/// use tf_core::frame::TargetGrid;
/// let grid: TargetGrid = "120x40".parse().unwrap();
/// assert_eq!((grid.cols, grid.rows), (120, 40));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetGrid {
    /// Columns (characters per row).
    pub cols: u16,
    /// Rows.
    pub rows: u16,
}

impl TargetGrid {
    /// Grille de repli quand la taille du terminal est inconnue.
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };

    /// Create a grid, rejecting zero sides.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if either side is zero.
    pub fn new(cols: u16, rows: u16) -> Result<Self, CoreError> {
        if cols == 0 || rows == 0 {
            return Err(CoreError::InvalidDimensions {
                width: u32::from(cols),
                height: u32::from(rows),
            });
        }
        Ok(Self { cols, rows })
    }

    /// Number of cells.
    #[must_use]
    pub fn area(&self) -> usize {
        usize::from(self.cols) * usize::from(self.rows)
    }
}

impl std::str::FromStr for TargetGrid {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidGrid(s.to_string());
        let (cols, rows) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        let cols = cols.trim().parse().map_err(|_| invalid())?;
        let rows = rows.trim().parse().map_err(|_| invalid())?;
        Self::new(cols, rows).map_err(|_| invalid())
    }
}

/// Frame resampled to exactly one triple per grid cell.
///
/// Invariant: `rows()` rows of `cols()` triples each, same channel order as the source.
#[derive(Clone, Debug)]
pub struct ScaledFrame {
    data: Vec<u8>,
    grid: TargetGrid,
    order: ChannelOrder,
}

impl ScaledFrame {
    /// Wrap resampled bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::BufferMismatch`] if `data` does not cover the grid exactly.
    pub fn new(data: Vec<u8>, grid: TargetGrid, order: ChannelOrder) -> Result<Self, CoreError> {
        if data.len() != grid.area() * 3 {
            return Err(CoreError::BufferMismatch {
                len: data.len(),
                width: u32::from(grid.cols),
                height: u32::from(grid.rows),
            });
        }
        Ok(Self { data, grid, order })
    }

    /// Grid this frame was scaled to.
    #[must_use]
    pub fn grid(&self) -> TargetGrid {
        self.grid
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        usize::from(self.grid.rows)
    }

    /// Number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        usize::from(self.grid.cols)
    }

    /// Channel order of the stored triples.
    #[must_use]
    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Triples of row `y`, as delivered.
    ///
    /// # Panics
    /// Panics if `y >= rows()`.
    pub fn row(&self, y: usize) -> impl Iterator<Item = [u8; 3]> + '_ {
        let stride = self.cols() * 3;
        self.data[y * stride..(y + 1) * stride]
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
    }

    /// Iterate over all rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = impl Iterator<Item = [u8; 3]> + '_> + '_ {
        (0..self.rows()).map(move |y| self.row(y))
    }
}
