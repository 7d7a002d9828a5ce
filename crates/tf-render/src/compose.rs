use tf_core::cell::Cell;

/// Terminateur de ligne ajouté après chaque rangée.
pub const ROW_TERMINATOR: char = '\n';

/// Longest serialized cell: `ESC[48;2;255;255;255m` + 4-byte glyph + `ESC[0m`.
const MAX_CELL_BYTES: usize = 19 + 4 + 4;

/// Texte complet d'une frame, prêt pour une écriture unique.
///
/// # Example
/// ```
/// use tf_core::cell::Cell;
/// use tf_render::compose::compose;
/// let grid = vec![vec![Cell::Background { rgb: [0, 0, 0] }]];
/// let buffer = compose(&grid);
/// assert_eq!(buffer.rows(), 1);
/// assert!(buffer.as_str().ends_with('\n'));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameBuffer {
    text: String,
    rows: usize,
}

impl FrameBuffer {
    /// Composed text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Composed bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Number of rows (and of row terminators).
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Byte length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// `true` for a frame without rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Concatène les cellules rangée par rangée, un terminateur par rangée.
#[must_use]
pub fn compose(grid: &[Vec<Cell>]) -> FrameBuffer {
    let cols = grid.first().map_or(0, Vec::len);
    let mut text = String::with_capacity(grid.len() * (cols * MAX_CELL_BYTES + 1));
    for row in grid {
        for cell in row {
            cell.write_into(&mut text);
        }
        text.push(ROW_TERMINATOR);
    }
    FrameBuffer {
        text,
        rows: grid.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_terminator_per_row_and_predictable_length() {
        let cell = Cell::Background {
            rgb: [100, 100, 100],
        };
        let cell_len = cell.to_string().len();
        for (rows, cols) in [(1usize, 1usize), (3, 5), (24, 80)] {
            let grid = vec![vec![cell; cols]; rows];
            let buffer = compose(&grid);
            assert_eq!(buffer.rows(), rows);
            assert_eq!(buffer.as_str().matches(ROW_TERMINATOR).count(), rows);
            assert_eq!(buffer.len(), rows * (cols * cell_len + 1));
        }
    }

    #[test]
    fn rows_keep_their_order() {
        let red = Cell::Background { rgb: [255, 0, 0] };
        let blue = Cell::Background { rgb: [0, 0, 255] };
        let buffer = compose(&[vec![red], vec![blue]]);
        let lines: Vec<&str> = buffer.as_str().lines().collect();
        assert_eq!(lines, [red.to_string(), blue.to_string()]);
    }

    #[test]
    fn empty_grid_is_empty_buffer() {
        let buffer = compose(&[]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.rows(), 0);
    }
}
