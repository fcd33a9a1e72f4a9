//! Uniform grid partition of a source image.
use imageproc::rect::Rect;
use smallvec::SmallVec;
use tracing::*;

use crate::{DEFAULT_COLS, DEFAULT_ROWS, DEFAULT_SMALLVEC_SIZE};

mod components;
mod config;
mod lines;
mod traits;

pub use components::{Cell, Column, CropRegion, Row};
pub use config::{OutputFormat, SliceConfig};
pub use lines::{SmallVecLine, Span};
pub use traits::LineTrait;

/// Represents the equal-sized rows and columns a source image is divided into.
///
/// # Example
/// ```
/// use gridslice::Grid;
///
/// let grid = Grid::uniform(400, 200, 2, 2).unwrap();
/// assert_eq!(grid.rows.len(), 2);
/// assert_eq!(grid.columns[1].x, 200.0);
/// assert_eq!(grid.rows[1].height, 100.0);
/// ```
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Grid {
    pub rows: SmallVecLine<Row>,
    pub columns: SmallVecLine<Column>,
}

impl Grid {
    /// Divides a `width` x `height` image into `rows` x `cols` equal cells.
    ///
    /// Cell sizes are real-valued; nothing is rounded here. Returns `None` when
    /// `rows` or `cols` is zero.
    pub fn uniform(width: u32, height: u32, rows: u32, cols: u32) -> Option<Self> {
        if rows == 0 || cols == 0 {
            debug!("Empty grid requested: rows={}, cols={}", rows, cols);
            return None;
        }
        trace!(
            "Partitioning {}x{} image into {} rows and {} columns",
            width,
            height,
            rows,
            cols
        );
        Some(Grid {
            rows: Self::partition::<Row>(height, rows),
            columns: Self::partition::<Column>(width, cols),
        })
    }

    /// Divides the image like [`Grid::uniform`], but keeps only the rows and
    /// columns that still cover at least one whole pixel after trimming.
    ///
    /// A cell holds pixels exactly when both its row and its column do, so
    /// the grid never grows beyond `min(rows, height) x min(cols, width)`
    /// cells however large the requested grid is. Lines keep their original
    /// indices.
    ///
    /// # Example
    /// ```
    /// use gridslice::{Grid, SliceConfig};
    ///
    /// let grid = Grid::visible(4, 4, &SliceConfig::new(100_000, 100_000)).unwrap();
    /// assert_eq!(grid.cell_count(), 16);
    /// assert_eq!(grid.columns[0].index, 24_999);
    /// ```
    pub fn visible(width: u32, height: u32, config: &SliceConfig) -> Option<Self> {
        if !config.has_cells() {
            debug!("Empty grid requested: {:?}", config);
            return None;
        }
        let rows = Self::partition_where::<Row>(height, config.rows, |span| {
            span.inset(config.trim_y).pixel_range(height).is_some()
        });
        let columns = Self::partition_where::<Column>(width, config.cols, |span| {
            span.inset(config.trim_x).pixel_range(width).is_some()
        });
        debug!(
            "{} of {} rows and {} of {} columns cover pixels",
            rows.len(),
            config.rows,
            columns.len(),
            config.cols
        );
        Some(Grid { rows, columns })
    }

    /// Generic function to partition one dimension into rows or columns.
    pub fn partition<T: LineTrait>(extent: u32, count: u32) -> SmallVecLine<T> {
        Self::partition_where(extent, count, |_| true)
    }

    /// Partitions one dimension, keeping only the lines whose span passes `keep`.
    pub fn partition_where<T: LineTrait>(
        extent: u32,
        count: u32,
        keep: impl Fn(Span) -> bool,
    ) -> SmallVecLine<T> {
        Span::divide(extent, count)
            .zip(0..)
            .filter(|(span, _)| keep(*span))
            .map(|(span, index)| T::new(index, span))
            .collect()
    }

    /// Returns the number of cells in the grid.
    pub fn cell_count(&self) -> usize {
        self.rows.len() * self.columns.len()
    }

    /// Returns an iterator over all cells in row-major order: the outer loop
    /// walks rows, the inner loop walks columns.
    ///
    /// # Example
    /// ```
    /// use gridslice::Grid;
    ///
    /// let grid = Grid::uniform(30, 20, 2, 3).unwrap();
    /// let ids: Vec<usize> = grid.cells().map(|cell| cell.id(3)).collect();
    /// assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
    /// ```
    pub fn cells(&self) -> impl Iterator<Item = Cell<'_>> {
        self.rows.iter().flat_map(move |row| {
            self.columns
                .iter()
                .map(move |column| Cell { row, column })
        })
    }

    /// Finds a cell by its grid coordinates.
    pub fn find_cell(&self, row: u32, col: u32) -> Option<Cell<'_>> {
        let row = self.rows.get(row as usize)?;
        let column = self.columns.get(col as usize)?;
        Some(Cell { row, column })
    }
}
