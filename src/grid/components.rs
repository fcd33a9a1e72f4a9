use super::*;

/// Represents a row in the grid.
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Row {
    pub index: u32,
    pub y: f64,
    pub height: f64,
}

/// Represents a column in the grid.
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Column {
    pub index: u32,
    pub x: f64,
    pub width: f64,
}

/// Represents a cell in the grid, referencing a row and a column.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    pub row: &'a Row,
    pub column: &'a Column,
}

impl Cell<'_> {
    /// Row-major position of this cell in a grid with `columns` columns.
    pub fn id(&self, columns: u32) -> usize {
        self.row.index as usize * columns as usize + self.column.index as usize
    }

    /// Computes the real-valued crop region of this cell after removing
    /// `trim_x` pixels from the left and right edges and `trim_y` pixels from
    /// the top and bottom edges.
    ///
    /// # Example
    /// ```
    /// use gridslice::{Cell, Column, LineTrait, Row, Span};
    ///
    /// let row = Row::new(1, Span::new(100.0, 100.0));
    /// let column = Column::new(0, Span::new(0.0, 200.0));
    /// let region = Cell { row: &row, column: &column }.crop_region(10, 20);
    ///
    /// assert_eq!((region.x, region.y), (10.0, 120.0));
    /// assert_eq!((region.width, region.height), (180.0, 60.0));
    /// ```
    pub fn crop_region(&self, trim_x: u32, trim_y: u32) -> CropRegion {
        let horizontal = self.column.span().inset(trim_x);
        let vertical = self.row.span().inset(trim_y);
        CropRegion {
            x: horizontal.start,
            y: vertical.start,
            width: horizontal.length,
            height: vertical.length,
        }
    }
}

impl From<&Cell<'_>> for CropRegion {
    fn from(cell: &Cell) -> Self {
        cell.crop_region(0, 0)
    }
}

/// Real-valued rectangle to copy out of the source image for one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRegion {
    /// A region is usable only when both trimmed dimensions are positive.
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Snaps the region to whole pixels inside an image of the given size.
    ///
    /// Both edges are floored, so neighbouring untrimmed cells share their
    /// boundary and tile the image without gaps. Returns `None` when the
    /// snapped rectangle holds no pixels.
    ///
    /// # Example
    /// ```
    /// use gridslice::CropRegion;
    ///
    /// let region = CropRegion { x: 3.3, y: 0.0, width: 3.4, height: 10.0 };
    /// let rect = region.pixel_rect(10, 10).unwrap();
    /// assert_eq!((rect.left(), rect.width()), (3, 3));
    ///
    /// let sliver = CropRegion { x: 3.2, y: 0.0, width: 0.5, height: 10.0 };
    /// assert!(sliver.pixel_rect(10, 10).is_none());
    /// ```
    pub fn pixel_rect(&self, image_width: u32, image_height: u32) -> Option<Rect> {
        if !self.is_valid() {
            return None;
        }
        let columns = Span::new(self.x, self.width).pixel_range(image_width)?;
        let rows = Span::new(self.y, self.height).pixel_range(image_height)?;
        Some(
            Rect::at(columns.start as i32, rows.start as i32)
                .of_size(columns.end - columns.start, rows.end - rows.start),
        )
    }
}
