use super::*;

/// A trait providing a factory method to create grid lines from a [`Span`].
///
/// This trait is implemented by [`Row`] and [`Column`], so that both axes of a
/// grid can be partitioned by the same generic routine
/// ([`Grid::partition`]).
///
/// # Examples
///
/// ```
/// use gridslice::{LineTrait, Span, Row, Column};
///
/// let span = Span::new(0.0, 100.0);
///
/// let row = Row::new(0, span);
/// assert_eq!(row.height, 100.0);
///
/// let column = Column::new(3, span);
/// assert_eq!(column.index, 3);
/// ```
pub trait LineTrait {
    /// Creates a new instance for the line at `index` covering `span`.
    fn new(index: u32, span: Span) -> Self;

    /// Returns the extent covered by this line.
    fn span(&self) -> Span;
}

impl LineTrait for Row {
    fn new(index: u32, span: Span) -> Self {
        Row {
            index,
            y: span.start,
            height: span.length,
        }
    }

    fn span(&self) -> Span {
        Span::new(self.y, self.height)
    }
}

impl LineTrait for Column {
    fn new(index: u32, span: Span) -> Self {
        Column {
            index,
            x: span.start,
            width: span.length,
        }
    }

    fn span(&self) -> Span {
        Span::new(self.x, self.width)
    }
}
