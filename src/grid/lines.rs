use std::ops::Range;

use super::*;

// Edge tolerance in units of f64::EPSILON, scaled by the edge magnitude, so an
// edge that should land on a whole pixel is not floored one pixel short.
const EDGE_TOLERANCE_ULPS: f64 = 16.0;

/// A real-valued extent along one axis of the source image.
///
/// Spans are produced by dividing an image dimension into equal parts, so both
/// `start` and `length` may be fractional.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Span {
    pub start: f64,
    pub length: f64,
}

/// A type alias for SmallVec with an optimized stack-allocated buffer size.
pub type SmallVecLine<T> = SmallVec<[T; DEFAULT_SMALLVEC_SIZE]>;

impl Span {
    /// Creates a new `Span` with the given start position and length.
    ///
    /// # Example
    /// ```
    /// use gridslice::Span;
    ///
    /// let span = Span::new(12.5, 25.0);
    /// assert_eq!(span.start, 12.5);
    /// assert_eq!(span.end(), 37.5);
    /// ```
    pub fn new(start: f64, length: f64) -> Self {
        Self { start, length }
    }

    pub fn end(&self) -> f64 {
        self.start + self.length
    }

    /// Shrinks the span by `margin` on both sides.
    ///
    /// The result may have a zero or negative length; callers decide whether
    /// such a span is usable.
    ///
    /// # Example
    /// ```
    /// use gridslice::Span;
    ///
    /// let inner = Span::new(100.0, 100.0).inset(30);
    /// assert_eq!(inner, Span::new(130.0, 40.0));
    /// assert!(Span::new(0.0, 100.0).inset(50).length <= 0.0);
    /// ```
    pub fn inset(&self, margin: u32) -> Self {
        let margin = f64::from(margin);
        Self {
            start: self.start + margin,
            length: self.length - 2.0 * margin,
        }
    }

    /// Whole pixels covered by this span inside `0..limit`.
    ///
    /// Both edges are floored, so spans that share a boundary also share the
    /// pixel edge. Returns `None` when no whole pixel is covered.
    ///
    /// # Example
    /// ```
    /// use gridslice::Span;
    ///
    /// assert_eq!(Span::new(3.3, 3.4).pixel_range(10), Some(3..6));
    /// assert_eq!(Span::new(3.2, 0.5).pixel_range(10), None);
    /// assert_eq!(Span::new(8.0, 5.0).pixel_range(10), Some(8..10));
    /// ```
    pub fn pixel_range(&self, limit: u32) -> Option<Range<u32>> {
        if self.length <= 0.0 {
            return None;
        }
        let start = snap(self.start, limit);
        let end = snap(self.end(), limit);
        (end > start).then_some(start..end)
    }

    /// Splits `extent` into `count` equal spans, in order.
    pub fn divide(extent: u32, count: u32) -> impl Iterator<Item = Span> {
        let (total, parts) = (f64::from(extent), f64::from(count.max(1)));
        let piece = total / parts;
        // index * extent is an exact integer in f64 for every u32 pair
        (0..count).map(move |index| Span::new(f64::from(index) * total / parts, piece))
    }
}

fn snap(edge: f64, limit: u32) -> u32 {
    let tolerance = edge.abs().max(1.0) * EDGE_TOLERANCE_ULPS * f64::EPSILON;
    // `as` saturates negative values to 0
    ((edge + tolerance).floor() as u32).min(limit)
}
