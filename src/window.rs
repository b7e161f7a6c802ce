//! Index arithmetic for the search window.
//!
//! The longitude axis of the grid does not wrap by itself: a window centered near the last
//! column has to be read as two contiguous pieces, the eastern end of the array followed by its
//! western start. Latitude does not wrap, a window hanging over the north or south edge of the
//! grid is clipped.
use std::ops::Range;

/// How the columns of a search window map onto the longitude axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LonSpans {
    /// The window is a single run of columns.
    Contiguous(Range<usize>),
    /// The window crosses the end of the axis. `left` runs to the last column, `right` starts
    /// at column 0, and the window is `left` followed by `right`.
    Split {
        /// Columns from the wrapped west edge to the end of the axis.
        left: Range<usize>,
        /// Columns from the start of the axis filling the rest of the window.
        right: Range<usize>,
    },
}

impl LonSpans {
    /// Number of columns in the window.
    pub fn len(&self) -> usize {
        match self {
            LonSpans::Contiguous(r) => r.len(),
            LonSpans::Split { left, right } => left.len() + right.len(),
        }
    }

    /// True if the window has no columns.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the window crosses the end of the axis.
    pub fn is_split(&self) -> bool {
        matches!(self, LonSpans::Split { .. })
    }

    /// Column indexes of the window, west to east.
    pub fn indexes(&self) -> impl Iterator<Item = usize> {
        let (first, second) = match self {
            LonSpans::Contiguous(r) => (r.clone(), 0..0),
            LonSpans::Split { left, right } => (left.clone(), right.clone()),
        };
        first.chain(second)
    }
}

/// Columns of a window of `2 * half + 1` nodes centered on column `center` of an axis with `len`
/// columns.
///
/// `center` may fall outside `0..len` when the query sits between the last column and the
/// seam, it is wrapped before the window is built. Returns `None` when the window is wider than
/// the axis.
pub fn lon_spans(center: isize, half: usize, len: usize) -> Option<LonSpans> {
    let size = 2 * half + 1;
    if len == 0 || size > len {
        return None;
    }

    let n = len as isize;
    let half = half as isize;
    let center = center.rem_euclid(n);
    let west = center - half;
    let east = center + half;

    if west >= 0 && east < n {
        return Some(LonSpans::Contiguous(west as usize..(east + 1) as usize));
    }

    let left_start = west.rem_euclid(n) as usize;
    let left = left_start..len;
    let right = 0..(size - left.len());

    Some(LonSpans::Split { left, right })
}

/// Rows of a window of `2 * half + 1` nodes centered on row `center` of an axis with `len` rows,
/// clipped to the axis. `None` if no row of the window is on the grid.
pub fn lat_span(center: isize, half: usize, len: usize) -> Option<Range<usize>> {
    let half = half as isize;
    let start = (center - half).max(0);
    let end = (center + half + 1).min(len as isize);

    if start >= end {
        None
    } else {
        Some(start as usize..end as usize)
    }
}
