use crate::error::{AtlasError, Result};
use optional::{none, some, Optioned};

/// A `[level, row, column]` block of grid values with missing values marked `none`.
///
/// Values are stored level by level, each level row-major.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cube {
    levels: usize,
    rows: usize,
    cols: usize,
    data: Vec<Optioned<f64>>,
}

impl Cube {
    /// Create a cube from its values, which must number `levels * rows * cols`.
    pub fn new(levels: usize, rows: usize, cols: usize, data: Vec<Optioned<f64>>) -> Result<Self> {
        if data.len() != levels * rows * cols {
            return Err(AtlasError::DataAccess(format!(
                "expected {}x{}x{} values, got {}",
                levels,
                rows,
                cols,
                data.len()
            )));
        }

        Ok(Cube {
            levels,
            rows,
            cols,
            data,
        })
    }

    /// Create a cube by evaluating `f(level, row, col)` for every cell.
    pub fn from_fn<F>(levels: usize, rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize) -> Optioned<f64>,
    {
        let mut data = Vec::with_capacity(levels * rows * cols);
        for l in 0..levels {
            for r in 0..rows {
                for c in 0..cols {
                    data.push(f(l, r, c));
                }
            }
        }

        Cube {
            levels,
            rows,
            cols,
            data,
        }
    }

    /// Build a cube from raw values, marking as missing every value that is not finite or that
    /// matches the dataset's `missing_value`.
    pub fn from_raw(
        levels: usize,
        rows: usize,
        cols: usize,
        raw: &[f64],
        missing_value: Option<f64>,
    ) -> Result<Self> {
        let data = raw.iter().map(|&v| mask_value(v, missing_value)).collect();
        Self::new(levels, rows, cols, data)
    }

    /// Number of depth levels.
    #[inline]
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Number of latitude rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of longitude columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Value at a cell, `none` if missing or out of the cube.
    #[inline]
    pub fn get(&self, level: usize, row: usize, col: usize) -> Optioned<f64> {
        if level >= self.levels || row >= self.rows || col >= self.cols {
            return none();
        }
        self.data[(level * self.rows + row) * self.cols + col]
    }

    /// All cells of one level, row-major. Empty if the level is not in the cube.
    #[inline]
    pub fn level(&self, level: usize) -> &[Optioned<f64>] {
        if level >= self.levels {
            return &[];
        }
        let n = self.rows * self.cols;
        &self.data[level * n..(level + 1) * n]
    }

    /// Place `right` to the east of `left`. Both must have the same levels and rows.
    pub fn concat_columns(left: &Cube, right: &Cube) -> Result<Cube> {
        if left.levels != right.levels || left.rows != right.rows {
            return Err(AtlasError::DataAccess(format!(
                "cannot join {}x{} window with {}x{} window",
                left.levels, left.rows, right.levels, right.rows
            )));
        }

        let cols = left.cols + right.cols;
        Ok(Cube::from_fn(left.levels, left.rows, cols, |l, r, c| {
            if c < left.cols {
                left.get(l, r, c)
            } else {
                right.get(l, r, c - left.cols)
            }
        }))
    }
}

fn mask_value(value: f64, missing_value: Option<f64>) -> Optioned<f64> {
    if !value.is_finite() {
        return none();
    }
    match missing_value {
        // The fill value goes through a text round trip, compare with a relative tolerance.
        Some(mv) if (value - mv).abs() <= mv.abs() * 1.0e-6 => none(),
        _ => some(value),
    }
}
