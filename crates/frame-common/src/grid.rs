//! Regular coordinate grids and the scalar fields defined on them.

use serde::{Deserialize, Serialize};

use crate::error::{PlotError, PlotResult};

/// Weights of the 9-point smoother, row by row (sum 16).
const SMOOTH_WEIGHTS: [[f32; 3]; 3] = [[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]];

/// Projected coordinates of a regular grid.
///
/// `x` holds one coordinate per column and `y` one per row. Both axes are
/// uniformly spaced and may run in either direction (latitudes are often
/// stored north to south).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl CoordinateGrid {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> PlotResult<Self> {
        let grid = Self { x, y };
        grid.validate()?;
        Ok(grid)
    }

    /// Build a grid from an origin and a spacing on each axis.
    pub fn regular(nx: usize, ny: usize, x0: f64, dx: f64, y0: f64, dy: f64) -> PlotResult<Self> {
        let x = (0..nx).map(|i| x0 + i as f64 * dx).collect();
        let y = (0..ny).map(|j| y0 + j as f64 * dy).collect();
        Self::new(x, y)
    }

    pub fn nx(&self) -> usize {
        self.x.len()
    }

    pub fn ny(&self) -> usize {
        self.y.len()
    }

    /// Check that both axes have at least two strictly monotone points.
    pub fn validate(&self) -> PlotResult<()> {
        for (name, axis) in [("x", &self.x), ("y", &self.y)] {
            if axis.len() < 2 {
                return Err(PlotError::config(format!(
                    "coordinate axis '{}' needs at least 2 points, got {}",
                    name,
                    axis.len()
                )));
            }
            let ascending = axis[1] > axis[0];
            let monotone = axis.windows(2).all(|w| {
                if ascending {
                    w[1] > w[0]
                } else {
                    w[1] < w[0]
                }
            });
            if !monotone {
                return Err(PlotError::config(format!(
                    "coordinate axis '{}' is not strictly monotone",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Bounding box as (min_x, min_y, max_x, max_y).
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        let (x_first, x_last) = (self.x[0], self.x[self.x.len() - 1]);
        let (y_first, y_last) = (self.y[0], self.y[self.y.len() - 1]);
        (
            x_first.min(x_last),
            y_first.min(y_last),
            x_first.max(x_last),
            y_first.max(y_last),
        )
    }

    /// Coordinates of a grid cell.
    pub fn coord(&self, row: usize, col: usize) -> (f64, f64) {
        (self.x[col], self.y[row])
    }

    /// Fractional (row, col) index of a coordinate, assuming uniform spacing.
    ///
    /// Results outside `0..n-1` mean the coordinate lies off the grid.
    pub fn fractional_index(&self, x: f64, y: f64) -> (f64, f64) {
        let col = fraction_along(&self.x, x);
        let row = fraction_along(&self.y, y);
        (row, col)
    }

    /// Coordinates at a fractional (row, col) index; inverse of `fractional_index`.
    pub fn coord_at(&self, row: f64, col: f64) -> (f64, f64) {
        (value_along(&self.x, col), value_along(&self.y, row))
    }
}

fn value_along(axis: &[f64], index: f64) -> f64 {
    let first = axis[0];
    let last = axis[axis.len() - 1];
    first + (last - first) * index / (axis.len() - 1) as f64
}

fn fraction_along(axis: &[f64], value: f64) -> f64 {
    let first = axis[0];
    let last = axis[axis.len() - 1];
    (value - first) / (last - first) * (axis.len() - 1) as f64
}

/// A 2-D scalar field in row-major order. NaN marks missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GriddedField {
    pub nx: usize,
    pub ny: usize,
    /// Missing values travel as `null` in serialized form
    #[serde(with = "missing_as_null")]
    pub data: Vec<f32>,
}

mod missing_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(data.iter().map(|v| if v.is_nan() { None } else { Some(*v) }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
        let values: Vec<Option<f32>> = Vec::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect())
    }
}

impl GriddedField {
    pub fn new(nx: usize, ny: usize, data: Vec<f32>) -> PlotResult<Self> {
        if data.len() != nx * ny {
            return Err(PlotError::config(format!(
                "field data has {} values, expected {}x{}={}",
                data.len(),
                nx,
                ny,
                nx * ny
            )));
        }
        Ok(Self { nx, ny, data })
    }

    pub fn filled(nx: usize, ny: usize, value: f32) -> Self {
        Self {
            nx,
            ny,
            data: vec![value; nx * ny],
        }
    }

    /// Build a field by evaluating `f(row, col)` on every cell.
    pub fn from_fn(nx: usize, ny: usize, f: impl Fn(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(nx * ny);
        for row in 0..ny {
            for col in 0..nx {
                data.push(f(row, col));
            }
        }
        Self { nx, ny, data }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.nx + col]
    }

    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }

    pub fn is_all_nan(&self) -> bool {
        self.data.iter().all(|v| v.is_nan())
    }

    pub fn has_shape_of(&self, grid: &CoordinateGrid) -> bool {
        self.nx == grid.nx() && self.ny == grid.ny()
    }

    /// Minimum and maximum over the non-NaN values.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Bilinear sample at a fractional index. NaN off-grid or next to missing data.
    pub fn sample(&self, row: f64, col: f64) -> f32 {
        if self.is_empty() || row < 0.0 || col < 0.0 {
            return f32::NAN;
        }
        let max_row = (self.ny - 1) as f64;
        let max_col = (self.nx - 1) as f64;
        if row > max_row || col > max_col {
            return f32::NAN;
        }

        let r0 = row.floor() as usize;
        let c0 = col.floor() as usize;
        let r1 = (r0 + 1).min(self.ny - 1);
        let c1 = (c0 + 1).min(self.nx - 1);
        let dr = (row - r0 as f64) as f32;
        let dc = (col - c0 as f64) as f32;

        let v00 = self.get(r0, c0);
        let v01 = self.get(r0, c1);
        let v10 = self.get(r1, c0);
        let v11 = self.get(r1, c1);

        let top = v00 * (1.0 - dc) + v01 * dc;
        let bottom = v10 * (1.0 - dc) + v11 * dc;
        top * (1.0 - dr) + bottom * dr
    }

    /// Apply the 9-point smoother `passes` times.
    ///
    /// Border cells and cells with a missing neighbour keep their value.
    pub fn smooth_n_point(&self, passes: u32) -> Self {
        let mut current = self.clone();
        if self.nx < 3 || self.ny < 3 {
            return current;
        }

        for _ in 0..passes {
            let mut next = current.data.clone();
            for row in 1..self.ny - 1 {
                for col in 1..self.nx - 1 {
                    let mut sum = 0.0;
                    let mut missing = false;
                    for (dr, weights) in SMOOTH_WEIGHTS.iter().enumerate() {
                        for (dc, weight) in weights.iter().enumerate() {
                            let v = current.get(row + dr - 1, col + dc - 1);
                            if v.is_nan() {
                                missing = true;
                            }
                            sum += v * weight;
                        }
                    }
                    if !missing {
                        next[row * self.nx + col] = sum / 16.0;
                    }
                }
            }
            current.data = next;
        }

        current
    }

    /// Copy of the field with every value below `threshold` masked out.
    pub fn where_at_least(&self, threshold: f32) -> Self {
        let data = self
            .data
            .iter()
            .map(|&v| if v >= threshold { v } else { f32::NAN })
            .collect();
        Self {
            nx: self.nx,
            ny: self.ny,
            data,
        }
    }
}
