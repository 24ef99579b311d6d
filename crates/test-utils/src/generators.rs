//! Synthetic fields with predictable structure.

use frame_common::GriddedField;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `col * 1000 + row` at every cell, so misplaced reads are obvious.
pub fn index_field(nx: usize, ny: usize) -> GriddedField {
    GriddedField::from_fn(nx, ny, |row, col| (col * 1000 + row) as f32)
}

/// Linear ramp along columns from `lo` (first column) to `hi` (last column).
pub fn ramp_field(nx: usize, ny: usize, lo: f32, hi: f32) -> GriddedField {
    let span = (nx.max(2) - 1) as f32;
    GriddedField::from_fn(nx, ny, |_, col| lo + (hi - lo) * col as f32 / span)
}

/// Gaussian bump of `amplitude` over `base`, centred on `(row, col)`.
pub fn bump_field(nx: usize, ny: usize, row: f32, col: f32, sigma: f32, base: f32, amplitude: f32) -> GriddedField {
    GriddedField::from_fn(nx, ny, |r, c| {
        let d2 = (r as f32 - row).powi(2) + (c as f32 - col).powi(2);
        base + amplitude * (-d2 / (2.0 * sigma * sigma)).exp()
    })
}

/// Pressure-like field (hPa) with one high and one low that drift east with `step`.
pub fn pressure_field(nx: usize, ny: usize, step: usize) -> GriddedField {
    let shift = step as f32 * 0.5;
    let (w, h) = (nx as f32, ny as f32);
    let sigma = w.min(h) / 6.0;
    GriddedField::from_fn(nx, ny, |r, c| {
        let bump = |row: f32, col: f32| {
            let d2 = (r as f32 - row).powi(2) + (c as f32 - col).powi(2);
            (-d2 / (2.0 * sigma * sigma)).exp()
        };
        1012.0 + 22.0 * bump(h * 0.3, w * 0.25 + shift) - 28.0 * bump(h * 0.65, w * 0.7 + shift)
    })
}

/// Uniform random values in `[lo, hi)` from a seeded RNG.
pub fn random_field(nx: usize, ny: usize, seed: u64, lo: f32, hi: f32) -> GriddedField {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..nx * ny).map(|_| rng.gen_range(lo..hi)).collect();
    GriddedField { nx, ny, data }
}

/// Copy of `field` with the cells listed set to NaN.
pub fn with_missing(field: &GriddedField, cells: &[(usize, usize)]) -> GriddedField {
    let mut out = field.clone();
    for &(row, col) in cells {
        out.data[row * field.nx + col] = f32::NAN;
    }
    out
}
