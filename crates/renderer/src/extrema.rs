//! Local maxima/minima detection on gridded fields.
//!
//! A cell is a candidate when it holds the extreme value of the square window
//! of half-width `separation` centred on it. Cells closer than `separation` to
//! the border are skipped so every window is complete. Candidates closer than
//! `separation` to a more extreme one are then dropped, so the returned points
//! are pairwise at least `separation` cells apart.

use frame_common::GriddedField;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Which kind of extremum to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremumKind {
    Max,
    Min,
}

impl ExtremumKind {
    /// Whether `a` is strictly more extreme than `b`.
    fn beats(self, a: f32, b: f32) -> bool {
        match self {
            ExtremumKind::Max => a > b,
            ExtremumKind::Min => a < b,
        }
    }

    fn pick(self, a: f32, b: f32) -> f32 {
        if b.is_nan() || self.beats(a, b) {
            a
        } else {
            b
        }
    }
}

/// A detected local extremum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtremumPoint {
    pub row: usize,
    pub col: usize,
    pub value: f32,
    pub kind: ExtremumKind,
}

impl ExtremumPoint {
    pub fn distance_sq(&self, row: usize, col: usize) -> usize {
        let dr = self.row.abs_diff(row);
        let dc = self.col.abs_diff(col);
        dr * dr + dc * dc
    }
}

/// How candidates with equal values are ordered before suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Row-major scan order wins
    #[default]
    ScanOrder,
    /// Equal values are shuffled by an RNG seeded with this value
    Seeded(u64),
}

/// Finds local extrema at a minimum separation.
#[derive(Debug, Clone, Copy)]
pub struct ExtremaFinder {
    pub kind: ExtremumKind,
    /// Window half-width and minimum distance between results, in grid cells
    pub separation: usize,
    pub tie_break: TieBreak,
}

impl ExtremaFinder {
    pub fn new(kind: ExtremumKind, separation: usize) -> Self {
        Self {
            kind,
            separation: separation.max(1),
            tie_break: TieBreak::ScanOrder,
        }
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Detect extrema in `field`. Returns an empty vector when nothing qualifies.
    pub fn find(&self, field: &GriddedField) -> Vec<ExtremumPoint> {
        let d = self.separation;
        if field.is_empty() || field.nx <= 2 * d || field.ny <= 2 * d {
            return Vec::new();
        }

        let window = window_extreme(field, d, self.kind);
        let mut candidates = Vec::new();
        for row in d..field.ny - d {
            for col in d..field.nx - d {
                let value = field.get(row, col);
                if !value.is_nan() && value == window[row * field.nx + col] {
                    candidates.push(ExtremumPoint {
                        row,
                        col,
                        value,
                        kind: self.kind,
                    });
                }
            }
        }

        if let TieBreak::Seeded(seed) = self.tie_break {
            let mut rng = StdRng::seed_from_u64(seed);
            candidates.shuffle(&mut rng);
        }

        // Stable: equal values keep scan or shuffled order.
        let kind = self.kind;
        candidates.sort_by(|a, b| {
            let ord = a.value.total_cmp(&b.value);
            match kind {
                ExtremumKind::Max => ord.reverse(),
                ExtremumKind::Min => ord,
            }
        });

        suppress_near(candidates, d)
    }
}

/// Keep candidates in order, dropping any closer than `d` to one already kept.
fn suppress_near(candidates: Vec<ExtremumPoint>, d: usize) -> Vec<ExtremumPoint> {
    let min_sq = d * d;
    let mut kept: Vec<ExtremumPoint> = Vec::new();
    for candidate in candidates {
        if kept
            .iter()
            .all(|p| p.distance_sq(candidate.row, candidate.col) >= min_sq)
        {
            kept.push(candidate);
        }
    }
    kept
}

/// Extreme value over the (2d+1)^2 window around every cell, ignoring NaN.
///
/// Separable: a row pass followed by a column pass, windows truncated at the
/// borders.
fn window_extreme(field: &GriddedField, d: usize, kind: ExtremumKind) -> Vec<f32> {
    let (nx, ny) = (field.nx, field.ny);

    let mut rows = vec![f32::NAN; nx * ny];
    for row in 0..ny {
        for col in 0..nx {
            let lo = col.saturating_sub(d);
            let hi = (col + d).min(nx - 1);
            rows[row * nx + col] = (lo..=hi).fold(f32::NAN, |acc, c| kind.pick(field.get(row, c), acc));
        }
    }

    let mut out = vec![f32::NAN; nx * ny];
    for row in 0..ny {
        let lo = row.saturating_sub(d);
        let hi = (row + d).min(ny - 1);
        for col in 0..nx {
            out[row * nx + col] = (lo..=hi).fold(f32::NAN, |acc, r| kind.pick(rows[r * nx + col], acc));
        }
    }
    out
}
