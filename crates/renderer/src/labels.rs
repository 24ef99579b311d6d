//! Density-limited selection of grid points for direct value annotation.

use std::collections::HashMap;

use frame_common::{GriddedField, PlotError, PlotResult};

use crate::colormap::LevelSet;

/// Which grid values are eligible for a label.
#[derive(Debug, Clone, PartialEq)]
pub enum ValuePredicate {
    /// Any non-missing value
    Any,
    /// `value >= threshold`
    AtLeast(f32),
    /// Value inside `[first, last]` of a level set
    WithinLevels(LevelSet),
}

impl ValuePredicate {
    pub fn matches(&self, value: f32) -> bool {
        if value.is_nan() {
            return false;
        }
        match self {
            ValuePredicate::Any => true,
            ValuePredicate::AtLeast(threshold) => value >= *threshold,
            ValuePredicate::WithinLevels(levels) => levels.covers(value),
        }
    }
}

/// A grid point chosen for annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueLabel {
    pub row: usize,
    pub col: usize,
    pub value: f32,
}

/// Greedy row-major selection with a minimum spacing between labels.
///
/// Deterministic: identical inputs always give the same labels. Every
/// eligible point left out lies closer than `spacing` to a selected one.
/// The count only grows with density on uniformly eligible grids; on sparse
/// or masked fields a wider spacing can keep more labels.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueLabeler {
    pub predicate: ValuePredicate,
    /// Minimum distance between selected points, in grid cells
    pub spacing: f32,
}

impl ValueLabeler {
    pub fn with_spacing(predicate: ValuePredicate, spacing: f32) -> PlotResult<Self> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(PlotError::config(format!("invalid label spacing {}", spacing)));
        }
        Ok(Self { predicate, spacing })
    }

    /// Spacing derived from a target density in labels per grid cell area.
    pub fn with_density(predicate: ValuePredicate, labels_per_cell: f32) -> PlotResult<Self> {
        if !(labels_per_cell.is_finite() && labels_per_cell > 0.0) {
            return Err(PlotError::config(format!(
                "invalid label density {}",
                labels_per_cell
            )));
        }
        Self::with_spacing(predicate, 1.0 / labels_per_cell.sqrt())
    }

    pub fn select(&self, field: &GriddedField) -> Vec<ValueLabel> {
        let min_sq = (self.spacing as f64) * (self.spacing as f64);
        let bucket = (self.spacing.ceil() as usize).max(1);
        let mut buckets: HashMap<(usize, usize), Vec<(usize, usize)>> = HashMap::new();
        let mut selected = Vec::new();

        for row in 0..field.ny {
            for col in 0..field.nx {
                let value = field.get(row, col);
                if !self.predicate.matches(value) {
                    continue;
                }

                let (br, bc) = (row / bucket, col / bucket);
                let too_close = (br.saturating_sub(1)..=br + 1).any(|r| {
                    (bc.saturating_sub(1)..=bc + 1).any(|c| {
                        buckets.get(&(r, c)).is_some_and(|points| {
                            points.iter().any(|&(pr, pc)| {
                                let dr = pr.abs_diff(row) as f64;
                                let dc = pc.abs_diff(col) as f64;
                                dr * dr + dc * dc < min_sq
                            })
                        })
                    })
                });
                if too_close {
                    continue;
                }

                buckets.entry((br, bc)).or_default().push((row, col));
                selected.push(ValueLabel { row, col, value });
            }
        }

        selected
    }
}

/// Integer text used for value and extremum labels.
pub fn format_label(value: f32) -> String {
    // Adding 0.0 turns -0 into 0.
    format!("{:.0}", value.round() + 0.0)
}

/// Short text for a level boundary: whole numbers without decimals, others
/// with at most two.
pub fn format_tick(value: f32) -> String {
    if (value - value.round()).abs() < 1e-4 {
        return format_label(value);
    }
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
