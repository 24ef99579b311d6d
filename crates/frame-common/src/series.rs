//! Forecast time series and their partition into worker chunks.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PlotError, PlotResult};
use crate::grid::{CoordinateGrid, GriddedField};
use crate::time::{lead_hours, ForecastTime};

/// All fields valid at one forecast time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub valid_time: DateTime<Utc>,
    pub fields: BTreeMap<String, GriddedField>,
}

impl Frame {
    pub fn new(valid_time: DateTime<Utc>) -> Self {
        Self {
            valid_time,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, field: GriddedField) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Look up a field, failing the frame if it is missing.
    pub fn field(&self, name: &str) -> PlotResult<&GriddedField> {
        self.fields.get(name).ok_or_else(|| {
            PlotError::render(format!(
                "field '{}' missing at {}",
                name,
                self.valid_time.to_rfc3339()
            ))
        })
    }
}

/// One forecast run: a shared grid plus frames in increasing time order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub run: DateTime<Utc>,
    pub grid: CoordinateGrid,
    pub frames: Vec<Frame>,
}

impl TimeSeries {
    pub fn new(run: DateTime<Utc>, grid: CoordinateGrid, frames: Vec<Frame>) -> PlotResult<Self> {
        let series = Self { run, grid, frames };
        series.validate()?;
        Ok(series)
    }

    pub fn from_json(json: &str) -> PlotResult<Self> {
        let series: TimeSeries = serde_json::from_str(json)?;
        series.validate()?;
        Ok(series)
    }

    pub fn to_json(&self) -> PlotResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Check time ordering, that every frame gets its own lead hour and that
    /// every field matches the grid shape.
    pub fn validate(&self) -> PlotResult<()> {
        self.grid.validate()?;

        if let Some(first) = self.frames.first() {
            if first.valid_time < self.run {
                return Err(PlotError::config(format!(
                    "valid time {} is before the run start {}",
                    first.valid_time.to_rfc3339(),
                    self.run.to_rfc3339()
                )));
            }
        }

        for pair in self.frames.windows(2) {
            if pair[1].valid_time <= pair[0].valid_time {
                return Err(PlotError::config(format!(
                    "valid times not strictly increasing: {} then {}",
                    pair[0].valid_time.to_rfc3339(),
                    pair[1].valid_time.to_rfc3339()
                )));
            }
            // Lead hours name the output files.
            let lead = lead_hours(self.run, pair[1].valid_time);
            if lead == lead_hours(self.run, pair[0].valid_time) {
                return Err(PlotError::config(format!(
                    "valid times {} and {} share lead hour {}",
                    pair[0].valid_time.to_rfc3339(),
                    pair[1].valid_time.to_rfc3339(),
                    lead
                )));
            }
        }

        for frame in &self.frames {
            for (name, field) in &frame.fields {
                if field.data.len() != field.nx * field.ny {
                    return Err(PlotError::config(format!(
                        "field '{}' at {} has {} values for {}x{}",
                        name,
                        frame.valid_time.to_rfc3339(),
                        field.data.len(),
                        field.nx,
                        field.ny
                    )));
                }
                if !field.has_shape_of(&self.grid) {
                    return Err(PlotError::config(format!(
                        "field '{}' at {} is {}x{}, grid is {}x{}",
                        name,
                        frame.valid_time.to_rfc3339(),
                        field.nx,
                        field.ny,
                        self.grid.nx(),
                        self.grid.ny()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Value range of a named field over the whole run.
    pub fn field_range(&self, name: &str) -> Option<(f32, f32)> {
        self.frames
            .iter()
            .filter_map(|f| f.fields.get(name))
            .filter_map(GriddedField::min_max)
            .fold(None, |acc, (lo, hi)| match acc {
                None => Some((lo, hi)),
                Some((a, b)) => Some((a.min(lo), b.max(hi))),
            })
    }

    /// Split the run into owned, contiguous chunks of at most `chunk_size` frames.
    pub fn into_chunks(self, chunk_size: usize) -> PlotResult<Vec<Chunk>> {
        let ranges = partition(self.frames.len(), chunk_size)?;
        let grid = Arc::new(self.grid);
        let mut frames = self.frames.into_iter();

        Ok(ranges
            .into_iter()
            .enumerate()
            .map(|(index, range)| Chunk {
                index,
                frames: frames.by_ref().take(range.len()).collect(),
                range,
                run: self.run,
                grid: Arc::clone(&grid),
            })
            .collect())
    }
}

/// Contiguous, ordered, non-overlapping ranges covering `0..len`.
pub fn partition(len: usize, chunk_size: usize) -> PlotResult<Vec<Range<usize>>> {
    if chunk_size == 0 {
        return Err(PlotError::config("chunk size must be at least 1"));
    }
    Ok((0..len)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(len))
        .collect())
}

/// Chunk size that spreads `len` frames evenly over `workers` workers.
pub fn balanced_chunk_size(len: usize, workers: usize) -> usize {
    let workers = workers.max(1);
    ((len + workers - 1) / workers).max(1)
}

/// A worker's share of the run. Owned outright by that worker.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub index: usize,
    /// Position of the chunk within the full series
    pub range: Range<usize>,
    pub run: DateTime<Utc>,
    pub grid: Arc<CoordinateGrid>,
    pub frames: Vec<Frame>,
}

impl Chunk {
    pub fn forecast_time(&self, frame: &Frame) -> ForecastTime {
        ForecastTime::new(self.run, frame.valid_time)
    }
}
