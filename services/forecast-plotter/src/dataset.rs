//! Run input.
//!
//! Prepared runs arrive as JSON (see `TimeSeries`). For smoke testing a
//! synthetic run with every field the built-in products read can be
//! generated instead.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use frame_common::{CoordinateGrid, Frame, GriddedField, PlotError, PlotResult, TimeSeries};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

/// Read and validate a prepared run.
pub fn load_run(path: impl AsRef<Path>) -> PlotResult<TimeSeries> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .map_err(|e| PlotError::config(format!("cannot read run {}: {}", path.display(), e)))?;
    let series = TimeSeries::from_json(&json)?;
    info!(
        path = %path.display(),
        frames = series.len(),
        run = %series.run.format("%Y%m%d%H"),
        "loaded run"
    );
    Ok(series)
}

/// Fail with a configuration error when a field is absent from every frame.
pub fn require_fields(series: &TimeSeries, fields: &[&str]) -> PlotResult<()> {
    for name in fields {
        if !series.frames.iter().any(|f| f.fields.contains_key(*name)) {
            return Err(PlotError::config(format!("run has no field '{}'", name)));
        }
    }
    Ok(())
}

/// Parameters of a generated run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticRun {
    pub hours: i64,
    pub interval_hours: i64,
    pub nx: usize,
    pub ny: usize,
    pub seed: u64,
}

impl Default for SyntheticRun {
    fn default() -> Self {
        Self {
            hours: 48,
            interval_hours: 3,
            nx: 400,
            ny: 360,
            seed: 7,
        }
    }
}

/// A moving pressure centre.
struct Centre {
    row: f32,
    col: f32,
    d_row: f32,
    d_col: f32,
    sigma: f32,
    amplitude: f32,
}

impl Centre {
    fn value(&self, step: f32, row: usize, col: usize) -> f32 {
        let dr = row as f32 - (self.row + self.d_row * step);
        let dc = col as f32 - (self.col + self.d_col * step);
        self.amplitude * (-(dr * dr + dc * dc) / (2.0 * self.sigma * self.sigma)).exp()
    }
}

impl SyntheticRun {
    /// Generate the run. Grid spacing is 2.5 km.
    pub fn generate(&self, run: DateTime<Utc>) -> PlotResult<TimeSeries> {
        if self.hours < 0 || self.interval_hours <= 0 {
            return Err(PlotError::config(format!(
                "synthetic run needs hours >= 0 and a positive interval, got {} / {}",
                self.hours, self.interval_hours
            )));
        }

        let (nx, ny) = (self.nx, self.ny);
        let grid = CoordinateGrid::regular(nx, ny, 0.0, 2_500.0, 0.0, 2_500.0)?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let centres: Vec<Centre> = (0..4)
            .map(|i| Centre {
                row: rng.gen_range(0.0..ny as f32),
                col: rng.gen_range(0.0..nx as f32),
                d_row: rng.gen_range(-2.0..2.0),
                d_col: rng.gen_range(1.0..4.0),
                sigma: rng.gen_range(0.12..0.25) * nx.min(ny) as f32,
                amplitude: if i % 2 == 0 { -22.0 } else { 16.0 },
            })
            .collect();

        let steps = (self.hours / self.interval_hours) as usize + 1;
        let frames = (0..steps)
            .map(|step| {
                let t = step as f32;
                let valid = run + Duration::hours(step as i64 * self.interval_hours);
                let progress = step as f32 / steps.max(2) as f32;

                let prmsl = GriddedField::from_fn(nx, ny, |row, col| {
                    1013.0 + centres.iter().map(|c| c.value(t, row, col)).sum::<f32>()
                });
                let theta_e = GriddedField::from_fn(nx, ny, |row, col| {
                    let north = row as f32 / ny as f32;
                    let wave = ((col as f32 / nx as f32) * 6.0 + t * 0.3).sin();
                    10.0 + 45.0 * north + 8.0 * wave
                });
                let snow_limit = GriddedField::from_fn(nx, ny, |row, col| {
                    let wave = ((row as f32 / ny as f32) * 4.0 - t * 0.2).cos();
                    (300.0 + 2200.0 * col as f32 / nx as f32 + 300.0 * wave).max(0.0)
                });
                let rain = GriddedField::from_fn(nx, ny, |row, col| {
                    let low = -centres[0].value(t, row, col) / 22.0;
                    170.0 * progress * low
                });
                let snow = GriddedField::from_fn(nx, ny, |row, col| {
                    let cold = 1.0 - col as f32 / nx as f32;
                    let low = -centres[2].value(t, row, col) / 22.0;
                    (60.0 * progress * cold * low).max(0.0)
                });

                Frame::new(valid)
                    .with_field("prmsl", prmsl)
                    .with_field("theta_e", theta_e)
                    .with_field("snow_limit", snow_limit)
                    .with_field("rain_increment", rain)
                    .with_field("snow_increment", snow)
            })
            .collect();

        TimeSeries::new(run, grid, frames)
    }
}
