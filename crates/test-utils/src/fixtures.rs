//! Ready-made runs and directories for tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use frame_common::{CoordinateGrid, Frame, GriddedField, TimeSeries};
use tempfile::TempDir;

use crate::generators::{pressure_field, ramp_field};

/// Run start shared by the fixtures: 2026-10-18 00 UTC.
pub fn run_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap()
}

/// Regular grid in metres, 10 km spacing, origin at (0, 0).
pub fn test_grid(nx: usize, ny: usize) -> CoordinateGrid {
    CoordinateGrid::regular(nx, ny, 0.0, 10_000.0, 0.0, 10_000.0).unwrap()
}

/// A run of `steps` frames every `interval_hours`, starting at lead 0. Each
/// frame's fields come from `fields(step)`.
pub fn series_with<F>(steps: usize, nx: usize, ny: usize, interval_hours: i64, fields: F) -> TimeSeries
where
    F: Fn(usize) -> Vec<(&'static str, GriddedField)>,
{
    let run = run_start();
    let frames = (0..steps)
        .map(|step| {
            let valid = run + Duration::hours(step as i64 * interval_hours);
            fields(step)
                .into_iter()
                .fold(Frame::new(valid), |frame, (name, field)| frame.with_field(name, field))
        })
        .collect();
    TimeSeries::new(run, test_grid(nx, ny), frames).unwrap()
}

/// A run carrying `temperature` (ramp) and `pressure` (moving high/low) fields.
pub fn weather_series(steps: usize, nx: usize, ny: usize) -> TimeSeries {
    series_with(steps, nx, ny, 3, |step| {
        vec![
            ("temperature", ramp_field(nx, ny, -5.0, 40.0 + step as f32)),
            ("pressure", pressure_field(nx, ny, step)),
        ]
    })
}

/// Fresh temporary directory for rendered output.
pub fn output_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}
