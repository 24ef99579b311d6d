//! Forecast time helpers: lead hours and annotation labels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whole hours elapsed between the run start and a valid time.
pub fn lead_hours(run: DateTime<Utc>, valid: DateTime<Utc>) -> i64 {
    (valid - run).num_hours()
}

/// Valid time of a frame paired with the run it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastTime {
    /// Model run start
    pub run: DateTime<Utc>,
    /// Valid time of the frame
    pub valid: DateTime<Utc>,
}

impl ForecastTime {
    pub fn new(run: DateTime<Utc>, valid: DateTime<Utc>) -> Self {
        Self { run, valid }
    }

    pub fn lead_hours(&self) -> i64 {
        lead_hours(self.run, self.valid)
    }

    /// Label for the valid time, e.g. `Thu 18 Oct 2026 12 UTC`.
    pub fn valid_label(&self) -> String {
        self.valid.format("%a %d %b %Y %H UTC").to_string()
    }

    /// Label identifying the run, e.g. `Run: 2026101800`.
    pub fn run_label(&self) -> String {
        format!("Run: {}", self.run.format("%Y%m%d%H"))
    }
}
