//! Common types shared by the forecast map renderer and its driver.

pub mod error;
pub mod grid;
pub mod series;
pub mod time;

pub use error::{PlotError, PlotResult};
pub use grid::{CoordinateGrid, GriddedField};
pub use series::{balanced_chunk_size, partition, Chunk, Frame, TimeSeries};
pub use time::{lead_hours, ForecastTime};
