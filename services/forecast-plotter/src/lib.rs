//! Forecast map plotter.
//!
//! Renders one PNG per forecast step and product for a prepared run:
//! - `config`: plotter.yaml loading and validation
//! - `products`: the built-in map products
//! - `dataset`: run input and a synthetic run generator
//! - `driver`: chunked parallel rendering

pub mod config;
pub mod dataset;
pub mod driver;
pub mod products;

use frame_common::{PlotResult, TimeSeries};
use tracing::info;

pub use config::{PlotterConfig, ProjectionConfig};
pub use dataset::{load_run, SyntheticRun};
pub use driver::{ChunkReport, ChunkStatus, ChunkedParallelDriver};
pub use products::ProductCatalog;

/// Chunk reports of one product.
#[derive(Debug)]
pub struct ProductRun {
    pub variable: String,
    pub reports: Vec<ChunkReport>,
}

impl ProductRun {
    pub fn failed_chunks(&self) -> usize {
        self.reports.iter().filter(|r| !r.is_success()).count()
    }

    pub fn files_written(&self) -> usize {
        self.reports.iter().map(|r| r.files.len()).sum()
    }
}

/// Render `products` (all when empty) of `series` for one projection.
///
/// Projection, products and their layouts are all checked before the first
/// product is dispatched.
pub fn plot_run(
    config: &PlotterConfig,
    projection: Option<&str>,
    series: &TimeSeries,
    products: &[String],
) -> PlotResult<Vec<ProductRun>> {
    let projection_name = projection.unwrap_or(&config.default_projection);
    let projection = config.projection(projection_name)?;
    let registry = config.scheme_registry()?;
    let catalog = ProductCatalog::builtin().with_layouts(&config.products);
    let layouts = catalog.select(products)?;
    for layout in &layouts {
        dataset::require_fields(series, &layout.fields())?;
        layout.resolve(&registry, |field| series.field_range(field))?;
    }

    let driver = ChunkedParallelDriver::new(
        config.pool_size,
        config.chunk_size,
        projection.surface(),
        config.output_folder(projection),
    )?;
    info!(
        projection = projection_name,
        output = %driver.output_dir().display(),
        products = ?layouts.iter().map(|l| l.variable_name.as_str()).collect::<Vec<_>>(),
        "plotting run"
    );

    layouts
        .into_iter()
        .map(|layout| {
            let reports = driver.run(series.clone(), layout, &registry)?;
            Ok(ProductRun {
                variable: layout.variable_name.clone(),
                reports,
            })
        })
        .collect()
}
