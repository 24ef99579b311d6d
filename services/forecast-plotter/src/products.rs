//! Map products.
//!
//! Two products are built in; configuration may add more or replace one by
//! reusing its variable name.

use std::collections::BTreeMap;

use frame_common::{PlotError, PlotResult};
use renderer::layout::{ContourLayer, ExtremaLayer, FillLayer, Layout, LevelSpec, ValueLayer};
use renderer::{Extend, ExtremumKind};

/// Seed of the randomized H/L tie-break.
const EXTREMA_SEED: u64 = 850;

/// Minimum distance between H/L markers, in grid cells.
const EXTREMA_SEPARATION: usize = 150;

/// Equivalent potential temperature at 850 hPa with sea-level pressure.
pub fn gph_thetae_850() -> Layout {
    let marker = |kind, symbol: &str, color: &str| ExtremaLayer {
        field: "prmsl".to_string(),
        kind,
        separation: EXTREMA_SEPARATION,
        symbol: symbol.to_string(),
        color: color.to_string(),
        seed: Some(EXTREMA_SEED),
    };

    Layout {
        variable_name: "gph_thetae_850".to_string(),
        description: "MSLP [hPa] and θe @850hPa [C]".to_string(),
        smoothing: BTreeMap::from([("prmsl".to_string(), 10)]),
        fills: vec![FillLayer {
            field: "theta_e".to_string(),
            scheme: "nipy_spectral".to_string(),
            levels: LevelSpec::Range { start: -10.0, stop: 80.0, step: 0.5 },
            extend: Extend::Both,
            opacity: 1.0,
            colorbar: Some("Temperature".to_string()),
        }],
        contours: vec![ContourLayer {
            field: "prmsl".to_string(),
            levels: LevelSpec::Interval { step: 4.0 },
            color: "white".to_string(),
            line_width: 1.0,
            chaikin_passes: 0,
            label_size: Some(6.0),
            label_spacing: 220.0,
        }],
        extrema: vec![
            marker(ExtremumKind::Max, "H", "royalblue"),
            marker(ExtremumKind::Min, "L", "coral"),
        ],
        values: vec![],
    }
}

/// New snow and accumulated rain since the start of the run.
pub fn winter() -> Layout {
    Layout {
        variable_name: "winter".to_string(),
        description: "New snow and accumulated rain (since run start)".to_string(),
        smoothing: BTreeMap::new(),
        fills: vec![
            FillLayer {
                field: "rain_increment".to_string(),
                scheme: "rain".to_string(),
                levels: LevelSpec::Explicit(vec![
                    10.0, 15.0, 25.0, 35.0, 50.0, 75.0, 100.0, 125.0, 150.0,
                ]),
                extend: Extend::Max,
                opacity: 0.5,
                colorbar: Some("Rain".to_string()),
            },
            FillLayer {
                field: "snow_increment".to_string(),
                scheme: "snow_wxcharts".to_string(),
                levels: LevelSpec::Explicit(vec![
                    0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 40.0, 50.0, 70.0,
                    90.0, 150.0,
                ]),
                extend: Extend::Max,
                opacity: 1.0,
                colorbar: Some("Snow".to_string()),
            },
        ],
        contours: vec![ContourLayer {
            field: "snow_limit".to_string(),
            levels: LevelSpec::Range { start: 0.0, stop: 3000.0, step: 500.0 },
            color: "red".to_string(),
            line_width: 0.5,
            chaikin_passes: 0,
            label_size: Some(5.0),
            label_spacing: 220.0,
        }],
        extrema: vec![],
        values: vec![ValueLayer {
            field: "snow_increment".to_string(),
            threshold: Some(1.0),
            spacing: 10.0,
            colored_by: Some("snow_increment".to_string()),
            font_size: 8.0,
        }],
    }
}

/// Products by variable name.
#[derive(Debug, Clone)]
pub struct ProductCatalog {
    products: BTreeMap<String, Layout>,
}

impl ProductCatalog {
    pub fn builtin() -> Self {
        let products = [gph_thetae_850(), winter()]
            .into_iter()
            .map(|layout| (layout.variable_name.clone(), layout))
            .collect();
        Self { products }
    }

    /// Add configured layouts; a layout with a built-in name replaces it.
    pub fn with_layouts(mut self, layouts: &[Layout]) -> Self {
        for layout in layouts {
            self.products.insert(layout.variable_name.clone(), layout.clone());
        }
        self
    }

    pub fn get(&self, name: &str) -> PlotResult<&Layout> {
        self.products.get(name).ok_or_else(|| {
            PlotError::config(format!(
                "unknown product '{}', available: {:?}",
                name,
                self.names()
            ))
        })
    }

    pub fn names(&self) -> Vec<&str> {
        self.products.keys().map(String::as_str).collect()
    }

    /// The named products, or all of them when `names` is empty.
    pub fn select(&self, names: &[String]) -> PlotResult<Vec<&Layout>> {
        if names.is_empty() {
            return Ok(self.products.values().collect());
        }
        names.iter().map(|name| self.get(name)).collect()
    }
}
