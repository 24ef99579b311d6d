//! Tests for the built-in products and whole-run plotting.

use std::collections::BTreeMap;

use forecast_plotter::products::{gph_thetae_850, winter};
use forecast_plotter::{plot_run, PlotterConfig, ProductCatalog, SyntheticRun};
use frame_common::PlotError;
use renderer::colormap::{Extend, SchemeRegistry};
use renderer::layout::{Layout, LevelSpec};
use test_utils::{output_dir, run_start, weather_series};

fn small_run() -> frame_common::TimeSeries {
    SyntheticRun {
        hours: 6,
        interval_hours: 3,
        nx: 60,
        ny: 50,
        seed: 3,
    }
    .generate(run_start())
    .unwrap()
}

fn config_for(dir: &std::path::Path) -> PlotterConfig {
    let yaml = format!(
        r#"
output_dir: {}
pool_size: 2
projections:
  de:
    subfolder: de
    width: 360
    height: 300
"#,
        dir.display()
    );
    PlotterConfig::from_yaml(&yaml).unwrap()
}

// ============================================================================
// Product layouts
// ============================================================================

#[test]
fn test_builtin_catalog() {
    let catalog = ProductCatalog::builtin();
    assert_eq!(catalog.names(), vec!["gph_thetae_850", "winter"]);
    assert_eq!(catalog.select(&[]).unwrap().len(), 2);
    assert!(matches!(
        catalog.select(&["radar".to_string()]),
        Err(PlotError::Config(_))
    ));
}

#[test]
fn test_gph_thetae_levels_resolve() {
    let series = small_run();
    let resolved = gph_thetae_850()
        .resolve(&SchemeRegistry::builtin(), |f| series.field_range(f))
        .unwrap();

    let fill = &resolved.fills[0];
    assert_eq!(fill.colormap.levels().len(), 180);
    assert_eq!(fill.colormap.levels().first(), -10.0);
    assert_eq!(fill.colormap.levels().last(), 79.5);

    // Pressure contours every 4 hPa from the truncated minimum
    let (lo, _) = series.field_range("prmsl").unwrap();
    let levels = &resolved.contours[0].levels;
    assert_eq!(levels[0], lo.trunc());
    assert!(levels.windows(2).all(|w| (w[1] - w[0] - 4.0).abs() < 1e-3));

    assert_eq!(resolved.extrema.len(), 2);
    assert_eq!(resolved.smoothing.get("prmsl"), Some(&10));
    assert_eq!(resolved.colorbars().count(), 1);
}

#[test]
fn test_winter_layout() {
    let layout = winter();
    assert_eq!(layout.fields(), vec!["rain_increment", "snow_increment", "snow_limit"]);
    assert!(layout.fills.iter().all(|f| f.extend == Extend::Max));
    assert_eq!(
        layout.contours[0].levels.resolve("snow_limit", None).unwrap(),
        vec![0.0, 500.0, 1000.0, 1500.0, 2000.0, 2500.0]
    );

    let resolved = layout.resolve(&SchemeRegistry::builtin(), |_| None).unwrap();
    let titles: Vec<&str> = resolved.colorbars().map(|(_, title)| title).collect();
    assert_eq!(titles, vec!["Rain", "Snow"]);
}

#[test]
fn test_configured_layout_replaces_builtin() {
    let mut custom: Layout = winter();
    custom.description = "Snow only".to_string();
    custom.fills.retain(|f| f.field == "snow_increment");
    custom.fills[0].levels = LevelSpec::Explicit(vec![1.0, 5.0, 10.0]);

    let catalog = ProductCatalog::builtin().with_layouts(&[custom]);
    let layout = catalog.get("winter").unwrap();
    assert_eq!(layout.description, "Snow only");
    assert_eq!(layout.fills.len(), 1);
    assert_eq!(catalog.names().len(), 2);
}

// ============================================================================
// Whole-run plotting
// ============================================================================

#[test]
fn test_plot_run_writes_every_product_frame() {
    let tmp = output_dir();
    let config = config_for(tmp.path());

    let runs = plot_run(&config, None, &small_run(), &[]).unwrap();

    assert_eq!(runs.len(), 2);
    for run in &runs {
        assert_eq!(run.failed_chunks(), 0, "{} failed", run.variable);
        assert_eq!(run.files_written(), 3);
        for lead in [0, 3, 6] {
            let path = tmp.path().join("de").join(format!("{}_{}.png", run.variable, lead));
            assert!(path.is_file(), "missing {}", path.display());
        }
    }
}

#[test]
fn test_plot_run_selected_product_only() {
    let tmp = output_dir();
    let config = config_for(tmp.path());

    let runs = plot_run(&config, Some("de"), &small_run(), &["winter".to_string()]).unwrap();

    assert_eq!(runs.len(), 1);
    assert!(tmp.path().join("de/winter_0.png").is_file());
    assert!(!tmp.path().join("de/gph_thetae_850_0.png").exists());
}

#[test]
fn test_plot_run_unknown_projection() {
    let tmp = output_dir();
    let config = config_for(tmp.path());

    let result = plot_run(&config, Some("mars"), &small_run(), &[]);
    assert!(matches!(result, Err(PlotError::Config(_))));
    assert!(!tmp.path().join("de").exists());
}

#[test]
fn test_plot_run_missing_field_is_config_error() {
    let tmp = output_dir();
    let config = config_for(tmp.path());

    let result = plot_run(&config, None, &weather_series(3, 20, 20), &[]);
    assert!(matches!(result, Err(PlotError::Config(_))));
    assert!(!tmp.path().join("de").exists());
}

#[test]
fn test_plot_run_with_configured_smoothing_override() {
    let tmp = output_dir();
    let mut config = config_for(tmp.path());
    let mut layout = gph_thetae_850();
    layout.variable_name = "mslp_only".to_string();
    layout.fills.clear();
    layout.smoothing = BTreeMap::from([("prmsl".to_string(), 2)]);
    config.products.push(layout);

    let runs = plot_run(&config, None, &small_run(), &["mslp_only".to_string()]).unwrap();
    assert_eq!(runs[0].files_written(), 3);
    assert!(tmp.path().join("de/mslp_only_6.png").is_file());
}
