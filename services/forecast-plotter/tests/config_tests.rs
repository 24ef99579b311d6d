//! Tests for plotter configuration loading.

use std::path::PathBuf;

use forecast_plotter::PlotterConfig;
use frame_common::PlotError;

const CONFIG_YAML: &str = r##"
output_dir: /tmp/plots
pool_size: 3
chunk_size: 8
projections:
  de:
    subfolder: images_de
  it:
    subfolder: images_it
    width: 640
    height: 480
    extent: [0, 0, 100000, 80000]
    labels: true
schemes:
  - name: greys
    stops: ["#FFFFFF", "#000000"]
"##;

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_with_defaults() {
    let config = PlotterConfig::from_yaml(CONFIG_YAML).unwrap();

    assert_eq!(config.output_dir, PathBuf::from("/tmp/plots"));
    assert_eq!(config.default_projection, "de");
    assert_eq!(config.pool_size, 3);
    assert_eq!(config.chunk_size, Some(8));

    let de = config.projection("de").unwrap();
    assert_eq!((de.width, de.height), (900, 760));
    assert_eq!(de.extent, None);
    assert!(!de.labels);
    assert_eq!(config.output_folder(de), PathBuf::from("/tmp/plots/images_de"));
}

#[test]
fn test_projection_surface() {
    let config = PlotterConfig::from_yaml(CONFIG_YAML).unwrap();
    let surface = config.projection("it").unwrap().surface();

    assert_eq!(surface.width, 640);
    assert_eq!(surface.height, 480);
    assert_eq!(surface.extent, Some((0.0, 0.0, 100_000.0, 80_000.0)));
    assert!(surface.axis_labels);
    assert!(!config.projection("de").unwrap().surface().axis_labels);
}

#[test]
fn test_shipped_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/plotter.yaml");
    let config = PlotterConfig::load(path).unwrap();

    assert_eq!(config.default_projection, "de");
    assert!(config.projection("de").is_ok());
    assert!(config.scheme_registry().is_ok());
}

#[test]
fn test_env_default_in_config() {
    let yaml = CONFIG_YAML.replace("/tmp/plots", "${PLOTTER_TEST_UNSET_DIR:-/srv/plots}");
    let config = PlotterConfig::from_yaml(&yaml).unwrap();
    assert_eq!(config.output_dir, PathBuf::from("/srv/plots"));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_unknown_projection_is_config_error() {
    let config = PlotterConfig::from_yaml(CONFIG_YAML).unwrap();
    assert!(matches!(config.projection("us"), Err(PlotError::Config(_))));
}

#[test]
fn test_unknown_default_projection_rejected() {
    let yaml = format!("{}\ndefault_projection: us\n", CONFIG_YAML);
    assert!(matches!(PlotterConfig::from_yaml(&yaml), Err(PlotError::Config(_))));
}

#[test]
fn test_zero_pool_size_rejected() {
    let yaml = CONFIG_YAML.replace("pool_size: 3", "pool_size: 0");
    assert!(matches!(PlotterConfig::from_yaml(&yaml), Err(PlotError::Config(_))));
}

#[test]
fn test_malformed_yaml_is_config_error() {
    assert!(matches!(
        PlotterConfig::from_yaml("projections: [unclosed"),
        Err(PlotError::Config(_))
    ));
}

#[test]
fn test_missing_file_is_config_error() {
    let result = PlotterConfig::load("/nonexistent/plotter.yaml");
    assert!(matches!(result, Err(PlotError::Config(_))));
}

#[test]
fn test_overrides_applied_and_validated() {
    let config = PlotterConfig::from_yaml(CONFIG_YAML).unwrap();

    let overridden = config.clone().with_overrides(Some(6), Some(2)).unwrap();
    assert_eq!(overridden.pool_size, 6);
    assert_eq!(overridden.chunk_size, Some(2));

    let kept = config.clone().with_overrides(None, None).unwrap();
    assert_eq!(kept.chunk_size, Some(8));

    assert!(config.with_overrides(Some(0), None).is_err());
}

// ============================================================================
// Schemes
// ============================================================================

#[test]
fn test_configured_scheme_joins_builtins() {
    let config = PlotterConfig::from_yaml(CONFIG_YAML).unwrap();
    let registry = config.scheme_registry().unwrap();

    assert!(registry.get("greys").is_ok());
    assert!(registry.get("nipy_spectral").is_ok());
}

#[test]
fn test_bad_scheme_color_is_config_error() {
    let yaml = CONFIG_YAML.replace("#000000", "not-a-color");
    let config = PlotterConfig::from_yaml(&yaml).unwrap();
    assert!(matches!(config.scheme_registry(), Err(PlotError::Config(_))));
}
