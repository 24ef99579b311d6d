//! Tests for level sets, normalization and the scheme registry.

use frame_common::PlotError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use renderer::colormap::{arange, Bin, Color, Extend, LevelSet, Normalizer, SchemeDefinition, SchemeRegistry};

// ============================================================================
// LevelSet tests
// ============================================================================

#[test]
fn test_level_set_rejects_single_level() {
    assert!(matches!(LevelSet::new(vec![1.0]), Err(PlotError::Config(_))));
    assert!(matches!(LevelSet::new(vec![]), Err(PlotError::Config(_))));
}

#[test]
fn test_level_set_rejects_non_increasing() {
    assert!(matches!(LevelSet::new(vec![0.0, 1.0, 1.0]), Err(PlotError::Config(_))));
    assert!(matches!(LevelSet::new(vec![3.0, 2.0]), Err(PlotError::Config(_))));
    assert!(matches!(LevelSet::new(vec![0.0, f32::NAN, 2.0]), Err(PlotError::Config(_))));
}

#[test]
fn test_level_set_arange_excludes_stop() {
    let levels = LevelSet::arange(-10.0, 80.0, 0.5).unwrap();
    assert_eq!(levels.len(), 180);
    assert_eq!(levels.first(), -10.0);
    assert_eq!(levels.last(), 79.5);

    assert_eq!(arange(0.0, 3000.0, 500.0).unwrap(), vec![0.0, 500.0, 1000.0, 1500.0, 2000.0, 2500.0]);
    assert!(arange(5.0, 5.0, 1.0).unwrap().is_empty());
    assert!(matches!(arange(0.0, 1.0, 0.0), Err(PlotError::Config(_))));
}

// ============================================================================
// Normalizer tests
// ============================================================================

#[test]
fn test_normalizer_bins() {
    let norm = Normalizer::new(LevelSet::new(vec![0.0, 10.0, 20.0]).unwrap());
    assert_eq!(norm.bin(-0.1), Some(Bin::Under));
    assert_eq!(norm.bin(0.0), Some(Bin::Index(0)));
    assert_eq!(norm.bin(9.99), Some(Bin::Index(0)));
    assert_eq!(norm.bin(10.0), Some(Bin::Index(1)));
    assert_eq!(norm.bin(20.0), Some(Bin::Over));
    assert_eq!(norm.bin(f32::NAN), None);
}

#[test]
fn test_normalizer_strictly_increasing_on_levels() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let n = rng.gen_range(2..30);
        let mut value = rng.gen_range(-100.0f32..100.0);
        let levels: Vec<f32> = (0..n)
            .map(|_| {
                value += rng.gen_range(0.01f32..20.0);
                value
            })
            .collect();
        let norm = Normalizer::new(LevelSet::new(levels.clone()).unwrap());
        for pair in levels.windows(2) {
            assert!(
                norm.position(pair[0]) < norm.position(pair[1]),
                "position not increasing between {} and {}",
                pair[0],
                pair[1]
            );
        }
    }
}

#[test]
fn test_normalizer_position_is_piecewise_linear() {
    let norm = Normalizer::new(LevelSet::new(vec![0.0, 10.0, 100.0]).unwrap());
    assert_eq!(norm.position(0.0), 0.0);
    assert!((norm.position(5.0) - 0.25).abs() < 1e-6);
    assert!((norm.position(55.0) - 0.75).abs() < 1e-6);
    assert_eq!(norm.position(1000.0), 1.0);
}

// ============================================================================
// LevelColormap tests
// ============================================================================

#[test]
fn test_colormap_one_color_per_bin() {
    let registry = SchemeRegistry::builtin();
    let cmap = registry
        .colormap("snow_wxcharts", &[0.25, 0.5, 1.0, 2.5, 5.0], Extend::Max)
        .unwrap();
    assert_eq!(cmap.table.colors.len(), 4);
    assert_eq!(cmap.color(0.3), Some(cmap.table.colors[0]));
    assert_eq!(cmap.color(1.0), Some(cmap.table.colors[2]));
}

#[test]
fn test_colormap_under_over_colors() {
    let registry = SchemeRegistry::builtin();
    let cmap = registry.colormap("nipy_spectral", &[0.0, 1.0, 2.0], Extend::Both).unwrap();
    assert_eq!(cmap.color(-5.0), Some(Color::rgb(0, 0, 0)));
    assert_eq!(cmap.color(2.0), Some(Color::from_hex("#CCCCCC").unwrap()));
    assert_eq!(cmap.color(f32::NAN), None);
}

#[test]
fn test_colormap_clips_without_scheme_under_color() {
    let registry = SchemeRegistry::builtin();
    let cmap = registry.colormap("rain", &[10.0, 15.0, 25.0], Extend::Both).unwrap();
    assert_eq!(cmap.color(1.0), Some(cmap.table.colors[0]));
}

#[test]
fn test_colormap_leaves_unextended_sides_blank() {
    let registry = SchemeRegistry::builtin();
    let cmap = registry.colormap("rain", &[10.0, 15.0, 25.0], Extend::Max).unwrap();
    assert_eq!(cmap.color(5.0), None);
    assert!(cmap.color(30.0).is_some());

    let (under, over) = cmap.extension_colors();
    assert!(under.is_none());
    assert!(over.is_some());
}

#[test]
fn test_colormap_invalid_levels_is_config_error() {
    let registry = SchemeRegistry::builtin();
    let result = registry.colormap("rain", &[10.0], Extend::Neither);
    assert!(matches!(result, Err(PlotError::Config(_))));
    let result = registry.colormap("rain", &[10.0, 5.0], Extend::Neither);
    assert!(matches!(result, Err(PlotError::Config(_))));
}

// ============================================================================
// SchemeRegistry tests
// ============================================================================

#[test]
fn test_registry_unknown_scheme() {
    let registry = SchemeRegistry::builtin();
    let result = registry.colormap("viridis_but_not_really", &[0.0, 1.0], Extend::Neither);
    assert!(matches!(result, Err(PlotError::Config(_))));
}

#[test]
fn test_registry_builtin_names() {
    let registry = SchemeRegistry::builtin();
    assert_eq!(registry.names(), vec!["nipy_spectral", "rain", "snow_wxcharts", "temperature"]);
}

#[test]
fn test_registry_custom_definition() {
    let def = SchemeDefinition {
        name: "mono".to_string(),
        stops: vec!["#000000".to_string(), "#FFFFFF".to_string()],
        under: None,
        over: Some("#FF0000".to_string()),
    };
    let registry = SchemeRegistry::builtin().with_definitions(&[def]).unwrap();
    let cmap = registry.colormap("mono", &[0.0, 1.0, 2.0], Extend::Max).unwrap();
    assert_eq!(cmap.table.colors, vec![Color::rgb(0, 0, 0), Color::rgb(255, 255, 255)]);
    assert_eq!(cmap.color(3.0), Some(Color::rgb(255, 0, 0)));
}

#[test]
fn test_registry_rejects_bad_hex() {
    let def = SchemeDefinition {
        name: "broken".to_string(),
        stops: vec!["#000000".to_string(), "not-a-color".to_string()],
        under: None,
        over: None,
    };
    let result = SchemeRegistry::builtin().with_definitions(&[def]);
    assert!(matches!(result, Err(PlotError::Config(_))));
}

#[test]
fn test_hex_with_multibyte_characters_is_rejected() {
    // Six bytes long, but not six hex digits
    assert_eq!(Color::from_hex("#a€bc"), None);
    assert_eq!(Color::from_hex("ééé"), None);
    assert_eq!(Color::parse("a€bc"), None);

    let def = SchemeDefinition {
        name: "unicode".to_string(),
        stops: vec!["#000000".to_string(), "#a€bc".to_string()],
        under: None,
        over: None,
    };
    let result = SchemeRegistry::builtin().with_definitions(&[def]);
    assert!(matches!(result, Err(PlotError::Config(_))));
}
