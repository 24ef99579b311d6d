//! Tests for the FrameRenderer artifact lifecycle.

use std::collections::BTreeMap;
use std::sync::Arc;

use frame_common::{Frame, GriddedField, PlotError, TimeSeries};
use renderer::canvas::ArtifactKind;
use renderer::colormap::{Extend, SchemeRegistry};
use renderer::extrema::ExtremumKind;
use renderer::layout::{ContourLayer, ExtremaLayer, FillLayer, Layout, LevelSpec, ResolvedLayout, ValueLayer};
use renderer::{DrawnArtifactSet, FrameRenderer, SurfaceSpec, SurfaceState};
use test_utils::{output_dir, weather_series};

const SURFACE: SurfaceSpec = SurfaceSpec {
    width: 320,
    height: 260,
    extent: None,
    axis_labels: false,
};

fn fill_layer() -> FillLayer {
    FillLayer {
        field: "temperature".to_string(),
        scheme: "temperature".to_string(),
        levels: LevelSpec::Range { start: -10.0, stop: 50.0, step: 5.0 },
        extend: Extend::Both,
        opacity: 1.0,
        colorbar: Some("Temperature".to_string()),
    }
}

fn contour_layer(label_size: Option<f32>) -> ContourLayer {
    ContourLayer {
        field: "pressure".to_string(),
        levels: LevelSpec::Interval { step: 4.0 },
        color: "white".to_string(),
        line_width: 1.0,
        chaikin_passes: 1,
        label_size,
        label_spacing: 120.0,
    }
}

fn full_layout() -> Layout {
    let marker = |kind, symbol: &str, color: &str| ExtremaLayer {
        field: "pressure".to_string(),
        kind,
        separation: 5,
        symbol: symbol.to_string(),
        color: color.to_string(),
        seed: Some(1),
    };
    Layout {
        variable_name: "test_product".to_string(),
        description: "Temperature and MSLP".to_string(),
        smoothing: BTreeMap::from([("pressure".to_string(), 2)]),
        fills: vec![fill_layer()],
        contours: vec![contour_layer(Some(8.0))],
        extrema: vec![
            marker(ExtremumKind::Max, "H", "royalblue"),
            marker(ExtremumKind::Min, "L", "coral"),
        ],
        values: vec![ValueLayer {
            field: "temperature".to_string(),
            threshold: Some(30.0),
            spacing: 8.0,
            colored_by: Some("temperature".to_string()),
            font_size: 7.0,
        }],
    }
}

/// One fill, unlabelled contours and the three annotations: five artifacts per frame.
fn five_artifact_layout() -> Layout {
    Layout {
        variable_name: "five".to_string(),
        description: "Five artifacts".to_string(),
        smoothing: BTreeMap::new(),
        fills: vec![fill_layer()],
        contours: vec![contour_layer(None)],
        extrema: vec![],
        values: vec![],
    }
}

fn resolve(layout: &Layout, series: &TimeSeries) -> Arc<ResolvedLayout> {
    let resolved = layout
        .resolve(&SchemeRegistry::builtin(), |name| series.field_range(name))
        .unwrap();
    Arc::new(resolved)
}

fn renderer_for(layout: &Layout, series: &TimeSeries) -> FrameRenderer {
    FrameRenderer::new(resolve(layout, series), Arc::new(series.grid.clone()), SURFACE).unwrap()
}

fn time_of(series: &TimeSeries, i: usize) -> frame_common::ForecastTime {
    frame_common::ForecastTime::new(series.run, series.frames[i].valid_time)
}

// ============================================================================
// State machine tests
// ============================================================================

#[test]
fn test_new_renderer_is_empty() {
    let series = weather_series(2, 40, 30);
    let renderer = renderer_for(&full_layout(), &series);
    assert_eq!(renderer.state(), SurfaceState::Empty);
    assert_eq!(renderer.canvas().artifact_count(), 0);
}

#[test]
fn test_decorate_is_idempotent() {
    let series = weather_series(1, 40, 30);
    let mut renderer = renderer_for(&full_layout(), &series);
    renderer.decorate().unwrap();
    renderer.decorate().unwrap();
    assert_eq!(renderer.state(), SurfaceState::Decorated);
    assert_eq!(renderer.canvas().persistent_count(), 1);
    assert_eq!(renderer.canvas().count_of(ArtifactKind::Colorbar), 1);
}

#[test]
fn test_axis_labels_are_persistent_decoration() {
    let series = weather_series(2, 40, 30);
    let surface = SurfaceSpec {
        axis_labels: true,
        ..SURFACE
    };
    let mut renderer =
        FrameRenderer::new(resolve(&full_layout(), &series), Arc::new(series.grid.clone()), surface).unwrap();
    renderer.decorate().unwrap();

    assert_eq!(renderer.canvas().persistent_count(), 2);
    assert_eq!(renderer.canvas().count_of(ArtifactKind::Annotation), 1);
    let edge = renderer
        .canvas()
        .artifacts()
        .iter()
        .find(|a| a.kind == ArtifactKind::Annotation)
        .unwrap();
    assert!(edge.persistent);
    assert_eq!(edge.primitives.len(), 6);

    renderer.render_frame(&series.frames[0], time_of(&series, 0)).unwrap();
    renderer.clear_frame();
    renderer.render_frame(&series.frames[1], time_of(&series, 1)).unwrap();
    renderer.clear_frame();
    assert_eq!(renderer.canvas().artifact_count(), 2);
}

#[test]
fn test_render_export_clear_cycle() {
    let series = weather_series(1, 40, 30);
    let mut renderer = renderer_for(&full_layout(), &series);
    let dir = output_dir();

    let drawn = renderer.render_frame(&series.frames[0], time_of(&series, 0)).unwrap();
    assert_eq!(renderer.state(), SurfaceState::Rendering);
    let baseline = renderer.canvas().persistent_count();
    assert_eq!(renderer.canvas().artifact_count(), baseline + drawn.len());
    assert_eq!(renderer.canvas().count_of(ArtifactKind::Annotation), 3);
    assert_eq!(renderer.canvas().count_of(ArtifactKind::ExtremaMarkers), 2);
    assert_eq!(renderer.canvas().count_of(ArtifactKind::FilledContour), 1);

    let path = dir.path().join("test_product_0.png");
    renderer.export(&path).unwrap();
    assert_eq!(renderer.state(), SurfaceState::FrameReady);
    assert!(path.exists());

    assert_eq!(renderer.clear_frame(), drawn.len());
    assert_eq!(renderer.state(), SurfaceState::Decorated);
    assert_eq!(renderer.canvas().artifact_count(), baseline);
}

#[test]
fn test_two_frames_return_to_same_baseline() {
    let series = weather_series(2, 40, 30);
    let mut renderer = renderer_for(&five_artifact_layout(), &series);
    let dir = output_dir();

    let first = renderer.render_frame(&series.frames[0], time_of(&series, 0)).unwrap();
    assert_eq!(first.len(), 5);
    renderer.export(&dir.path().join("five_0.png")).unwrap();
    renderer.clear_frame();
    let after_first = renderer.canvas().artifact_count();

    let second = renderer.render_frame(&series.frames[1], time_of(&series, 1)).unwrap();
    assert_eq!(second.len(), 5);
    assert!(first.ids().iter().all(|id| !renderer.canvas().contains(*id)));
    renderer.export(&dir.path().join("five_3.png")).unwrap();
    renderer.clear_frame();

    assert_eq!(renderer.canvas().artifact_count(), after_first);
    assert_eq!(after_first, renderer.canvas().persistent_count());
}

#[test]
fn test_render_clears_previous_frame_implicitly() {
    let series = weather_series(3, 40, 30);
    let mut renderer = renderer_for(&full_layout(), &series);
    let dir = output_dir();

    let mut previous: Option<DrawnArtifactSet> = None;
    for i in 0..3 {
        let drawn = renderer.render_frame(&series.frames[i], time_of(&series, i)).unwrap();
        if let Some(prev) = previous.take() {
            assert!(prev.ids().iter().all(|id| !renderer.canvas().contains(*id)));
        }
        renderer.export(&dir.path().join(format!("frame_{}.png", i))).unwrap();
        assert_eq!(
            renderer.canvas().artifact_count(),
            renderer.canvas().persistent_count() + drawn.len()
        );
        previous = Some(drawn);
    }
    // Colorbar drawn once for the whole run.
    assert_eq!(renderer.canvas().count_of(ArtifactKind::Colorbar), 1);
}

#[test]
fn test_export_requires_rendered_frame() {
    let series = weather_series(1, 40, 30);
    let mut renderer = renderer_for(&full_layout(), &series);
    let dir = output_dir();
    let result = renderer.export(&dir.path().join("nothing.png"));
    assert!(matches!(result, Err(PlotError::Render(_))));
}

#[test]
fn test_exported_image_has_surface_size() {
    let series = weather_series(1, 40, 30);
    let mut renderer = renderer_for(&full_layout(), &series);
    let dir = output_dir();
    let path = dir.path().join("sized.png");
    renderer.render_frame(&series.frames[0], time_of(&series, 0)).unwrap();
    renderer.export(&path).unwrap();
    let image = image::open(&path).unwrap();
    assert_eq!((image.width(), image.height()), (SURFACE.width, SURFACE.height));
}

// ============================================================================
// Error tests
// ============================================================================

fn frame_with(series: &TimeSeries, temperature: GriddedField) -> Frame {
    let mut frame = series.frames[0].clone();
    frame.fields.insert("temperature".to_string(), temperature);
    frame
}

#[test]
fn test_missing_field_is_render_error_and_leaves_baseline() {
    let series = weather_series(1, 40, 30);
    let mut renderer = renderer_for(&full_layout(), &series);
    let mut frame = series.frames[0].clone();
    frame.fields.remove("pressure");

    let result = renderer.render_frame(&frame, time_of(&series, 0));
    assert!(matches!(result, Err(PlotError::Render(_))));
    assert_eq!(renderer.state(), SurfaceState::Decorated);
    assert_eq!(renderer.canvas().artifact_count(), renderer.canvas().persistent_count());
}

#[test]
fn test_all_missing_field_is_render_error() {
    let series = weather_series(1, 40, 30);
    let mut renderer = renderer_for(&full_layout(), &series);
    let frame = frame_with(&series, GriddedField::filled(40, 30, f32::NAN));
    let result = renderer.render_frame(&frame, time_of(&series, 0));
    assert!(matches!(result, Err(PlotError::Render(_))));
}

#[test]
fn test_wrong_shape_field_is_render_error() {
    let series = weather_series(1, 40, 30);
    let mut renderer = renderer_for(&full_layout(), &series);
    let frame = frame_with(&series, GriddedField::filled(10, 10, 20.0));
    let result = renderer.render_frame(&frame, time_of(&series, 0));
    assert!(matches!(result, Err(PlotError::Render(_))));
}

#[test]
fn test_export_to_missing_directory_is_export_error() {
    let series = weather_series(1, 40, 30);
    let mut renderer = renderer_for(&full_layout(), &series);
    let dir = output_dir();
    renderer.render_frame(&series.frames[0], time_of(&series, 0)).unwrap();
    let result = renderer.export(&dir.path().join("no_such_dir").join("x.png"));
    assert!(matches!(result, Err(PlotError::Export { .. })));
}
