//! Tests for the retained-mode canvas.

use frame_common::PlotError;
use renderer::canvas::{ArtifactKind, Canvas, FigureLayout, Primitive, TextSpec};
use renderer::colormap::Color;
use test_utils::output_dir;

fn canvas(width: u32, height: u32) -> Canvas {
    Canvas::new(FigureLayout::new(width, height, false).unwrap())
}

fn rect(x: f32, y: f32, size: f32, fill: Color) -> Primitive {
    Primitive::Rect {
        x,
        y,
        width: size,
        height: size,
        fill,
        outline: None,
    }
}

fn rgb_at(canvas: &Canvas, x: u32, y: u32) -> (u8, u8, u8) {
    let pixmap = canvas.rasterize().unwrap();
    let c = pixmap.pixel(x, y).unwrap().demultiply();
    (c.red(), c.green(), c.blue())
}

// ============================================================================
// Artifact bookkeeping tests
// ============================================================================

#[test]
fn test_add_and_remove_artifacts() {
    let mut canvas = canvas(100, 100);
    let bar = canvas.add(ArtifactKind::Colorbar, true, false, vec![]);
    let a = canvas.add(ArtifactKind::FilledContour, false, true, vec![]);
    let b = canvas.add(ArtifactKind::Annotation, false, false, vec![]);
    assert_eq!(canvas.artifact_count(), 3);
    assert_eq!(canvas.persistent_count(), 1);
    assert_ne!(a, b);

    assert_eq!(canvas.remove(&[a, b]), 2);
    assert_eq!(canvas.artifact_count(), 1);
    assert!(canvas.contains(bar));
    assert!(!canvas.contains(a));

    // Already gone.
    assert_eq!(canvas.remove(&[a]), 0);
}

#[test]
fn test_ids_are_never_reused() {
    let mut canvas = canvas(100, 100);
    let first = canvas.add(ArtifactKind::ValueLabels, false, true, vec![]);
    canvas.remove(&[first]);
    let second = canvas.add(ArtifactKind::ValueLabels, false, true, vec![]);
    assert_ne!(first, second);
}

#[test]
fn test_count_of_kind() {
    let mut canvas = canvas(100, 100);
    for _ in 0..3 {
        canvas.add(ArtifactKind::Annotation, false, false, vec![]);
    }
    canvas.add(ArtifactKind::ContourLines, false, true, vec![]);
    assert_eq!(canvas.count_of(ArtifactKind::Annotation), 3);
    assert_eq!(canvas.count_of(ArtifactKind::ExtremaMarkers), 0);
}

// ============================================================================
// Rasterization tests
// ============================================================================

#[test]
fn test_background_is_white() {
    assert_eq!(rgb_at(&canvas(50, 50), 0, 0), (255, 255, 255));
}

#[test]
fn test_rect_is_painted() {
    let mut canvas = canvas(100, 100);
    canvas.add(ArtifactKind::Annotation, false, false, vec![rect(20.0, 20.0, 20.0, Color::rgb(255, 0, 0))]);
    assert_eq!(rgb_at(&canvas, 30, 30), (255, 0, 0));
    assert_eq!(rgb_at(&canvas, 60, 60), (255, 255, 255));
}

#[test]
fn test_clipped_artifact_stays_inside_plot() {
    let mut canvas = canvas(100, 100);
    canvas.add(ArtifactKind::FilledContour, false, true, vec![rect(0.0, 0.0, 30.0, Color::rgb(0, 0, 255))]);
    // Margin pixel stays white; plot pixel is painted.
    assert_eq!(rgb_at(&canvas, 4, 4), (255, 255, 255));
    assert_eq!(rgb_at(&canvas, 20, 20), (0, 0, 255));
}

#[test]
fn test_later_artifacts_paint_over_earlier() {
    let mut canvas = canvas(100, 100);
    canvas.add(ArtifactKind::FilledContour, false, true, vec![rect(20.0, 20.0, 40.0, Color::rgb(0, 255, 0))]);
    canvas.add(ArtifactKind::ValueLabels, false, true, vec![rect(30.0, 30.0, 10.0, Color::rgb(0, 0, 0))]);
    assert_eq!(rgb_at(&canvas, 35, 35), (0, 0, 0));
    assert_eq!(rgb_at(&canvas, 25, 25), (0, 255, 0));
}

#[test]
fn test_raster_layer_opacity() {
    let mut canvas = canvas(100, 100);
    let (w, h) = (10u32, 10u32);
    let rgba = [255u8, 0, 0, 255].repeat((w * h) as usize);
    canvas.add(
        ArtifactKind::FilledContour,
        false,
        true,
        vec![Primitive::Raster {
            left: 20,
            top: 20,
            width: w,
            height: h,
            rgba,
            opacity: 0.5,
        }],
    );
    let (r, g, b) = rgb_at(&canvas, 25, 25);
    assert_eq!(r, 255);
    assert!((g as i32 - 128).abs() <= 2, "green {}", g);
    assert!((b as i32 - 128).abs() <= 2, "blue {}", b);
}

#[test]
fn test_removed_artifact_not_painted() {
    let mut canvas = canvas(100, 100);
    let id = canvas.add(ArtifactKind::Annotation, false, false, vec![rect(20.0, 20.0, 20.0, Color::BLACK)]);
    canvas.remove(&[id]);
    assert_eq!(rgb_at(&canvas, 30, 30), (255, 255, 255));
}

#[test]
fn test_text_draws_ink() {
    let mut canvas = canvas(120, 60);
    canvas.add(
        ArtifactKind::Annotation,
        false,
        false,
        vec![Primitive::Text(TextSpec::new(20.0, 20.0, "HL 1013", 16.0, Color::BLACK).bold())],
    );
    let pixmap = canvas.rasterize().unwrap();
    let dark = pixmap.pixels().iter().filter(|p| p.demultiply().red() < 128).count();
    assert!(dark > 20);
}

// ============================================================================
// Layout and export tests
// ============================================================================

#[test]
fn test_figure_layout_reserves_colorbar_strip() {
    let plain = FigureLayout::new(400, 300, false).unwrap();
    let with_bars = FigureLayout::new(400, 300, true).unwrap();
    assert!(plain.colorbar_strip.is_none());
    let strip = with_bars.colorbar_strip.unwrap();
    assert!(with_bars.plot.height < plain.plot.height);
    assert_eq!(strip.top, with_bars.plot.bottom());
}

#[test]
fn test_figure_too_small() {
    assert!(matches!(FigureLayout::new(30, 30, true), Err(PlotError::Config(_))));
}

#[test]
fn test_export_writes_png() {
    let dir = output_dir();
    let path = dir.path().join("frame.png");
    let mut canvas = canvas(80, 60);
    canvas.add(ArtifactKind::Annotation, false, false, vec![rect(20.0, 20.0, 10.0, Color::rgb(255, 0, 0))]);
    canvas.export(&path).unwrap();

    let image = image::open(&path).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (80, 60));
    assert_eq!(image.get_pixel(25, 25).0, [255, 0, 0, 255]);
    assert_eq!(image.get_pixel(70, 50).0, [255, 255, 255, 255]);
}

#[test]
fn test_export_to_missing_directory_fails() {
    let dir = output_dir();
    let path = dir.path().join("missing").join("frame.png");
    let result = canvas(50, 50).export(&path);
    assert!(matches!(result, Err(PlotError::Export { .. })));
}
