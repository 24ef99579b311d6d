//! Retained-mode drawing surface.
//!
//! Everything drawn on a `Canvas` is kept as an `Artifact` with its own
//! handle, so a frame's layers can be removed again while decorations such
//! as colorbars stay in place. Pixels are only produced on `rasterize`, which
//! paints artifacts in insertion order over a white background.

use std::path::Path;

use frame_common::{PlotError, PlotResult};
use tiny_skia::{
    FillRule, IntSize, LineCap, LineJoin, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Rect,
    Stroke, Transform,
};

use crate::colormap::Color;
use crate::glyphs::{self, HAlign, VAlign};
use crate::png;

/// Handle of one artifact on a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId(u64);

/// What an artifact represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    FilledContour,
    ContourLines,
    ContourLabels,
    ExtremaMarkers,
    ValueLabels,
    Annotation,
    Colorbar,
}

/// Text with placement and styling, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpec {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub size: f32,
    pub color: Color,
    pub h: HAlign,
    pub v: VAlign,
    /// Rotation in degrees around the anchor
    pub angle: f32,
    /// Outline drawn beneath the text for contrast
    pub halo: Option<Color>,
    /// Stroke width as a fraction of the size
    pub weight: f32,
}

impl TextSpec {
    pub fn new(x: f32, y: f32, text: impl Into<String>, size: f32, color: Color) -> Self {
        Self {
            x,
            y,
            text: text.into(),
            size,
            color,
            h: HAlign::Left,
            v: VAlign::Top,
            angle: 0.0,
            halo: None,
            weight: 0.1,
        }
    }

    pub fn aligned(mut self, h: HAlign, v: VAlign) -> Self {
        self.h = h;
        self.v = v;
        self
    }

    pub fn rotated(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_halo(mut self, halo: Color) -> Self {
        self.halo = Some(halo);
        self
    }

    pub fn bold(mut self) -> Self {
        self.weight = 0.16;
        self
    }
}

/// A drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Straight RGBA pixels (alpha 0 or 255) placed at `(left, top)`
    Raster {
        left: i32,
        top: i32,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
        opacity: f32,
    },
    Polyline {
        points: Vec<(f32, f32)>,
        closed: bool,
        color: Color,
        width: f32,
    },
    Polygon {
        points: Vec<(f32, f32)>,
        fill: Color,
        outline: Option<Color>,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Color,
        outline: Option<Color>,
    },
    Text(TextSpec),
}

/// A group of primitives added and removed together.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub id: ArtifactId,
    pub kind: ArtifactKind,
    pub persistent: bool,
    /// Clip to the plot area when rasterizing
    pub clipped: bool,
    pub primitives: Vec<Primitive>,
}

/// Pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Margin around the plot area in pixels.
const MARGIN: f32 = 10.0;
/// Height reserved below the plot for colorbars.
pub const COLORBAR_STRIP: f32 = 64.0;

/// Figure geometry: full size, map area and colorbar strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureLayout {
    pub width: u32,
    pub height: u32,
    pub plot: PixelRect,
    pub colorbar_strip: Option<PixelRect>,
}

impl FigureLayout {
    pub fn new(width: u32, height: u32, with_colorbars: bool) -> PlotResult<Self> {
        let strip = if with_colorbars { COLORBAR_STRIP } else { 0.0 };
        let plot_w = width as f32 - 2.0 * MARGIN;
        let plot_h = height as f32 - 2.0 * MARGIN - strip;
        if plot_w < 16.0 || plot_h < 16.0 {
            return Err(PlotError::config(format!(
                "figure {}x{} is too small for a map",
                width, height
            )));
        }

        let plot = PixelRect {
            left: MARGIN,
            top: MARGIN,
            width: plot_w,
            height: plot_h,
        };
        let colorbar_strip = with_colorbars.then(|| PixelRect {
            left: MARGIN,
            top: plot.bottom(),
            width: plot_w,
            height: strip,
        });
        Ok(Self {
            width,
            height,
            plot,
            colorbar_strip,
        })
    }
}

/// A drawing surface owned by one worker.
#[derive(Debug, Clone)]
pub struct Canvas {
    layout: FigureLayout,
    background: Color,
    artifacts: Vec<Artifact>,
    next_id: u64,
}

impl Canvas {
    pub fn new(layout: FigureLayout) -> Self {
        Self {
            layout,
            background: Color::WHITE,
            artifacts: Vec::new(),
            next_id: 0,
        }
    }

    pub fn layout(&self) -> &FigureLayout {
        &self.layout
    }

    /// Add an artifact and return its handle.
    pub fn add(
        &mut self,
        kind: ArtifactKind,
        persistent: bool,
        clipped: bool,
        primitives: Vec<Primitive>,
    ) -> ArtifactId {
        let id = ArtifactId(self.next_id);
        self.next_id += 1;
        self.artifacts.push(Artifact {
            id,
            kind,
            persistent,
            clipped,
            primitives,
        });
        id
    }

    /// Remove the given artifacts; returns how many were found.
    pub fn remove(&mut self, ids: &[ArtifactId]) -> usize {
        let before = self.artifacts.len();
        self.artifacts.retain(|a| !ids.contains(&a.id));
        before - self.artifacts.len()
    }

    pub fn contains(&self, id: ArtifactId) -> bool {
        self.artifacts.iter().any(|a| a.id == id)
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn artifact_count(&self) -> usize {
        self.artifacts.len()
    }

    pub fn persistent_count(&self) -> usize {
        self.artifacts.iter().filter(|a| a.persistent).count()
    }

    pub fn count_of(&self, kind: ArtifactKind) -> usize {
        self.artifacts.iter().filter(|a| a.kind == kind).count()
    }

    /// Paint every artifact onto a fresh pixmap.
    pub fn rasterize(&self) -> PlotResult<Pixmap> {
        let (w, h) = (self.layout.width, self.layout.height);
        let mut pixmap = Pixmap::new(w, h)
            .ok_or_else(|| PlotError::render(format!("cannot allocate {}x{} surface", w, h)))?;
        pixmap.fill(self.background.to_skia());

        let plot = self.layout.plot;
        let mut clip = Mask::new(w, h)
            .ok_or_else(|| PlotError::render("cannot allocate clip mask"))?;
        if let Some(rect) = Rect::from_xywh(plot.left, plot.top, plot.width, plot.height) {
            clip.fill_path(&PathBuilder::from_rect(rect), FillRule::Winding, false, Transform::identity());
        }

        for artifact in &self.artifacts {
            let mask = artifact.clipped.then_some(&clip);
            for primitive in &artifact.primitives {
                draw_primitive(&mut pixmap, primitive, mask)?;
            }
        }

        Ok(pixmap)
    }

    /// Rasterize and write a PNG file.
    pub fn export(&self, path: &Path) -> PlotResult<()> {
        let pixmap = self.rasterize()?;
        let bytes = png::encode_pixmap(&pixmap)
            .map_err(|e| PlotError::export(path.display().to_string(), e))?;
        std::fs::write(path, bytes)
            .map_err(|e| PlotError::export(path.display().to_string(), e.to_string()))
    }
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

fn round_stroke(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    }
}

fn polyline_path(points: &[(f32, f32)], closed: bool) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.0, first.1);
    for &(x, y) in rest {
        pb.line_to(x, y);
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

fn draw_primitive(pixmap: &mut Pixmap, primitive: &Primitive, mask: Option<&Mask>) -> PlotResult<()> {
    match primitive {
        Primitive::Raster {
            left,
            top,
            width,
            height,
            rgba,
            opacity,
        } => {
            let size = IntSize::from_wh(*width, *height)
                .ok_or_else(|| PlotError::render("empty raster layer"))?;
            // Alpha is 0 or 255 everywhere, so straight and premultiplied agree.
            let layer = Pixmap::from_vec(rgba.clone(), size)
                .ok_or_else(|| PlotError::render("raster layer size mismatch"))?;
            let paint = PixmapPaint {
                opacity: *opacity,
                ..PixmapPaint::default()
            };
            pixmap.draw_pixmap(*left, *top, layer.as_ref(), &paint, Transform::identity(), mask);
        }
        Primitive::Polyline {
            points,
            closed,
            color,
            width,
        } => {
            if let Some(path) = polyline_path(points, *closed) {
                pixmap.stroke_path(&path, &solid_paint(*color), &round_stroke(*width), Transform::identity(), mask);
            }
        }
        Primitive::Polygon { points, fill, outline } => {
            if let Some(path) = polyline_path(points, true) {
                pixmap.fill_path(&path, &solid_paint(*fill), FillRule::Winding, Transform::identity(), mask);
                if let Some(outline) = outline {
                    pixmap.stroke_path(&path, &solid_paint(*outline), &round_stroke(1.0), Transform::identity(), mask);
                }
            }
        }
        Primitive::Rect {
            x,
            y,
            width,
            height,
            fill,
            outline,
        } => {
            if let Some(rect) = Rect::from_xywh(*x, *y, *width, *height) {
                pixmap.fill_rect(rect, &solid_paint(*fill), Transform::identity(), mask);
                if let Some(outline) = outline {
                    let path = PathBuilder::from_rect(rect);
                    pixmap.stroke_path(&path, &solid_paint(*outline), &round_stroke(1.0), Transform::identity(), mask);
                }
            }
        }
        Primitive::Text(spec) => {
            if let Some(path) = glyphs::text_path(&spec.text, spec.x, spec.y, spec.size, spec.h, spec.v) {
                let transform = Transform::from_rotate_at(spec.angle, spec.x, spec.y);
                let width = (spec.size * spec.weight).max(0.8);
                if let Some(halo) = spec.halo {
                    pixmap.stroke_path(&path, &solid_paint(halo), &round_stroke(width * 3.0), transform, mask);
                }
                pixmap.stroke_path(&path, &solid_paint(spec.color), &round_stroke(width), transform, mask);
            }
        }
    }
    Ok(())
}
