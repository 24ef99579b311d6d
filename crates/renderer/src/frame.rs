//! Per-frame drawing on a reusable canvas.
//!
//! A `FrameRenderer` owns one `Canvas` for the lifetime of a worker and moves
//! through these states:
//!
//! ```text
//! Empty --decorate--> Decorated --render_frame--> Rendering --export--> FrameReady
//!                         ^                                                 |
//!                         +------------------- clear_frame <----------------+
//! ```
//!
//! Colorbars and edge coordinate labels are drawn once while decorating and
//! stay on the canvas. Every other artifact belongs to the current frame and
//! is removed by `clear_frame`, which `render_frame` also runs implicitly
//! when called on a surface that still holds a previous frame.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use frame_common::{CoordinateGrid, ForecastTime, Frame, GriddedField, PlotError, PlotResult};
use tracing::{debug, trace};

use crate::canvas::{
    ArtifactId, ArtifactKind, Canvas, FigureLayout, PixelRect, Primitive, TextSpec,
};
use crate::colorbar;
use crate::colormap::Color;
use crate::contour::{place_labels, trace_contours, Contour, LabelPlacement, Point};
use crate::glyphs::{HAlign, VAlign};
use crate::labels::{format_label, format_tick};
use crate::layout::{ResolvedContour, ResolvedLayout};

const ANNOTATION_SIZE: f32 = 9.0;
const SYMBOL_SIZE: f32 = 16.0;
const EXTREMUM_VALUE_SIZE: f32 = 8.0;
const AXIS_LABEL_SIZE: f32 = 7.0;
/// Edge labels sit at the inner quarter points of each axis
const AXIS_DIVISIONS: usize = 4;

/// Lifecycle of a worker's drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Empty,
    Decorated,
    Rendering,
    FrameReady,
}

/// Handles of every non-persistent artifact drawn for one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawnArtifactSet {
    ids: Vec<ArtifactId>,
}

impl DrawnArtifactSet {
    pub fn ids(&self) -> &[ArtifactId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Output surface size and the map extent it shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSpec {
    pub width: u32,
    pub height: u32,
    /// (min_x, min_y, max_x, max_y); the grid's extent when absent
    pub extent: Option<(f64, f64, f64, f64)>,
    /// Label the bottom and right map edges with projected coordinates
    pub axis_labels: bool,
}

/// Linear map from projected coordinates to pixels, north up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapTransform {
    extent: (f64, f64, f64, f64),
    plot: PixelRect,
}

impl MapTransform {
    pub fn new(extent: (f64, f64, f64, f64), plot: PixelRect) -> PlotResult<Self> {
        let (min_x, min_y, max_x, max_y) = extent;
        let finite = [min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite());
        if !finite || max_x <= min_x || max_y <= min_y {
            return Err(PlotError::config(format!("invalid map extent {:?}", extent)));
        }
        Ok(Self { extent, plot })
    }

    pub fn to_pixel(&self, x: f64, y: f64) -> (f32, f32) {
        let (min_x, min_y, max_x, max_y) = self.extent;
        let px = self.plot.left as f64 + (x - min_x) / (max_x - min_x) * self.plot.width as f64;
        let py = self.plot.top as f64 + (max_y - y) / (max_y - min_y) * self.plot.height as f64;
        (px as f32, py as f32)
    }

    pub fn to_map(&self, px: f32, py: f32) -> (f64, f64) {
        let (min_x, min_y, max_x, max_y) = self.extent;
        let x = min_x + (px - self.plot.left) as f64 / self.plot.width as f64 * (max_x - min_x);
        let y = max_y - (py - self.plot.top) as f64 / self.plot.height as f64 * (max_y - min_y);
        (x, y)
    }
}

/// `<variable>_<lead hours>.png`
pub fn frame_file_name(variable: &str, lead_hours: i64) -> String {
    format!("{}_{}.png", variable, lead_hours)
}

/// Draws frames of one product onto a canvas it owns.
pub struct FrameRenderer {
    layout: Arc<ResolvedLayout>,
    grid: Arc<CoordinateGrid>,
    canvas: Canvas,
    transform: MapTransform,
    axis_labels: bool,
    state: SurfaceState,
    drawn: DrawnArtifactSet,
}

impl FrameRenderer {
    pub fn new(
        layout: Arc<ResolvedLayout>,
        grid: Arc<CoordinateGrid>,
        surface: SurfaceSpec,
    ) -> PlotResult<Self> {
        let has_colorbars = layout.colorbars().next().is_some();
        let figure = FigureLayout::new(surface.width, surface.height, has_colorbars)?;
        let extent = surface.extent.unwrap_or_else(|| grid.extent());
        let transform = MapTransform::new(extent, figure.plot)?;

        Ok(Self {
            layout,
            grid,
            canvas: Canvas::new(figure),
            transform,
            axis_labels: surface.axis_labels,
            state: SurfaceState::Empty,
            drawn: DrawnArtifactSet::default(),
        })
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn layout(&self) -> &ResolvedLayout {
        &self.layout
    }

    /// Artifacts of the frame currently on the canvas.
    pub fn drawn(&self) -> &DrawnArtifactSet {
        &self.drawn
    }

    /// Draw the persistent decorations. Does nothing once decorated.
    pub fn decorate(&mut self) -> PlotResult<()> {
        if self.state != SurfaceState::Empty {
            return Ok(());
        }

        if let Some(strip) = self.canvas.layout().colorbar_strip {
            let bars: Vec<_> = self.layout.colorbars().collect();
            for ((cmap, title), slot) in bars.iter().zip(colorbar::slots(strip, bars.len())) {
                let primitives = colorbar::colorbar(cmap, title, slot);
                self.canvas.add(ArtifactKind::Colorbar, true, false, primitives);
            }
        }
        if self.axis_labels {
            let primitives = self.edge_labels();
            self.canvas.add(ArtifactKind::Annotation, true, true, primitives);
        }

        debug!(
            variable = %self.layout.variable_name,
            decorations = self.canvas.persistent_count(),
            "decorated surface"
        );
        self.state = SurfaceState::Decorated;
        Ok(())
    }

    /// Draw every layer of `frame`. A previous frame still on the canvas is
    /// cleared first; on error the partially drawn frame is removed again.
    pub fn render_frame(&mut self, frame: &Frame, time: ForecastTime) -> PlotResult<DrawnArtifactSet> {
        match self.state {
            SurfaceState::Empty => self.decorate()?,
            SurfaceState::Rendering | SurfaceState::FrameReady => {
                self.clear_frame();
            }
            SurfaceState::Decorated => {}
        }

        self.state = SurfaceState::Rendering;
        match self.draw_layers(frame, time) {
            Ok(()) => {
                trace!(
                    variable = %self.layout.variable_name,
                    lead_hours = time.lead_hours(),
                    artifacts = self.drawn.len(),
                    "frame drawn"
                );
                Ok(self.drawn.clone())
            }
            Err(e) => {
                self.clear_frame();
                Err(e)
            }
        }
    }

    /// Write the composed frame to `path`.
    pub fn export(&mut self, path: &Path) -> PlotResult<()> {
        if self.state != SurfaceState::Rendering {
            return Err(PlotError::render(format!(
                "nothing to export to {} in state {:?}",
                path.display(),
                self.state
            )));
        }
        self.canvas.export(path)?;
        self.state = SurfaceState::FrameReady;
        Ok(())
    }

    /// Remove the current frame's artifacts, keeping decorations. Returns the
    /// number of artifacts removed.
    pub fn clear_frame(&mut self) -> usize {
        let drawn = std::mem::take(&mut self.drawn);
        let removed = self.canvas.remove(drawn.ids());
        if self.state != SurfaceState::Empty {
            self.state = SurfaceState::Decorated;
        }
        removed
    }

    fn add(&mut self, kind: ArtifactKind, clipped: bool, primitives: Vec<Primitive>) {
        let id = self.canvas.add(kind, false, clipped, primitives);
        self.drawn.ids.push(id);
    }

    fn edge_labels(&self) -> Vec<Primitive> {
        let plot = self.canvas.layout().plot;
        let pad = 3.0;
        let mut primitives = Vec::with_capacity(2 * (AXIS_DIVISIONS - 1));

        for i in 1..AXIS_DIVISIONS {
            let t = i as f32 / AXIS_DIVISIONS as f32;

            let px = plot.left + t * plot.width;
            let (x, _) = self.transform.to_map(px, plot.bottom());
            let spec = TextSpec::new(px, plot.bottom() - pad, format_tick(x as f32), AXIS_LABEL_SIZE, Color::BLACK)
                .aligned(HAlign::Center, VAlign::Bottom)
                .with_halo(Color::WHITE);
            primitives.push(Primitive::Text(spec));

            let py = plot.top + t * plot.height;
            let (_, y) = self.transform.to_map(plot.right(), py);
            let spec = TextSpec::new(plot.right() - pad, py, format_tick(y as f32), AXIS_LABEL_SIZE, Color::BLACK)
                .aligned(HAlign::Right, VAlign::Middle)
                .with_halo(Color::WHITE);
            primitives.push(Primitive::Text(spec));
        }
        primitives
    }

    fn grid_pixel(&self, row: f64, col: f64) -> (f32, f32) {
        let (x, y) = self.grid.coord_at(row, col);
        self.transform.to_pixel(x, y)
    }

    fn draw_layers(&mut self, frame: &Frame, time: ForecastTime) -> PlotResult<()> {
        let layout = Arc::clone(&self.layout);
        let fields = self.prepare_fields(frame, &layout)?;
        let field = |name: &str| -> PlotResult<&GriddedField> {
            fields
                .get(name)
                .map(|f| f.as_ref())
                .ok_or_else(|| PlotError::render(format!("field '{}' not prepared", name)))
        };

        for fill in &layout.fills {
            let raster = self.fill_raster(field(&fill.field)?, |v| fill.colormap.color(v), fill.opacity)?;
            self.add(ArtifactKind::FilledContour, true, vec![raster]);
        }

        for layer in &layout.contours {
            let (lines, labels) = self.contour_primitives(field(&layer.field)?, layer);
            self.add(ArtifactKind::ContourLines, true, lines);
            if !labels.is_empty() {
                self.add(ArtifactKind::ContourLabels, true, labels);
            }
        }

        for layer in &layout.extrema {
            let points = layer.finder.find(field(&layer.field)?);
            let mut primitives = Vec::with_capacity(points.len() * 2);
            for p in &points {
                let (x, y) = self.grid_pixel(p.row as f64, p.col as f64);
                primitives.push(Primitive::Text(
                    TextSpec::new(x, y, layer.symbol.as_str(), SYMBOL_SIZE, layer.color)
                        .aligned(HAlign::Center, VAlign::Middle)
                        .bold(),
                ));
                primitives.push(Primitive::Text(
                    TextSpec::new(
                        x,
                        y + SYMBOL_SIZE * 0.55,
                        format_label(p.value),
                        EXTREMUM_VALUE_SIZE,
                        Color::rgb(128, 128, 128),
                    )
                    .aligned(HAlign::Center, VAlign::Top),
                ));
            }
            self.add(ArtifactKind::ExtremaMarkers, true, primitives);
        }

        for layer in &layout.values {
            let labels = layer.labeler.select(field(&layer.field)?);
            let primitives = labels
                .iter()
                .map(|label| {
                    let (x, y) = self.grid_pixel(label.row as f64, label.col as f64);
                    let color = layer
                        .colormap
                        .as_ref()
                        .and_then(|cmap| cmap.color(label.value))
                        .unwrap_or(Color::BLACK);
                    Primitive::Text(
                        TextSpec::new(x, y, format_label(label.value), layer.font_size, color)
                            .aligned(HAlign::Center, VAlign::Middle),
                    )
                })
                .collect();
            self.add(ArtifactKind::ValueLabels, true, primitives);
        }

        self.draw_annotations(time, &layout.description);
        Ok(())
    }

    /// Check every field the layout reads and apply configured smoothing.
    fn prepare_fields<'f>(
        &self,
        frame: &'f Frame,
        layout: &ResolvedLayout,
    ) -> PlotResult<BTreeMap<String, Cow<'f, GriddedField>>> {
        let names = layout
            .fills
            .iter()
            .map(|l| &l.field)
            .chain(layout.contours.iter().map(|l| &l.field))
            .chain(layout.extrema.iter().map(|l| &l.field))
            .chain(layout.values.iter().map(|l| &l.field));

        let mut prepared = BTreeMap::new();
        for name in names {
            if prepared.contains_key(name) {
                continue;
            }
            let field = frame.field(name)?;
            if field.is_empty() {
                return Err(PlotError::render(format!("field '{}' is empty", name)));
            }
            if !field.has_shape_of(&self.grid) {
                return Err(PlotError::render(format!(
                    "field '{}' is {}x{} but the grid is {}x{}",
                    name,
                    field.nx,
                    field.ny,
                    self.grid.nx(),
                    self.grid.ny()
                )));
            }
            if field.is_all_nan() {
                return Err(PlotError::render(format!("field '{}' has no valid values", name)));
            }

            let field = match layout.smoothing.get(name) {
                Some(&passes) if passes > 0 => Cow::Owned(field.smooth_n_point(passes)),
                _ => Cow::Borrowed(field),
            };
            prepared.insert(name.clone(), field);
        }
        Ok(prepared)
    }

    /// Rasterize a field over the plot area, one bilinear sample per pixel.
    fn fill_raster<F>(&self, field: &GriddedField, color_of: F, opacity: f32) -> PlotResult<Primitive>
    where
        F: Fn(f32) -> Option<Color>,
    {
        let plot = self.canvas.layout().plot;
        let left = plot.left.floor() as i32;
        let top = plot.top.floor() as i32;
        let width = plot.width.ceil() as u32;
        let height = plot.height.ceil() as u32;
        if width == 0 || height == 0 {
            return Err(PlotError::render("plot area has no pixels"));
        }

        let mut rgba = vec![0u8; width as usize * height as usize * 4];
        for (py, row) in rgba.chunks_exact_mut(width as usize * 4).enumerate() {
            for (px, pixel) in row.chunks_exact_mut(4).enumerate() {
                let (x, y) = self
                    .transform
                    .to_map(left as f32 + px as f32 + 0.5, top as f32 + py as f32 + 0.5);
                let (grid_row, grid_col) = self.grid.fractional_index(x, y);
                if let Some(c) = color_of(field.sample(grid_row, grid_col)) {
                    pixel.copy_from_slice(&[c.r, c.g, c.b, 255]);
                }
            }
        }

        Ok(Primitive::Raster {
            left,
            top,
            width,
            height,
            rgba,
            opacity,
        })
    }

    fn contour_primitives(
        &self,
        field: &GriddedField,
        layer: &ResolvedContour,
    ) -> (Vec<Primitive>, Vec<Primitive>) {
        let pixel_contours: Vec<Contour> = trace_contours(field, &layer.levels, layer.chaikin_passes)
            .into_iter()
            .map(|c| Contour {
                points: c
                    .points
                    .iter()
                    .map(|p| {
                        let (x, y) = self.grid_pixel(p.y as f64, p.x as f64);
                        Point::new(x, y)
                    })
                    .collect(),
                ..c
            })
            .collect();

        let positions = match layer.label_size {
            Some(font_size) => {
                let plot = self.canvas.layout().plot;
                place_labels(
                    &pixel_contours,
                    &LabelPlacement {
                        spacing: layer.label_spacing,
                        font_size,
                        bounds: (plot.left, plot.top, plot.right(), plot.bottom()),
                    },
                )
            }
            None => Vec::new(),
        };

        let gap = layer.label_size.unwrap_or(0.0) * 1.6;
        let mut lines = Vec::new();
        for contour in &pixel_contours {
            let here: Vec<(f32, f32)> = positions
                .iter()
                .filter(|p| p.level == contour.level)
                .map(|p| (p.x, p.y))
                .collect();
            for run in break_at_labels(&contour.points, &here, gap) {
                let closed = contour.closed && here.is_empty();
                lines.push(Primitive::Polyline {
                    points: run,
                    closed,
                    color: layer.color,
                    width: layer.line_width,
                });
            }
        }

        let labels = positions
            .iter()
            .map(|p| {
                Primitive::Text(
                    TextSpec::new(p.x, p.y, format_label(p.level), layer.label_size.unwrap_or(0.0), layer.color)
                        .aligned(HAlign::Center, VAlign::Middle)
                        .rotated(p.angle),
                )
            })
            .collect();

        (lines, labels)
    }

    fn draw_annotations(&mut self, time: ForecastTime, description: &str) {
        let plot = self.canvas.layout().plot;
        let pad = 4.0;
        let halo = Color::WHITE;

        let valid = TextSpec::new(plot.left + pad, plot.top + pad, time.valid_label(), ANNOTATION_SIZE, Color::BLACK)
            .with_halo(halo);
        let run = TextSpec::new(plot.right() - pad, plot.top + pad, time.run_label(), ANNOTATION_SIZE, Color::BLACK)
            .aligned(HAlign::Right, VAlign::Top)
            .with_halo(halo);
        let desc = TextSpec::new(plot.left + pad, plot.bottom() - pad, description, ANNOTATION_SIZE * 0.8, Color::BLACK)
            .aligned(HAlign::Left, VAlign::Bottom)
            .with_halo(halo);

        for spec in [valid, run, desc] {
            self.add(ArtifactKind::Annotation, false, vec![Primitive::Text(spec)]);
        }
    }
}

/// Split a polyline into runs that stay `gap` pixels away from each label.
fn break_at_labels(points: &[Point], labels: &[(f32, f32)], gap: f32) -> Vec<Vec<(f32, f32)>> {
    let mut runs = Vec::new();
    let mut current: Vec<(f32, f32)> = Vec::new();
    let gap_sq = gap * gap;

    for p in points {
        let hidden = labels
            .iter()
            .any(|&(lx, ly)| (p.x - lx).powi(2) + (p.y - ly).powi(2) < gap_sq);
        if hidden {
            if current.len() > 1 {
                runs.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        } else {
            current.push((p.x, p.y));
        }
    }
    if current.len() > 1 {
        runs.push(current);
    }
    runs
}
