//! Map product layouts.
//!
//! A `Layout` is plain data describing which layers a product draws. It is
//! resolved once per run against the scheme registry and the run's data
//! ranges, producing a `ResolvedLayout` that every worker shares read-only.

use std::collections::BTreeMap;

use frame_common::{PlotError, PlotResult};
use serde::{Deserialize, Serialize};

use crate::colormap::{arange, Color, Extend, LevelColormap, SchemeRegistry};
use crate::extrema::{ExtremaFinder, ExtremumKind, TieBreak};
use crate::labels::{ValueLabeler, ValuePredicate};

/// How contour or fill levels are given.
///
/// In configuration files this is a list, a `{start, stop, step}` map or a
/// `{step}` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelSpec {
    /// Literal boundaries
    Explicit(Vec<f32>),
    /// `start, start+step, ...` excluding `stop`
    Range { start: f32, stop: f32, step: f32 },
    /// Every `step` between the run's truncated minimum and maximum
    Interval { step: f32 },
}

impl LevelSpec {
    /// Concrete ascending levels. `data_range` is the field's range over the
    /// whole run and is only needed for `Interval`.
    pub fn resolve(&self, field: &str, data_range: Option<(f32, f32)>) -> PlotResult<Vec<f32>> {
        let levels = match self {
            LevelSpec::Explicit(levels) => levels.clone(),
            LevelSpec::Range { start, stop, step } => arange(*start, *stop, *step)?,
            LevelSpec::Interval { step } => {
                let (lo, hi) = data_range.ok_or_else(|| {
                    PlotError::config(format!("field '{}' has no data to derive levels from", field))
                })?;
                arange(lo.trunc(), hi.trunc(), *step)?
            }
        };

        if levels.is_empty() {
            return Err(PlotError::config(format!("degenerate levels for field '{}'", field)));
        }
        if levels.iter().any(|l| !l.is_finite()) || levels.windows(2).any(|w| w[1] <= w[0]) {
            return Err(PlotError::config(format!(
                "levels for field '{}' must be finite and strictly increasing",
                field
            )));
        }
        Ok(levels)
    }
}

fn default_opacity() -> f32 {
    1.0
}

fn default_line_color() -> String {
    "black".to_string()
}

fn default_line_width() -> f32 {
    1.0
}

fn default_label_spacing() -> f32 {
    220.0
}

fn default_value_size() -> f32 {
    8.0
}

/// Filled-contour layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillLayer {
    pub field: String,
    pub scheme: String,
    pub levels: LevelSpec,
    #[serde(default)]
    pub extend: Extend,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Title of the colorbar; no colorbar when absent
    #[serde(default)]
    pub colorbar: Option<String>,
}

/// Line-contour layer with optional inline labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourLayer {
    pub field: String,
    pub levels: LevelSpec,
    #[serde(default = "default_line_color")]
    pub color: String,
    #[serde(default = "default_line_width")]
    pub line_width: f32,
    /// Chaikin passes applied to each traced line
    #[serde(default)]
    pub chaikin_passes: u32,
    /// Inline label font size in pixels; no labels when absent
    #[serde(default)]
    pub label_size: Option<f32>,
    #[serde(default = "default_label_spacing")]
    pub label_spacing: f32,
}

/// Max or min markers on a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremaLayer {
    pub field: String,
    pub kind: ExtremumKind,
    /// Minimum distance between markers in grid cells
    pub separation: usize,
    pub symbol: String,
    pub color: String,
    /// Shuffle equal-valued candidates with this seed
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Direct value annotation of selected grid points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueLayer {
    pub field: String,
    /// Only label values at or above this
    #[serde(default)]
    pub threshold: Option<f32>,
    /// Minimum spacing between labels in grid cells
    pub spacing: f32,
    /// Color text with the colormap of the fill layer drawing this field
    #[serde(default)]
    pub colored_by: Option<String>,
    #[serde(default = "default_value_size")]
    pub font_size: f32,
}

/// Everything one product draws per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Used in output file names
    pub variable_name: String,
    pub description: String,
    /// 9-point smoother passes applied to a field before any layer uses it
    #[serde(default)]
    pub smoothing: BTreeMap<String, u32>,
    #[serde(default)]
    pub fills: Vec<FillLayer>,
    #[serde(default)]
    pub contours: Vec<ContourLayer>,
    #[serde(default)]
    pub extrema: Vec<ExtremaLayer>,
    #[serde(default)]
    pub values: Vec<ValueLayer>,
}

pub struct ResolvedFill {
    pub field: String,
    pub colormap: LevelColormap,
    pub opacity: f32,
    pub colorbar: Option<String>,
}

pub struct ResolvedContour {
    pub field: String,
    pub levels: Vec<f32>,
    pub color: Color,
    pub line_width: f32,
    pub chaikin_passes: u32,
    pub label_size: Option<f32>,
    pub label_spacing: f32,
}

pub struct ResolvedExtrema {
    pub field: String,
    pub finder: ExtremaFinder,
    pub symbol: String,
    pub color: Color,
}

pub struct ResolvedValues {
    pub field: String,
    pub labeler: ValueLabeler,
    pub colormap: Option<LevelColormap>,
    pub font_size: f32,
}

/// A layout with colormaps built and levels fixed for one run.
pub struct ResolvedLayout {
    pub variable_name: String,
    pub description: String,
    pub smoothing: BTreeMap<String, u32>,
    pub fills: Vec<ResolvedFill>,
    pub contours: Vec<ResolvedContour>,
    pub extrema: Vec<ResolvedExtrema>,
    pub values: Vec<ResolvedValues>,
}

impl ResolvedLayout {
    /// Fill layers that get a colorbar, in drawing order.
    pub fn colorbars(&self) -> impl Iterator<Item = (&LevelColormap, &str)> {
        self.fills
            .iter()
            .filter_map(|f| f.colorbar.as_deref().map(|title| (&f.colormap, title)))
    }
}

fn parse_color(spec: &str) -> PlotResult<Color> {
    Color::parse(spec).ok_or_else(|| PlotError::config(format!("invalid color '{}'", spec)))
}

impl Layout {
    /// Names of every field the layout reads.
    pub fn fields(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .fills
            .iter()
            .map(|l| l.field.as_str())
            .chain(self.contours.iter().map(|l| l.field.as_str()))
            .chain(self.extrema.iter().map(|l| l.field.as_str()))
            .chain(self.values.iter().map(|l| l.field.as_str()))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Build colormaps, finders and labelers. `data_range` yields a field's
    /// range over the whole run, used for interval contour levels.
    pub fn resolve<F>(&self, registry: &SchemeRegistry, data_range: F) -> PlotResult<ResolvedLayout>
    where
        F: Fn(&str) -> Option<(f32, f32)>,
    {
        if self.variable_name.is_empty() {
            return Err(PlotError::config("layout needs a variable name"));
        }

        let fills = self
            .fills
            .iter()
            .map(|layer| {
                if !(0.0..=1.0).contains(&layer.opacity) {
                    return Err(PlotError::config(format!(
                        "opacity {} of field '{}' is outside 0..1",
                        layer.opacity, layer.field
                    )));
                }
                let levels = layer.levels.resolve(&layer.field, data_range(&layer.field))?;
                Ok(ResolvedFill {
                    field: layer.field.clone(),
                    colormap: registry.colormap(&layer.scheme, &levels, layer.extend)?,
                    opacity: layer.opacity,
                    colorbar: layer.colorbar.clone(),
                })
            })
            .collect::<PlotResult<Vec<_>>>()?;

        let contours = self
            .contours
            .iter()
            .map(|layer| {
                Ok(ResolvedContour {
                    field: layer.field.clone(),
                    levels: layer.levels.resolve(&layer.field, data_range(&layer.field))?,
                    color: parse_color(&layer.color)?,
                    line_width: layer.line_width,
                    chaikin_passes: layer.chaikin_passes,
                    label_size: layer.label_size,
                    label_spacing: layer.label_spacing,
                })
            })
            .collect::<PlotResult<Vec<_>>>()?;

        let extrema = self
            .extrema
            .iter()
            .map(|layer| {
                let tie_break = layer.seed.map(TieBreak::Seeded).unwrap_or_default();
                Ok(ResolvedExtrema {
                    field: layer.field.clone(),
                    finder: ExtremaFinder::new(layer.kind, layer.separation).with_tie_break(tie_break),
                    symbol: layer.symbol.clone(),
                    color: parse_color(&layer.color)?,
                })
            })
            .collect::<PlotResult<Vec<_>>>()?;

        let values = self
            .values
            .iter()
            .map(|layer| {
                let colormap = match &layer.colored_by {
                    Some(field) => Some(
                        fills
                            .iter()
                            .find(|f| &f.field == field)
                            .map(|f| f.colormap.clone())
                            .ok_or_else(|| {
                                PlotError::config(format!("no fill layer for field '{}'", field))
                            })?,
                    ),
                    None => None,
                };
                let predicate = match (layer.threshold, &colormap) {
                    (Some(threshold), _) => ValuePredicate::AtLeast(threshold),
                    (None, Some(cmap)) => ValuePredicate::WithinLevels(cmap.levels().clone()),
                    (None, None) => ValuePredicate::Any,
                };
                Ok(ResolvedValues {
                    field: layer.field.clone(),
                    labeler: ValueLabeler::with_spacing(predicate, layer.spacing)?,
                    colormap,
                    font_size: layer.font_size,
                })
            })
            .collect::<PlotResult<Vec<_>>>()?;

        Ok(ResolvedLayout {
            variable_name: self.variable_name.clone(),
            description: self.description.clone(),
            smoothing: self.smoothing.clone(),
            fills,
            contours,
            extrema,
            values,
        })
    }
}
