//! Discrete-level colormaps.
//!
//! A `LevelColormap` pairs an ascending `LevelSet` with one color per bin
//! (`ColorTable`) and a `Normalizer` that places raw values into bins. Bin
//! colors are sampled from a named continuous scheme held in an immutable
//! `SchemeRegistry`.

use std::collections::HashMap;

use frame_common::{PlotError, PlotResult};
use serde::{Deserialize, Serialize};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Parse `#RRGGBB` or `RRGGBB`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::rgb(r, g, b))
    }

    /// Parse a hex string or one of the few named colors used by layouts.
    pub fn parse(spec: &str) -> Option<Self> {
        let named = match spec.to_ascii_lowercase().as_str() {
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            "red" => Some(Self::rgb(255, 0, 0)),
            "gray" | "grey" => Some(Self::rgb(128, 128, 128)),
            "royalblue" => Some(Self::rgb(65, 105, 225)),
            "coral" => Some(Self::rgb(255, 127, 80)),
            _ => None,
        };
        named.or_else(|| Self::from_hex(spec))
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;
    let mix = |a: u8, b: u8| (a as f32 * t_inv + b as f32 * t).round() as u8;

    Color::new(
        mix(color1.r, color2.r),
        mix(color1.g, color2.g),
        mix(color1.b, color2.b),
        mix(color1.a, color2.a),
    )
}

// ============================================================================
// Level sets
// ============================================================================

/// Strictly increasing bin boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSet(Vec<f32>);

impl LevelSet {
    pub fn new(levels: Vec<f32>) -> PlotResult<Self> {
        if levels.len() < 2 {
            return Err(PlotError::config(format!(
                "level set needs at least 2 boundaries, got {}",
                levels.len()
            )));
        }
        if levels.iter().any(|v| !v.is_finite()) {
            return Err(PlotError::config("level set contains non-finite values"));
        }
        if let Some(pair) = levels.windows(2).find(|w| w[1] <= w[0]) {
            return Err(PlotError::config(format!(
                "level set is not strictly increasing ({} followed by {})",
                pair[0], pair[1]
            )));
        }
        Ok(Self(levels))
    }

    /// `start, start+step, ...` up to but excluding `stop`.
    pub fn arange(start: f32, stop: f32, step: f32) -> PlotResult<Self> {
        Self::new(arange(start, stop, step)?)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> f32 {
        self.0[0]
    }

    pub fn last(&self) -> f32 {
        self.0[self.0.len() - 1]
    }

    /// Number of bins between consecutive boundaries.
    pub fn bin_count(&self) -> usize {
        self.0.len() - 1
    }

    /// Whether a value lies within `[first, last]`.
    pub fn covers(&self, value: f32) -> bool {
        value >= self.first() && value <= self.last()
    }
}

/// `start, start+step, ...` up to but excluding `stop`; may be empty.
pub fn arange(start: f32, stop: f32, step: f32) -> PlotResult<Vec<f32>> {
    if !(step.is_finite() && step > 0.0 && start.is_finite() && stop.is_finite()) {
        return Err(PlotError::config(format!(
            "invalid level range {}..{} step {}",
            start, stop, step
        )));
    }
    let count = ((stop - start) / step).ceil().max(0.0) as usize;
    Ok((0..count).map(|i| start + i as f32 * step).collect())
}

// ============================================================================
// Normalization
// ============================================================================

/// Where a value falls relative to a level set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bin {
    Under,
    Index(usize),
    Over,
}

/// Maps raw values to bins and to a position in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalizer {
    levels: LevelSet,
}

impl Normalizer {
    pub fn new(levels: LevelSet) -> Self {
        Self { levels }
    }

    /// Bin of a value; `None` for NaN. `levels[i] <= v < levels[i+1]` is bin `i`.
    pub fn bin(&self, value: f32) -> Option<Bin> {
        if value.is_nan() {
            return None;
        }
        let levels = self.levels.values();
        if value < levels[0] {
            return Some(Bin::Under);
        }
        if value >= levels[levels.len() - 1] {
            return Some(Bin::Over);
        }
        let upper = levels.partition_point(|&l| l <= value);
        Some(Bin::Index(upper - 1))
    }

    /// Piecewise-linear position: boundary `i` maps to `i / (n - 1)`, clamped to `[0, 1]`.
    pub fn position(&self, value: f32) -> f32 {
        let levels = self.levels.values();
        let segments = (levels.len() - 1) as f32;
        match self.bin(value) {
            None => f32::NAN,
            Some(Bin::Under) => 0.0,
            Some(Bin::Over) => 1.0,
            Some(Bin::Index(i)) => {
                let frac = (value - levels[i]) / (levels[i + 1] - levels[i]);
                (i as f32 + frac) / segments
            }
        }
    }

    pub fn levels(&self) -> &LevelSet {
        &self.levels
    }
}

// ============================================================================
// Color tables and schemes
// ============================================================================

/// One color per bin plus optional out-of-range colors.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTable {
    pub colors: Vec<Color>,
    pub under: Option<Color>,
    pub over: Option<Color>,
}

impl ColorTable {
    pub fn color_for_bin(&self, bin: Bin) -> Color {
        let last = self.colors.len() - 1;
        match bin {
            Bin::Under => self.under.unwrap_or(self.colors[0]),
            Bin::Over => self.over.unwrap_or(self.colors[last]),
            Bin::Index(i) => self.colors[i.min(last)],
        }
    }
}

/// A named continuous color scheme: evenly spaced stops and optional
/// distinguished under/over colors.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScheme {
    pub name: String,
    pub stops: Vec<Color>,
    pub under: Option<Color>,
    pub over: Option<Color>,
}

/// Scheme as written in configuration files.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SchemeDefinition {
    pub name: String,
    pub stops: Vec<String>,
    pub under: Option<String>,
    pub over: Option<String>,
}

impl ColorScheme {
    pub fn from_hex(name: &str, stops: &[&str], under: Option<&str>, over: Option<&str>) -> PlotResult<Self> {
        let parse = |hex: &str| {
            Color::from_hex(hex).ok_or_else(|| {
                PlotError::config(format!("scheme '{}': invalid color '{}'", name, hex))
            })
        };
        if stops.len() < 2 {
            return Err(PlotError::config(format!(
                "scheme '{}' needs at least 2 color stops",
                name
            )));
        }
        Ok(Self {
            name: name.to_string(),
            stops: stops.iter().map(|s| parse(*s)).collect::<PlotResult<_>>()?,
            under: under.map(parse).transpose()?,
            over: over.map(parse).transpose()?,
        })
    }

    pub fn from_definition(def: &SchemeDefinition) -> PlotResult<Self> {
        let stops: Vec<&str> = def.stops.iter().map(String::as_str).collect();
        Self::from_hex(&def.name, &stops, def.under.as_deref(), def.over.as_deref())
    }

    /// Continuous color at `t` in `[0, 1]`.
    pub fn sample(&self, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let scaled = t * (self.stops.len() - 1) as f32;
        let low = (scaled.floor() as usize).min(self.stops.len() - 2);
        interpolate_color(self.stops[low], self.stops[low + 1], scaled - low as f32)
    }

    /// Sample one color per bin of `levels`.
    pub fn table(&self, levels: &LevelSet) -> ColorTable {
        let bins = levels.bin_count();
        let colors = (0..bins)
            .map(|i| {
                let t = if bins > 1 { i as f32 / (bins - 1) as f32 } else { 0.5 };
                self.sample(t)
            })
            .collect();
        ColorTable {
            colors,
            under: self.under,
            over: self.over,
        }
    }
}

/// Which out-of-range sides of a filled layer are painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Extend {
    #[default]
    Neither,
    Min,
    Max,
    Both,
}

impl Extend {
    pub fn includes(self, bin: Bin) -> bool {
        match bin {
            Bin::Index(_) => true,
            Bin::Under => matches!(self, Extend::Min | Extend::Both),
            Bin::Over => matches!(self, Extend::Max | Extend::Both),
        }
    }
}

/// Bins, colors and normalization for one filled layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelColormap {
    pub scheme: String,
    pub table: ColorTable,
    pub normalizer: Normalizer,
    pub extend: Extend,
}

impl LevelColormap {
    /// Color of a raw value; `None` for NaN and for out-of-range values on a
    /// side the layer does not extend to.
    pub fn color(&self, value: f32) -> Option<Color> {
        self.normalizer
            .bin(value)
            .filter(|&bin| self.extend.includes(bin))
            .map(|bin| self.table.color_for_bin(bin))
    }

    /// Colors used for the under/over sides actually painted.
    pub fn extension_colors(&self) -> (Option<Color>, Option<Color>) {
        let under = self.extend.includes(Bin::Under).then(|| self.table.color_for_bin(Bin::Under));
        let over = self.extend.includes(Bin::Over).then(|| self.table.color_for_bin(Bin::Over));
        (under, over)
    }

    pub fn levels(&self) -> &LevelSet {
        self.normalizer.levels()
    }
}

/// Immutable lookup of named color schemes, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct SchemeRegistry {
    schemes: HashMap<String, ColorScheme>,
}

impl SchemeRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the built-in schemes.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (name, stops, under, over) in BUILTIN_SCHEMES {
            // Built-in hex strings are static and well formed.
            if let Ok(scheme) = ColorScheme::from_hex(name, stops, *under, *over) {
                registry.schemes.insert(name.to_string(), scheme);
            }
        }
        registry
    }

    /// Registry with extra schemes from configuration; later names override.
    pub fn with_definitions(mut self, definitions: &[SchemeDefinition]) -> PlotResult<Self> {
        for def in definitions {
            let scheme = ColorScheme::from_definition(def)?;
            self.schemes.insert(scheme.name.clone(), scheme);
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> PlotResult<&ColorScheme> {
        self.schemes
            .get(name)
            .ok_or_else(|| PlotError::config(format!("unknown color scheme '{}'", name)))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build the colormap for `levels` using scheme `name`.
    pub fn colormap(&self, name: &str, levels: &[f32], extend: Extend) -> PlotResult<LevelColormap> {
        let levels = LevelSet::new(levels.to_vec())?;
        let scheme = self.get(name)?;
        Ok(LevelColormap {
            scheme: name.to_string(),
            table: scheme.table(&levels),
            normalizer: Normalizer::new(levels),
            extend,
        })
    }
}

type BuiltinScheme = (
    &'static str,
    &'static [&'static str],
    Option<&'static str>,
    Option<&'static str>,
);

const BUILTIN_SCHEMES: &[BuiltinScheme] = &[
    (
        "nipy_spectral",
        &[
            "#000000", "#770088", "#880099", "#0000AA", "#0000DD", "#0077DD", "#0099DD",
            "#00AAAA", "#00AA88", "#009900", "#00BB00", "#00DD00", "#00FF00", "#BBFF00",
            "#EEEE00", "#FFCC00", "#FF9900", "#FF0000", "#DD0000", "#CC0000", "#CCCCCC",
        ],
        Some("#000000"),
        Some("#CCCCCC"),
    ),
    (
        "rain",
        &[
            "#9BE1FF", "#5FC3F5", "#2D96E6", "#1E64C8", "#2832A0", "#6428A0", "#9628A0",
            "#C83296", "#F05078",
        ],
        None,
        Some("#FF96B4"),
    ),
    (
        "snow_wxcharts",
        &[
            "#D2E6FF", "#A5CDFF", "#78B4FF", "#4B9BFF", "#1E78F0", "#1450C8", "#0A28A0",
            "#501EA0", "#8C28B4", "#C832C8", "#F046B4", "#FF6496", "#FF8C78", "#FFB45A",
            "#FFDC3C",
        ],
        None,
        Some("#FFFFFF"),
    ),
    (
        "temperature",
        &[
            "#19004C", "#0000FF", "#00FFFF", "#00FF00", "#FFFF00", "#FFA500", "#FF0000",
            "#8B0000",
        ],
        Some("#0A0028"),
        Some("#4B0000"),
    ),
];
