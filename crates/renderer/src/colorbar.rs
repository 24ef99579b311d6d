//! Horizontal colorbars drawn once per figure as persistent decorations.

use crate::canvas::{PixelRect, Primitive, TextSpec};
use crate::colormap::{Bin, Color, LevelColormap};
use crate::glyphs::{self, HAlign, VAlign};
use crate::labels::format_tick;

const BAR_HEIGHT: f32 = 14.0;
const TICK_SIZE: f32 = 9.0;
const TITLE_SIZE: f32 = 10.0;
const GAP: f32 = 24.0;

/// Split the colorbar strip into `count` side-by-side slots.
pub fn slots(strip: PixelRect, count: usize) -> Vec<PixelRect> {
    if count == 0 {
        return Vec::new();
    }
    let width = (strip.width - GAP * (count - 1) as f32) / count as f32;
    (0..count)
        .map(|i| PixelRect {
            left: strip.left + i as f32 * (width + GAP),
            top: strip.top,
            width,
            height: strip.height,
        })
        .collect()
}

/// Every `stride`-th level gets a tick label so neighbours never overlap.
pub fn tick_stride(levels: &[f32], bar_width: f32, size: f32) -> usize {
    if levels.len() < 2 {
        return 1;
    }
    let spacing = bar_width / (levels.len() - 1) as f32;
    let widest = levels
        .iter()
        .map(|&l| glyphs::text_width(&format_tick(l), size))
        .fold(0.0f32, f32::max);
    let needed = widest + size * 0.6;
    ((needed / spacing).ceil() as usize).max(1)
}

/// Primitives for one colorbar inside `slot`.
///
/// Bins are drawn as equal-width swatches. Under/over colors, when the
/// colormap extends past its levels, become triangles at either end.
pub fn colorbar(cmap: &LevelColormap, title: &str, slot: PixelRect) -> Vec<Primitive> {
    let levels = cmap.levels().values();
    let bins = cmap.levels().bin_count();
    let outline = Color::rgb(60, 60, 60);

    let tip = BAR_HEIGHT;
    let (under, over) = cmap.extension_colors();
    let bar_left = slot.left + if under.is_some() { tip } else { 0.0 };
    let bar_right = slot.right() - if over.is_some() { tip } else { 0.0 };
    let bar_width = (bar_right - bar_left).max(1.0);
    let top = slot.top + 8.0;
    let swatch = bar_width / bins as f32;

    let mut out = Vec::with_capacity(bins + levels.len() + 4);
    for i in 0..bins {
        out.push(Primitive::Rect {
            x: bar_left + i as f32 * swatch,
            y: top,
            width: swatch + 0.5,
            height: BAR_HEIGHT,
            fill: cmap.table.color_for_bin(Bin::Index(i)),
            outline: None,
        });
    }

    let mid = top + BAR_HEIGHT / 2.0;
    if let Some(under) = under {
        out.push(Primitive::Polygon {
            points: vec![(bar_left, top), (bar_left - tip, mid), (bar_left, top + BAR_HEIGHT)],
            fill: under,
            outline: Some(outline),
        });
    }
    if let Some(over) = over {
        out.push(Primitive::Polygon {
            points: vec![(bar_right, top), (bar_right + tip, mid), (bar_right, top + BAR_HEIGHT)],
            fill: over,
            outline: Some(outline),
        });
    }
    out.push(Primitive::Rect {
        x: bar_left,
        y: top,
        width: bar_width,
        height: BAR_HEIGHT,
        fill: Color::transparent(),
        outline: Some(outline),
    });

    let stride = tick_stride(levels, bar_width, TICK_SIZE);
    for (i, &level) in levels.iter().enumerate().step_by(stride) {
        let x = bar_left + i as f32 * swatch;
        out.push(Primitive::Polyline {
            points: vec![(x, top + BAR_HEIGHT), (x, top + BAR_HEIGHT + 3.0)],
            closed: false,
            color: outline,
            width: 1.0,
        });
        out.push(Primitive::Text(
            TextSpec::new(x, top + BAR_HEIGHT + 5.0, format_tick(level), TICK_SIZE, Color::BLACK)
                .aligned(HAlign::Center, VAlign::Top),
        ));
    }

    if !title.is_empty() {
        out.push(Primitive::Text(
            TextSpec::new(
                bar_left + bar_width / 2.0,
                top + BAR_HEIGHT + 10.0 + TICK_SIZE,
                title,
                TITLE_SIZE,
                Color::BLACK,
            )
            .aligned(HAlign::Center, VAlign::Top)
            .bold(),
        ));
    }

    out
}
