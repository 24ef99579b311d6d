//! Stroke font for labels and annotations.
//!
//! Every glyph is a handful of polylines in a unit box (x right, y down,
//! baseline at y = 1). Lowercase letters are drawn with the uppercase shapes.
//! No font files are needed, so frames render identically everywhere.

use tiny_skia::{Path, PathBuilder};

/// Cap height as a fraction of the font size.
pub const CAP_HEIGHT: f32 = 0.72;
/// Glyph box width as a fraction of the font size.
pub const GLYPH_WIDTH: f32 = 0.5;
/// Horizontal advance per character as a fraction of the font size.
pub const ADVANCE: f32 = 0.68;

type Stroke = &'static [(f32, f32)];

const O_RING: Stroke = &[
    (0.2, 0.0), (0.8, 0.0), (1.0, 0.2), (1.0, 0.8), (0.8, 1.0), (0.2, 1.0), (0.0, 0.8), (0.0, 0.2),
    (0.2, 0.0),
];
const P_BOWL: Stroke = &[(0.0, 1.0), (0.0, 0.0), (0.8, 0.0), (1.0, 0.15), (1.0, 0.4), (0.8, 0.55), (0.0, 0.55)];

/// Strokes for a character; unknown characters render as blank space.
pub fn glyph(ch: char) -> &'static [Stroke] {
    match ch.to_ascii_uppercase() {
        'A' => &[&[(0.0, 1.0), (0.5, 0.0), (1.0, 1.0)], &[(0.2, 0.6), (0.8, 0.6)]],
        'B' => &[
            &[(0.0, 0.0), (0.0, 1.0), (0.75, 1.0), (1.0, 0.85), (1.0, 0.65), (0.75, 0.5), (0.0, 0.5)],
            &[(0.0, 0.0), (0.7, 0.0), (0.9, 0.12), (0.9, 0.38), (0.7, 0.5)],
        ],
        'C' => &[&[(1.0, 0.1), (0.8, 0.0), (0.2, 0.0), (0.0, 0.2), (0.0, 0.8), (0.2, 1.0), (0.8, 1.0), (1.0, 0.9)]],
        'D' => &[&[(0.0, 0.0), (0.0, 1.0), (0.6, 1.0), (1.0, 0.75), (1.0, 0.25), (0.6, 0.0), (0.0, 0.0)]],
        'E' => &[&[(1.0, 0.0), (0.0, 0.0), (0.0, 1.0), (1.0, 1.0)], &[(0.0, 0.5), (0.7, 0.5)]],
        'F' => &[&[(1.0, 0.0), (0.0, 0.0), (0.0, 1.0)], &[(0.0, 0.5), (0.7, 0.5)]],
        'G' => &[&[
            (1.0, 0.1), (0.8, 0.0), (0.2, 0.0), (0.0, 0.2), (0.0, 0.8), (0.2, 1.0), (0.8, 1.0), (1.0, 0.8),
            (1.0, 0.55), (0.55, 0.55),
        ]],
        'H' => &[&[(0.0, 0.0), (0.0, 1.0)], &[(1.0, 0.0), (1.0, 1.0)], &[(0.0, 0.5), (1.0, 0.5)]],
        'I' => &[&[(0.2, 0.0), (0.8, 0.0)], &[(0.5, 0.0), (0.5, 1.0)], &[(0.2, 1.0), (0.8, 1.0)]],
        'J' => &[&[(1.0, 0.0), (1.0, 0.8), (0.8, 1.0), (0.2, 1.0), (0.0, 0.8)]],
        'K' => &[&[(0.0, 0.0), (0.0, 1.0)], &[(1.0, 0.0), (0.0, 0.6)], &[(0.3, 0.4), (1.0, 1.0)]],
        'L' => &[&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]],
        'M' => &[&[(0.0, 1.0), (0.0, 0.0), (0.5, 0.55), (1.0, 0.0), (1.0, 1.0)]],
        'N' => &[&[(0.0, 1.0), (0.0, 0.0), (1.0, 1.0), (1.0, 0.0)]],
        'O' => &[O_RING],
        'P' => &[P_BOWL],
        'Q' => &[O_RING, &[(0.6, 0.7), (1.0, 1.05)]],
        'R' => &[P_BOWL, &[(0.5, 0.55), (1.0, 1.0)]],
        'S' => &[&[
            (1.0, 0.1), (0.8, 0.0), (0.2, 0.0), (0.0, 0.15), (0.0, 0.35), (0.2, 0.5), (0.8, 0.5), (1.0, 0.65),
            (1.0, 0.85), (0.8, 1.0), (0.2, 1.0), (0.0, 0.9),
        ]],
        'T' => &[&[(0.0, 0.0), (1.0, 0.0)], &[(0.5, 0.0), (0.5, 1.0)]],
        'U' => &[&[(0.0, 0.0), (0.0, 0.8), (0.2, 1.0), (0.8, 1.0), (1.0, 0.8), (1.0, 0.0)]],
        'V' => &[&[(0.0, 0.0), (0.5, 1.0), (1.0, 0.0)]],
        'W' => &[&[(0.0, 0.0), (0.25, 1.0), (0.5, 0.45), (0.75, 1.0), (1.0, 0.0)]],
        'X' => &[&[(0.0, 0.0), (1.0, 1.0)], &[(1.0, 0.0), (0.0, 1.0)]],
        'Y' => &[&[(0.0, 0.0), (0.5, 0.5), (1.0, 0.0)], &[(0.5, 0.5), (0.5, 1.0)]],
        'Z' => &[&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]],
        '0' => &[O_RING, &[(0.8, 0.2), (0.2, 0.8)]],
        '1' => &[&[(0.25, 0.2), (0.55, 0.0), (0.55, 1.0)], &[(0.25, 1.0), (0.85, 1.0)]],
        '2' => &[&[(0.0, 0.2), (0.2, 0.0), (0.8, 0.0), (1.0, 0.2), (1.0, 0.4), (0.0, 1.0), (1.0, 1.0)]],
        '3' => &[
            &[(0.0, 0.1), (0.2, 0.0), (0.8, 0.0), (1.0, 0.15), (1.0, 0.35), (0.8, 0.5), (0.3, 0.5)],
            &[(0.8, 0.5), (1.0, 0.65), (1.0, 0.85), (0.8, 1.0), (0.2, 1.0), (0.0, 0.9)],
        ],
        '4' => &[&[(0.8, 1.0), (0.8, 0.0), (0.0, 0.7), (1.0, 0.7)]],
        '5' => &[&[
            (1.0, 0.0), (0.0, 0.0), (0.0, 0.45), (0.7, 0.45), (1.0, 0.6), (1.0, 0.85), (0.8, 1.0), (0.2, 1.0),
            (0.0, 0.9),
        ]],
        '6' => &[&[
            (0.9, 0.0), (0.4, 0.0), (0.0, 0.4), (0.0, 0.85), (0.2, 1.0), (0.8, 1.0), (1.0, 0.85), (1.0, 0.6),
            (0.8, 0.45), (0.2, 0.45), (0.0, 0.6),
        ]],
        '7' => &[&[(0.0, 0.0), (1.0, 0.0), (0.35, 1.0)]],
        '8' => &[
            &[(0.2, 0.0), (0.8, 0.0), (1.0, 0.15), (1.0, 0.35), (0.8, 0.5), (0.2, 0.5), (0.0, 0.35), (0.0, 0.15), (0.2, 0.0)],
            &[(0.2, 0.5), (0.0, 0.65), (0.0, 0.85), (0.2, 1.0), (0.8, 1.0), (1.0, 0.85), (1.0, 0.65), (0.8, 0.5)],
        ],
        '9' => &[&[
            (1.0, 0.4), (0.8, 0.55), (0.2, 0.55), (0.0, 0.4), (0.0, 0.15), (0.2, 0.0), (0.8, 0.0), (1.0, 0.15),
            (1.0, 0.6), (0.6, 1.0), (0.1, 1.0),
        ]],
        '-' => &[&[(0.2, 0.5), (0.8, 0.5)]],
        '+' => &[&[(0.2, 0.5), (0.8, 0.5)], &[(0.5, 0.2), (0.5, 0.8)]],
        '=' => &[&[(0.15, 0.35), (0.85, 0.35)], &[(0.15, 0.65), (0.85, 0.65)]],
        '.' => &[&[(0.45, 0.93), (0.55, 0.93), (0.55, 1.0), (0.45, 1.0), (0.45, 0.93)]],
        ',' => &[&[(0.55, 0.9), (0.55, 1.0), (0.4, 1.15)]],
        ':' => &[
            &[(0.45, 0.28), (0.55, 0.28), (0.55, 0.35), (0.45, 0.35), (0.45, 0.28)],
            &[(0.45, 0.93), (0.55, 0.93), (0.55, 1.0), (0.45, 1.0), (0.45, 0.93)],
        ],
        '/' => &[&[(0.0, 1.0), (1.0, 0.0)]],
        '(' => &[&[(0.7, 0.0), (0.4, 0.25), (0.4, 0.75), (0.7, 1.0)]],
        ')' => &[&[(0.3, 0.0), (0.6, 0.25), (0.6, 0.75), (0.3, 1.0)]],
        '[' => &[&[(0.7, 0.0), (0.35, 0.0), (0.35, 1.0), (0.7, 1.0)]],
        ']' => &[&[(0.3, 0.0), (0.65, 0.0), (0.65, 1.0), (0.3, 1.0)]],
        '_' => &[&[(0.0, 1.05), (1.0, 1.05)]],
        '%' => &[
            &[(0.0, 1.0), (1.0, 0.0)],
            &[(0.05, 0.05), (0.3, 0.05), (0.3, 0.3), (0.05, 0.3), (0.05, 0.05)],
            &[(0.7, 0.7), (0.95, 0.7), (0.95, 0.95), (0.7, 0.95), (0.7, 0.7)],
        ],
        '@' => &[&[
            (0.7, 0.65), (0.7, 0.35), (0.4, 0.35), (0.4, 0.65), (0.7, 0.65), (0.9, 0.65), (1.0, 0.5), (1.0, 0.2),
            (0.8, 0.0), (0.2, 0.0), (0.0, 0.2), (0.0, 0.8), (0.2, 1.0), (0.9, 1.0),
        ]],
        _ => &[],
    }
}

/// Horizontal placement of text relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical placement of text relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Width of `text` rendered at `size` pixels.
pub fn text_width(text: &str, size: f32) -> f32 {
    let n = text.chars().count();
    if n == 0 {
        return 0.0;
    }
    (n - 1) as f32 * ADVANCE * size + GLYPH_WIDTH * size
}

/// Height of a line of text rendered at `size` pixels.
pub fn text_height(size: f32) -> f32 {
    CAP_HEIGHT * size
}

/// Outline of `text` anchored at `(x, y)`. `None` if nothing is drawable.
pub fn text_path(text: &str, x: f32, y: f32, size: f32, h: HAlign, v: VAlign) -> Option<Path> {
    let width = text_width(text, size);
    let height = text_height(size);
    let left = match h {
        HAlign::Left => x,
        HAlign::Center => x - width / 2.0,
        HAlign::Right => x - width,
    };
    let top = match v {
        VAlign::Top => y,
        VAlign::Middle => y - height / 2.0,
        VAlign::Bottom => y - height,
    };

    let glyph_w = GLYPH_WIDTH * size;
    let mut pb = PathBuilder::new();
    for (i, ch) in text.chars().enumerate() {
        let origin_x = left + i as f32 * ADVANCE * size;
        for stroke in glyph(ch) {
            let mut points = stroke.iter();
            if let Some(&(px, py)) = points.next() {
                pb.move_to(origin_x + px * glyph_w, top + py * height);
                for &(px, py) in points {
                    pb.line_to(origin_x + px * glyph_w, top + py * height);
                }
            }
        }
    }
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_uses_uppercase_shapes() {
        assert_eq!(glyph('h').len(), glyph('H').len());
        assert!(glyph(' ').is_empty());
        assert!(glyph('~').is_empty());
    }

    #[test]
    fn test_text_width_grows_with_length() {
        assert_eq!(text_width("", 10.0), 0.0);
        assert!(text_width("1013", 10.0) > text_width("999", 10.0));
    }

    #[test]
    fn test_text_path_blank_is_none() {
        assert!(text_path("   ", 0.0, 0.0, 10.0, HAlign::Left, VAlign::Top).is_none());
        assert!(text_path("H", 10.0, 10.0, 12.0, HAlign::Center, VAlign::Middle).is_some());
    }
}
