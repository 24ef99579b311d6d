//! Contour line (isoline) tracing using marching squares, with inline label
//! placement.
//!
//! Contours are traced in grid-index space (`x` = column, `y` = row) and
//! mapped to pixels by the caller. Labels are placed in pixel space so their
//! spacing does not depend on grid resolution.

use std::collections::HashMap;

use frame_common::GriddedField;

/// A point in 2D space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A line segment between two points
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A complete contour line (polyline)
#[derive(Debug, Clone)]
pub struct Contour {
    pub level: f32,
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Contour {
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }
}

/// Marching squares for one level. Cells touching a NaN are skipped.
pub fn march_squares(field: &GriddedField, level: f32) -> Vec<Segment> {
    let (width, height) = (field.nx, field.ny);
    if width < 2 || height < 2 || field.data.len() != width * height {
        return vec![];
    }

    let mut segments = Vec::new();
    for y in 0..height - 1 {
        for x in 0..width - 1 {
            let tl = field.get(y, x);
            let tr = field.get(y, x + 1);
            let bl = field.get(y + 1, x);
            let br = field.get(y + 1, x + 1);
            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut case = 0u8;
            if tl >= level { case |= 1; }
            if tr >= level { case |= 2; }
            if br >= level { case |= 4; }
            if bl >= level { case |= 8; }
            if case == 0 || case == 15 {
                continue;
            }

            let (fx, fy) = (x as f32, y as f32);
            let top = interpolate_edge(Point::new(fx, fy), Point::new(fx + 1.0, fy), tl, tr, level);
            let right = interpolate_edge(Point::new(fx + 1.0, fy), Point::new(fx + 1.0, fy + 1.0), tr, br, level);
            let bottom = interpolate_edge(Point::new(fx, fy + 1.0), Point::new(fx + 1.0, fy + 1.0), bl, br, level);
            let left = interpolate_edge(Point::new(fx, fy), Point::new(fx, fy + 1.0), tl, bl, level);

            let mut push = |start, end| segments.push(Segment { start, end });
            match case {
                1 | 14 => push(left, top),
                2 | 13 => push(top, right),
                3 | 12 => push(left, right),
                4 | 11 => push(right, bottom),
                6 | 9 => push(top, bottom),
                7 | 8 => push(left, bottom),
                5 => {
                    push(left, top);
                    push(right, bottom);
                }
                10 => {
                    push(top, right);
                    push(left, bottom);
                }
                _ => {}
            }
        }
    }

    segments
}

/// Where `level` crosses the edge between `p1` (value `v1`) and `p2` (value `v2`).
fn interpolate_edge(p1: Point, p2: Point, v1: f32, v2: f32, level: f32) -> Point {
    if (v2 - v1).abs() < 1e-6 {
        return Point::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0);
    }
    let t = ((level - v1) / (v2 - v1)).clamp(0.0, 1.0);
    Point::new(p1.x + t * (p2.x - p1.x), p1.y + t * (p2.y - p1.y))
}

/// Endpoint key; marching squares emits bit-identical shared edge points.
fn key(p: &Point) -> (u32, u32) {
    (p.x.to_bits(), p.y.to_bits())
}

/// Join unordered segments into polylines, extending both ends.
pub fn connect_segments(segments: &[Segment], level: f32) -> Vec<Contour> {
    let mut by_endpoint: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
    for (i, seg) in segments.iter().enumerate() {
        by_endpoint.entry(key(&seg.start)).or_default().push(i);
        by_endpoint.entry(key(&seg.end)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut contours = Vec::new();

    // Follow unused segments from `tip`, appending the far endpoint each step.
    let walk = |tip: Point, used: &mut Vec<bool>| -> Vec<Point> {
        let mut out = Vec::new();
        let mut tip = tip;
        loop {
            let next = by_endpoint
                .get(&key(&tip))
                .and_then(|ids| ids.iter().copied().find(|&i| !used[i]));
            let Some(i) = next else { break };
            used[i] = true;
            let seg = segments[i];
            tip = if key(&seg.start) == key(&tip) { seg.end } else { seg.start };
            out.push(tip);
        }
        out
    };

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let seg = segments[start];

        let forward = walk(seg.end, &mut used);
        let backward = walk(seg.start, &mut used);

        let mut points: Vec<Point> = backward.into_iter().rev().collect();
        points.push(seg.start);
        points.push(seg.end);
        points.extend(forward);

        let closed = points.len() > 2 && key(&points[0]) == key(&points[points.len() - 1]);
        if closed {
            points.pop();
        }
        contours.push(Contour { level, points, closed });
    }

    contours
}

/// Chaikin corner cutting; open contours keep their endpoints.
pub fn smooth_contour(contour: &Contour, iterations: u32) -> Contour {
    if iterations == 0 || contour.points.len() < 3 {
        return contour.clone();
    }

    let mut points = contour.points.clone();
    for _ in 0..iterations {
        let n = points.len();
        let pairs = if contour.closed { n } else { n - 1 };
        let mut next = Vec::with_capacity(pairs * 2 + 2);
        if !contour.closed {
            next.push(points[0]);
        }
        for i in 0..pairs {
            let p1 = points[i];
            let p2 = points[(i + 1) % n];
            next.push(Point::new(0.75 * p1.x + 0.25 * p2.x, 0.75 * p1.y + 0.25 * p2.y));
            next.push(Point::new(0.25 * p1.x + 0.75 * p2.x, 0.25 * p1.y + 0.75 * p2.y));
        }
        if !contour.closed {
            next.push(points[n - 1]);
        }
        points = next;
    }

    Contour {
        level: contour.level,
        points,
        closed: contour.closed,
    }
}

/// Trace every level of `levels`, optionally smoothing the polylines.
pub fn trace_contours(field: &GriddedField, levels: &[f32], smoothing_passes: u32) -> Vec<Contour> {
    let mut all = Vec::new();
    for &level in levels {
        let segments = march_squares(field, level);
        for contour in connect_segments(&segments, level) {
            all.push(smooth_contour(&contour, smoothing_passes));
        }
    }

    tracing::trace!(
        levels = levels.len(),
        contours = all.len(),
        points = all.iter().map(|c| c.points.len()).sum::<usize>(),
        "traced contours"
    );
    all
}

/// Position and rotation of an inline contour label, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPosition {
    pub x: f32,
    pub y: f32,
    /// Rotation in degrees, kept within ±90 so text is never upside down
    pub angle: f32,
    pub level: f32,
}

/// Inline label placement settings, in pixels.
#[derive(Debug, Clone, Copy)]
pub struct LabelPlacement {
    pub spacing: f32,
    pub font_size: f32,
    /// Labels must stay inside this box: (left, top, right, bottom)
    pub bounds: (f32, f32, f32, f32),
}

/// Spread labels evenly along pixel-space contours, skipping positions too
/// close to the bounds or to a label already placed.
pub fn place_labels(contours: &[Contour], placement: &LabelPlacement) -> Vec<LabelPosition> {
    let mut positions: Vec<LabelPosition> = Vec::new();
    let margin = placement.font_size * 2.0;
    let min_distance = placement.font_size * 4.0;
    let (left, top, right, bottom) = placement.bounds;

    for contour in contours {
        let total = contour.length();
        if total < placement.spacing * 0.5 {
            continue;
        }

        let count = ((total / placement.spacing).floor() as usize).max(1);
        let step = total / (count as f32 + 1.0);
        let mut next_at = step;
        let mut placed = 0;
        let mut walked = 0.0;

        for w in contour.points.windows(2) {
            let (p1, p2) = (w[0], w[1]);
            let (dx, dy) = (p2.x - p1.x, p2.y - p1.y);
            let seg_len = (dx * dx + dy * dy).sqrt();

            while placed < count && walked + seg_len >= next_at && seg_len > 0.0 {
                let t = (next_at - walked) / seg_len;
                let (x, y) = (p1.x + t * dx, p1.y + t * dy);
                next_at += step;
                placed += 1;

                let inside = x > left + margin && x < right - margin && y > top + margin && y < bottom - margin;
                let crowded = positions
                    .iter()
                    .any(|p| (p.x - x).powi(2) + (p.y - y).powi(2) < min_distance * min_distance);
                if !inside || crowded {
                    continue;
                }

                let mut angle = dy.atan2(dx).to_degrees();
                if angle > 90.0 {
                    angle -= 180.0;
                } else if angle < -90.0 {
                    angle += 180.0;
                }
                positions.push(LabelPosition {
                    x,
                    y,
                    angle,
                    level: contour.level,
                });
            }
            walked += seg_len;
        }
    }

    positions
}
