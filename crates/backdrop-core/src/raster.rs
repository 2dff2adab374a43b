//! Antialiased drawing primitives on [`PixelBuffer`]s.
//!
//! All coordinates are in backing pixels.
//! Pixel `(x, y)` covers the square from `(x, y)` to `(x + 1, y + 1)`
//! and is sampled at its center.

use crate::{
    buffer::{BlendMode, PixelBuffer},
    color::Rgb,
    Vec2,
};

/// Pixel index range covering `[lo, hi]`, clipped to `[0, len)`.
fn span(lo: f64, hi: f64, len: usize) -> std::ops::Range<i64> {
    let start = lo.floor().max(0.0) as i64;
    let end = (hi.ceil() as i64).min(len as i64);
    start..end.max(start)
}

/// Distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Draw a line segment of the given width.
pub fn line(
    buf: &mut PixelBuffer,
    a: Vec2,
    b: Vec2,
    width: f64,
    color: Rgb,
    alpha: f64,
    mode: BlendMode,
) {
    let half = width.max(0.0) / 2.0;
    let pad = half + 1.0;
    let xs = span(a.x.min(b.x) - pad, a.x.max(b.x) + pad, buf.width());
    let ys = span(a.y.min(b.y) - pad, a.y.max(b.y) + pad, buf.height());
    for y in ys {
        for x in xs.clone() {
            let center = Vec2::new(x as f64 + 0.5, y as f64 + 0.5);
            let d = distance_to_segment(center, a, b);
            // one pixel of linear falloff at the edge
            let coverage = (half + 0.5 - d).clamp(0.0, 1.0);
            if coverage > 0.0 {
                buf.blend(x, y, color, alpha * coverage, mode);
            }
        }
    }
}

/// Draw a connected sequence of line segments.
///
/// Each pixel is shaded once, by the closest segment,
/// so overlapping joints don't get darker.
pub fn polyline(
    buf: &mut PixelBuffer,
    points: &[Vec2],
    width: f64,
    color: Rgb,
    alpha: f64,
    mode: BlendMode,
) {
    match points {
        [] => {}
        [p] => disc(buf, *p, width / 2.0, color, alpha, mode),
        _ => {
            let half = width.max(0.0) / 2.0;
            let pad = half + 1.0;
            let (min, max) = points.iter().fold(
                (Vec2::repeat(f64::INFINITY), Vec2::repeat(f64::NEG_INFINITY)),
                |(min, max), p| (min.inf(p), max.sup(p)),
            );
            let xs = span(min.x - pad, max.x + pad, buf.width());
            let ys = span(min.y - pad, max.y + pad, buf.height());
            for y in ys {
                for x in xs.clone() {
                    let center = Vec2::new(x as f64 + 0.5, y as f64 + 0.5);
                    let d = points
                        .windows(2)
                        .map(|seg| distance_to_segment(center, seg[0], seg[1]))
                        .fold(f64::INFINITY, f64::min);
                    let coverage = (half + 0.5 - d).clamp(0.0, 1.0);
                    if coverage > 0.0 {
                        buf.blend(x, y, color, alpha * coverage, mode);
                    }
                }
            }
        }
    }
}

/// Draw a filled circle with an antialiased edge.
pub fn disc(
    buf: &mut PixelBuffer,
    center: Vec2,
    radius: f64,
    color: Rgb,
    alpha: f64,
    mode: BlendMode,
) {
    radial(buf, center, radius + 0.5, mode, |d| {
        let coverage = (radius + 0.5 - d).clamp(0.0, 1.0);
        (coverage > 0.0).then_some((color, alpha * coverage))
    });
}

/// Draw a circle fading linearly from `alpha` at the center
/// to transparent at `radius`.
pub fn soft_disc(
    buf: &mut PixelBuffer,
    center: Vec2,
    radius: f64,
    color: Rgb,
    alpha: f64,
    mode: BlendMode,
) {
    if radius <= 0.0 {
        return;
    }
    radial(buf, center, radius, mode, |d| {
        let falloff = 1.0 - d / radius;
        (falloff > 0.0).then_some((color, alpha * falloff))
    });
}

/// Shade every pixel within `radius` of `center`
/// with a color depending on the distance from the center.
pub fn radial(
    buf: &mut PixelBuffer,
    center: Vec2,
    radius: f64,
    mode: BlendMode,
    shade: impl Fn(f64) -> Option<(Rgb, f64)>,
) {
    let xs = span(center.x - radius, center.x + radius, buf.width());
    let ys = span(center.y - radius, center.y + radius, buf.height());
    for y in ys {
        for x in xs.clone() {
            let d = (Vec2::new(x as f64 + 0.5, y as f64 + 0.5) - center).norm();
            if d > radius {
                continue;
            }
            if let Some((color, alpha)) = shade(d) {
                buf.blend(x, y, color, alpha, mode);
            }
        }
    }
}

/// Fill the axis-aligned rectangle from `min` to `max`.
/// Pixels are covered if their center is inside.
pub fn rect(buf: &mut PixelBuffer, min: Vec2, max: Vec2, color: Rgb, alpha: f64, mode: BlendMode) {
    let centers = |lo: f64, hi: f64, len: usize| {
        let start = (lo - 0.5).ceil().max(0.0) as i64;
        let end = ((hi - 0.5).ceil() as i64).min(len as i64);
        start..end.max(start)
    };
    let xs = centers(min.x, max.x, buf.width());
    let ys = centers(min.y, max.y, buf.height());
    for y in ys {
        for x in xs.clone() {
            buf.blend(x, y, color, alpha, mode);
        }
    }
}

/// Fill a closed polygon (even-odd rule),
/// shading each covered pixel by its center position.
pub fn fill_polygon(
    buf: &mut PixelBuffer,
    points: &[Vec2],
    mode: BlendMode,
    shade: impl Fn(Vec2) -> (Rgb, f64),
) {
    if points.len() < 3 {
        return;
    }
    let (min_y, max_y) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });
    let mut crossings = Vec::new();
    for y in span(min_y, max_y, buf.height()) {
        let sample_y = y as f64 + 0.5;
        crossings.clear();
        let edges = points.iter().zip(points.iter().cycle().skip(1));
        for (a, b) in edges {
            if (a.y <= sample_y) != (b.y <= sample_y) {
                let t = (sample_y - a.y) / (b.y - a.y);
                crossings.push(a.x + (b.x - a.x) * t);
            }
        }
        crossings.sort_by(f64::total_cmp);
        for pair in crossings.chunks_exact(2) {
            // pixel centers inside [pair[0], pair[1]]
            for x in span(pair[0] - 0.5, pair[1] - 0.5, buf.width()) {
                let center = Vec2::new(x as f64 + 0.5, sample_y);
                if center.x < pair[0] || center.x > pair[1] {
                    continue;
                }
                let (color, alpha) = shade(center);
                buf.blend(x, y, color, alpha, mode);
            }
        }
    }
}
