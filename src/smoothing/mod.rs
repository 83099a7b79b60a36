//! Curve fitting for traced outlines.
//!
//! A dense pixel outline is first thinned to the points where its direction
//! changes, then every span between consecutive kept points becomes a cubic
//! Bezier whose control points follow a Catmull-Rom style construction:
//!
//! 1. Take the midpoints `c1, c2, c3` of the edges p0-p1, p1-p2, p2-p3
//! 2. Split `c1-c2` and `c2-c3` in the ratio of the adjacent edge lengths,
//!    giving `m1` and `m2`
//! 3. Translate `c2` (scaled about `m1`/`m2` by the smoothing coefficient)
//!    so that `m1` lands on p1 and `m2` lands on p2
//!
//! A coefficient of 0 pins the control points to the anchors (a polygon);
//! larger values bulge further. Values above 1 overshoot on purpose.

mod path;

pub use path::{CubicSegment, PointF, SmoothedPath};

use crate::contour::Region;
use image::Rgb;

/// Reference smoothing coefficient
pub const DEFAULT_SMOOTHING: f32 = 1.5;

/// Only every n-th outline point is considered during decimation
pub const DECIMATION_STRIDE: usize = 5;

/// Points before/after a candidate used to measure its slope
const SLOPE_WINDOW: usize = 4;

/// Fit a closed curve through a region's outline, carrying `color`
///
/// Returns an empty path when fewer than two points survive decimation.
pub fn smooth(region: &Region, color: Rgb<u8>, coefficient: f32) -> SmoothedPath {
    let _span = tracing::debug_span!("smooth").entered();

    let points: Vec<PointF> = region.points().iter().map(|&p| PointF::from(p)).collect();
    let reduced = decimate(&points);

    tracing::debug!(
        "Decimated {} outline points to {}",
        points.len(),
        reduced.len()
    );

    smooth_points(&reduced, color, coefficient)
}

/// Fit a closed curve directly through `points` (no decimation)
pub fn smooth_points(points: &[PointF], color: Rgb<u8>, coefficient: f32) -> SmoothedPath {
    if points.len() < 2 {
        return SmoothedPath::empty(color);
    }

    SmoothedPath {
        start: points[0],
        segments: control_segments(points, coefficient),
        color,
    }
}

/// Thin an outline to its direction changes
///
/// The first point is always kept. After that only every
/// `DECIMATION_STRIDE`-th point is a candidate, and a candidate is kept when
/// the slope over the 4 points before it differs from the slope over the 4
/// points after it. Candidates too close to the end for a full lookahead are
/// skipped. Outlines of at most `DECIMATION_STRIDE` points are already sparse
/// and are returned unchanged.
///
/// Only candidates are ever kept: a corner that falls between two strides is
/// dropped and a nearby candidate that sees the turn is kept instead, so a
/// traced square keeps points just past its corners rather than the corners.
pub fn decimate(points: &[PointF]) -> Vec<PointF> {
    if points.len() <= DECIMATION_STRIDE {
        return points.to_vec();
    }

    let mut reduced = vec![points[0]];

    for i in (DECIMATION_STRIDE..points.len())
        .step_by(DECIMATION_STRIDE)
        .take_while(|i| i + SLOPE_WINDOW < points.len())
    {
        let ahead = slope(points[i + SLOPE_WINDOW] - points[i]);
        let behind = slope(points[i] - points[i - SLOPE_WINDOW]);

        if ahead != behind {
            reduced.push(points[i]);
        }
    }

    reduced
}

/// dy/dx, with vertical runs treated as slope 0
fn slope(d: PointF) -> f32 {
    if d.x != 0.0 {
        d.y / d.x
    } else {
        0.0
    }
}

/// `a / (a + b)`, or 0 when both lengths are 0
fn ratio(a: f32, b: f32) -> f32 {
    if a + b > 0.0 {
        a / (a + b)
    } else {
        0.0
    }
}

/// One cubic segment per point, from point i to point i+1 (wrapping)
fn control_segments(points: &[PointF], coefficient: f32) -> Vec<CubicSegment> {
    let n = points.len();

    (0..n)
        .map(|i| {
            let p0 = points[(i + n - 1) % n];
            let p1 = points[i];
            let p2 = points[(i + 1) % n];
            let p3 = points[(i + 2) % n];

            let c1 = p0.midpoint(p1);
            let c2 = p1.midpoint(p2);
            let c3 = p2.midpoint(p3);

            let len1 = p0.distance(p1);
            let len2 = p1.distance(p2);
            let len3 = p2.distance(p3);

            let k1 = ratio(len1, len2);
            let k2 = ratio(len2, len3);

            let m1 = c1 + (c2 - c1) * k1;
            let m2 = c2 + (c3 - c2) * k2;

            CubicSegment {
                ctrl1: m1 + (c2 - m1) * coefficient + p1 - m1,
                ctrl2: m2 + (c2 - m2) * coefficient + p2 - m2,
                to: p2,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::{find_regions, Point};
    use crate::segmentation::Mask;

    const EPS: f32 = 1e-4;

    fn close(a: PointF, b: PointF) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    fn triangle() -> Vec<PointF> {
        vec![
            PointF::new(0.0, 0.0),
            PointF::new(10.0, 0.0),
            PointF::new(0.0, 10.0),
        ]
    }

    #[test]
    fn test_known_control_points() {
        let path = smooth_points(&triangle(), Rgb([0, 0, 0]), 1.0);
        let first = path.segments[0];

        // c2 + p1 - m1 with m1 = (2.5, 2.5)
        assert!(close(first.ctrl1, PointF::new(2.5, -2.5)));
        // c2 + p2 - m2 with m2 = (5, 5 * 10 / (10 + 10√2))
        let k2 = 10.0 / (10.0 + 200f32.sqrt());
        assert!(close(first.ctrl2, PointF::new(10.0, -5.0 * k2)));
        assert_eq!(first.to, PointF::new(10.0, 0.0));
    }

    #[test]
    fn test_zero_coefficient_pins_controls_to_anchors() {
        let points = triangle();
        let path = smooth_points(&points, Rgb([0, 0, 0]), 0.0);

        assert_eq!(path.len(), 3);
        for (i, segment) in path.segments.iter().enumerate() {
            assert!(close(segment.ctrl1, points[i]));
            assert!(close(segment.ctrl2, points[(i + 1) % 3]));
        }
    }

    #[test]
    fn test_displacement_grows_with_coefficient() {
        let points = triangle();
        let mut last = -1.0f32;

        for coefficient in [0.0, 0.5, 1.0, 1.5, 2.0] {
            let path = smooth_points(&points, Rgb([0, 0, 0]), coefficient);
            let displacement: f32 = path
                .segments
                .iter()
                .enumerate()
                .map(|(i, s)| s.ctrl1.distance(points[i]) + s.ctrl2.distance(points[(i + 1) % 3]))
                .sum();

            assert!(displacement > last);
            last = displacement;
        }
    }

    #[test]
    fn test_path_is_closed() {
        let points = triangle();
        let path = smooth_points(&points, Rgb([1, 2, 3]), DEFAULT_SMOOTHING);

        assert_eq!(path.start, points[0]);
        assert_eq!(path.segments.last().unwrap().to, points[0]);
        assert_eq!(path.anchors().len(), 4);
        assert_eq!(path.color, Rgb([1, 2, 3]));

        // Segments pass through their anchors
        assert!(close(path.point_at(1, 0.0).unwrap(), points[1]));
        assert!(close(path.point_at(1, 1.0).unwrap(), points[2]));
    }

    #[test]
    fn test_too_few_points_give_empty_path() {
        let single = vec![PointF::new(3.0, 3.0)];
        assert!(smooth_points(&single, Rgb([0, 0, 0]), 1.5).is_empty());

        let region = Region::new(vec![Point::new(1, 1)], 1).unwrap();
        let path = smooth(&region, Rgb([0, 0, 0]), 1.5);
        assert!(path.is_empty());
        assert!(path.anchors().is_empty());
    }

    #[test]
    fn test_coincident_points_do_not_produce_nan() {
        let points = vec![PointF::new(1.0, 1.0), PointF::new(1.0, 1.0)];
        let path = smooth_points(&points, Rgb([0, 0, 0]), 1.5);

        for segment in &path.segments {
            assert!(segment.ctrl1.x.is_finite() && segment.ctrl1.y.is_finite());
            assert!(segment.ctrl2.x.is_finite() && segment.ctrl2.y.is_finite());
        }
    }

    #[test]
    fn test_decimate_drops_straight_runs() {
        let line: Vec<PointF> = (0..30).map(|x| PointF::new(x as f32, 0.0)).collect();
        assert_eq!(decimate(&line), vec![PointF::new(0.0, 0.0)]);
    }

    #[test]
    fn test_decimate_keeps_corners() {
        // Right along y = 0 to x = 10, then diagonally down-right
        let mut outline: Vec<PointF> = (0..=10).map(|x| PointF::new(x as f32, 0.0)).collect();
        outline.extend((1..=10).map(|d| PointF::new(10.0 + d as f32, d as f32)));

        let reduced = decimate(&outline);
        assert_eq!(reduced[0], PointF::new(0.0, 0.0));
        // Index 10 is the corner; 15 lies on the diagonal on both sides
        assert!(reduced.contains(&PointF::new(10.0, 0.0)));
        assert!(!reduced.contains(&PointF::new(15.0, 5.0)));
    }

    #[test]
    fn test_decimate_drops_corner_between_strides() {
        // Corner at index 12, which is not a candidate
        let mut outline: Vec<PointF> = (0..=12).map(|x| PointF::new(x as f32, 0.0)).collect();
        outline.extend((1..=10).map(|d| PointF::new(12.0 + d as f32, d as f32)));

        let reduced = decimate(&outline);
        assert!(!reduced.contains(&PointF::new(12.0, 0.0)));
        assert!(reduced.contains(&PointF::new(10.0, 0.0)));
        assert!(reduced.contains(&PointF::new(15.0, 3.0)));
    }

    #[test]
    fn test_decimate_passes_short_outlines_through() {
        assert_eq!(decimate(&triangle()), triangle());
    }

    #[test]
    fn test_smooth_traced_square() {
        let mask = Mask::from_fn(60, 60, |x, y| (20..40).contains(&x) && (20..40).contains(&y));
        let region = find_regions(&mask, 1, 10_000).remove(0);
        let path = smooth(&region, Rgb([255, 0, 0]), DEFAULT_SMOOTHING);

        assert!(path.len() >= 4);
        let bbox = region.bounding_box();
        for anchor in path.anchors() {
            assert!(bbox.contains(Point::new(anchor.x as i32, anchor.y as i32)));
        }
    }
}
