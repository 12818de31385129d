#![forbid(unsafe_code)]

//! Geometry aliases and the small set of polyline/segment helpers the
//! reconstruction stages share.

pub type Unit = euclid::UnknownUnit;

pub type Point = euclid::Point2D<f64, Unit>;
pub type Vector = euclid::Vector2D<f64, Unit>;
pub type Size = euclid::Size2D<f64, Unit>;
pub type Rect = euclid::Rect<f64, Unit>;
pub type Transform = euclid::Transform2D<f64, Unit, Unit>;

pub fn point(x: f64, y: f64) -> Point {
    euclid::point2(x, y)
}

pub fn vector(x: f64, y: f64) -> Vector {
    euclid::vec2(x, y)
}

/// Total length of a polyline (0.0 for fewer than two points).
pub fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| (w[1] - w[0]).length()).sum()
}

/// Arithmetic centroid of a point sequence.
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return point(0.0, 0.0);
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    point(sx / n, sy / n)
}

/// Closest point to `p` on segment `a`..`b`.
pub fn nearest_point_on_segment(p: Point, a: Point, b: Point) -> Point {
    let ab = b - a;
    let len_sq = ab.square_length();
    if len_sq <= f64::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Shortest distance from `p` to any segment of `points`.
///
/// A single-point polyline degenerates to point distance; an empty one
/// yields infinity so it never wins a nearest-element search.
pub fn distance_to_polyline(p: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (p - *only).length(),
        _ => points
            .windows(2)
            .map(|w| (p - nearest_point_on_segment(p, w[0], w[1])).length())
            .fold(f64::INFINITY, f64::min),
    }
}

/// Intersection of segments `a1`..`a2` and `b1`..`b2`, endpoints inclusive.
///
/// Collinear overlaps return `None`; pipe runs that share a bearing are the
/// stitching stage's business, not a junction.
pub fn segment_intersection(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<Point> {
    let r = a2 - a1;
    let s = b2 - b1;
    let denom = r.cross(s);
    if denom.abs() <= f64::EPSILON {
        return None;
    }
    let qp = b1 - a1;
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a1 + r * t)
    } else {
        None
    }
}

/// Axis-aligned bounding box of a point sequence, `None` when empty.
pub fn bounding_rect(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Rect::new(
        point(min_x, min_y),
        Size::new(max_x - min_x, max_y - min_y),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polyline_length_sums_segments() {
        let pts = [point(0.0, 0.0), point(3.0, 0.0), point(3.0, 4.0)];
        assert!((polyline_length(&pts) - 7.0).abs() < 1e-12);
        assert_eq!(polyline_length(&pts[..1]), 0.0);
    }

    #[test]
    fn nearest_point_clamps_to_endpoints() {
        let a = point(0.0, 0.0);
        let b = point(10.0, 0.0);
        assert_eq!(nearest_point_on_segment(point(-5.0, 3.0), a, b), a);
        assert_eq!(nearest_point_on_segment(point(15.0, 3.0), a, b), b);
        let mid = nearest_point_on_segment(point(5.0, 3.0), a, b);
        assert!((mid.x - 5.0).abs() < 1e-12 && mid.y.abs() < 1e-12);
    }

    #[test]
    fn crossing_segments_intersect() {
        let p = segment_intersection(
            point(0.0, 0.0),
            point(10.0, 10.0),
            point(0.0, 10.0),
            point(10.0, 0.0),
        )
        .unwrap();
        assert!((p.x - 5.0).abs() < 1e-12 && (p.y - 5.0).abs() < 1e-12);
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        assert!(
            segment_intersection(
                point(0.0, 0.0),
                point(10.0, 0.0),
                point(0.0, 1.0),
                point(10.0, 1.0),
            )
            .is_none()
        );
        // Collinear overlap is not a junction either.
        assert!(
            segment_intersection(
                point(0.0, 0.0),
                point(10.0, 0.0),
                point(5.0, 0.0),
                point(15.0, 0.0),
            )
            .is_none()
        );
    }

    #[test]
    fn disjoint_segments_do_not_intersect() {
        assert!(
            segment_intersection(
                point(0.0, 0.0),
                point(1.0, 1.0),
                point(5.0, 0.0),
                point(6.0, 1.0),
            )
            .is_none()
        );
    }
}
