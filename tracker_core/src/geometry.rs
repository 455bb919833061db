//! Planar geometry helpers shared by the tracker and the zone logic.
//!
//! # Containment rule
//! `point_in_polygon` is boundary-inclusive: a point lying on an edge or a
//! vertex is inside. Interior points use the even-odd crossing rule, so
//! self-intersecting polygons behave like the usual scanline fill.

use crate::types::Point;

/// Tolerance for the on-edge test, in pixels.
const EDGE_EPS: f64 = 1e-9;

/// Euclidean distance between two points.
pub fn distance(p: &Point, q: &Point) -> f64 {
    nalgebra::distance(p, q)
}

/// True if `point` lies inside or on the boundary of `polygon`.
///
/// Polygons with fewer than 3 vertices contain nothing.
pub fn point_in_polygon(point: &Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    if on_boundary(point, polygon) {
        return true;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (&polygon[i], &polygon[j]);
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_boundary(point: &Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    (0..n).any(|i| on_segment(point, &polygon[i], &polygon[(i + 1) % n]))
}

fn on_segment(p: &Point, a: &Point, b: &Point) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    if cross.abs() > EDGE_EPS * (1.0 + distance(a, b)) {
        return false;
    }
    p.x >= a.x.min(b.x) - EDGE_EPS
        && p.x <= a.x.max(b.x) + EDGE_EPS
        && p.y >= a.y.min(b.y) - EDGE_EPS
        && p.y <= a.y.max(b.y) + EDGE_EPS
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
        ]
    }

    #[test]
    fn distance_is_euclidean() {
        assert_relative_eq!(distance(&Point::new(0.0, 0.0), &Point::new(3.0, 4.0)), 5.0);
        assert_relative_eq!(distance(&Point::new(2.0, 2.0), &Point::new(2.0, 2.0)), 0.0);
    }

    #[test]
    fn square_inside_outside() {
        let sq = square();
        assert!(point_in_polygon(&Point::new(5.0, 5.0), &sq));
        assert!(!point_in_polygon(&Point::new(15.0, 15.0), &sq));
        assert!(!point_in_polygon(&Point::new(-0.5, 5.0), &sq));
    }

    #[test]
    fn boundary_is_inside_and_stable() {
        let sq = square();
        for _ in 0..10 {
            assert!(point_in_polygon(&Point::new(0.0, 5.0), &sq));
        }
        assert!(point_in_polygon(&Point::new(10.0, 5.0), &sq), "right edge");
        assert!(point_in_polygon(&Point::new(5.0, 10.0), &sq), "top edge");
        assert!(point_in_polygon(&Point::new(10.0, 10.0), &sq), "vertex");
    }

    #[test]
    fn concave_polygon_notch_is_outside() {
        // U shape: notch between x=4..6 above y=4
        let u = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(6.0, 10.0),
            Point::new(6.0, 4.0),
            Point::new(4.0, 4.0),
            Point::new(4.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(!point_in_polygon(&Point::new(5.0, 8.0), &u));
        assert!(point_in_polygon(&Point::new(2.0, 8.0), &u));
        assert!(point_in_polygon(&Point::new(5.0, 2.0), &u));
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        let line = vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)];
        assert!(!point_in_polygon(&Point::new(5.0, 5.0), &line));
        assert!(!point_in_polygon(&Point::new(0.0, 0.0), &[]));
    }
}
