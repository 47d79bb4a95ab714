//! Polygon containment

use crate::point::Point2;

const EDGE_TOLERANCE: f64 = 1e-9;

/// Boundary-inclusive point-in-polygon test (even-odd ray cast).
///
/// Polygons with fewer than three vertices contain nothing.
pub fn polygon_contains(points: &[Point2], p: Point2) -> bool {
    if points.len() < 3 {
        return false;
    }

    // Points exactly on an edge count as inside
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        if on_segment(a, b, p) {
            return true;
        }
    }

    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (pi, pj) = (points[i], points[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = pi.x + (p.y - pi.y) * (pj.x - pi.x) / (pj.y - pi.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_segment(a: Point2, b: Point2, p: Point2) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    if cross.abs() > EDGE_TOLERANCE * (1.0 + a.distance_to(b)) {
        return false;
    }
    p.x >= a.x.min(b.x) - EDGE_TOLERANCE
        && p.x <= a.x.max(b.x) + EDGE_TOLERANCE
        && p.y >= a.y.min(b.y) - EDGE_TOLERANCE
        && p.y <= a.y.max(b.y) + EDGE_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> Vec<Point2> {
        vec![
            Point2::new(50.0, 50.0),
            Point2::new(200.0, 50.0),
            Point2::new(200.0, 150.0),
            Point2::new(50.0, 150.0),
        ]
    }

    #[test]
    fn test_interior_point() {
        assert!(polygon_contains(&rect(), Point2::new(100.0, 100.0)));
    }

    #[test]
    fn test_exterior_point() {
        assert!(!polygon_contains(&rect(), Point2::new(10.0, 10.0)));
        assert!(!polygon_contains(&rect(), Point2::new(300.0, 100.0)));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        assert!(polygon_contains(&rect(), Point2::new(50.0, 100.0)));
        assert!(polygon_contains(&rect(), Point2::new(50.0, 50.0)));
        assert!(polygon_contains(&rect(), Point2::new(125.0, 150.0)));
    }

    #[test]
    fn test_degenerate_polygon_contains_nothing() {
        let line = vec![Point2::new(0.0, 0.0), Point2::new(10.0, 10.0)];
        assert!(!polygon_contains(&line, Point2::new(5.0, 5.0)));
        assert!(!polygon_contains(&[], Point2::new(0.0, 0.0)));
    }

    #[test]
    fn test_triangle() {
        let tri = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(5.0, 10.0),
        ];
        assert!(polygon_contains(&tri, Point2::new(5.0, 3.0)));
        assert!(!polygon_contains(&tri, Point2::new(0.0, 10.0)));
    }
}
