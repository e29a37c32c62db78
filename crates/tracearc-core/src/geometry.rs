use serde::{Deserialize, Serialize};

/// Tolerance for near-zero lengths and determinants.
pub const EPS: f64 = 1e-9;

/// A 2D point in board coordinates (host native units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Point at distance `dist` from `self` along the unit direction `dir`.
    pub fn along(&self, dir: &Vec2, dist: f64) -> Point {
        Point::new(self.x + dir.x * dist, self.y + dir.y * dist)
    }
}

/// A 2D displacement vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn between(from: &Point, to: &Point) -> Self {
        Self {
            x: to.x - from.x,
            y: to.y - from.y,
        }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn dot(&self, other: &Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product; sign gives the turn direction.
    pub fn cross(&self, other: &Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Unit vector, or `None` for a (near-)zero vector.
    pub fn normalized(&self) -> Option<Vec2> {
        let len = self.length();
        if len <= EPS {
            return None;
        }
        Some(Vec2::new(self.x / len, self.y / len))
    }
}

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Quintic smootherstep ease: `t³(t(6t − 15) + 10)`, clamped to [0, 1].
///
/// Zero first and second derivatives at both ends; `smootherstep(1.0)` is
/// exactly `1.0`, which taper generation relies on for seam exactness.
pub fn smootherstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * t * (t * (6.0 * t - 15.0) + 10.0)
}

/// Scalar cubic Bezier in Bernstein form.
///
/// At `t = 1.0` this returns exactly `b3`.
pub fn cubic_bezier(b0: f64, b1: f64, b2: f64, b3: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    u * u * u * b0 + 3.0 * u * u * t * b1 + 3.0 * u * t * t * b2 + t * t * t * b3
}

/// Unsigned angle between two vectors in radians.
///
/// The cosine is clamped to [-1, 1] before `acos` to absorb floating error.
/// `None` when either vector is (near-)zero.
pub fn angle_between(a: &Vec2, b: &Vec2) -> Option<f64> {
    let la = a.length();
    let lb = b.length();
    if la <= EPS || lb <= EPS {
        return None;
    }
    let cos = (a.dot(b) / (la * lb)).clamp(-1.0, 1.0);
    Some(cos.acos())
}

/// Intersection of the infinite lines through `p1` along `d1` and through
/// `p2` along `d2`. `None` when the lines are parallel.
pub fn line_intersection(p1: &Point, d1: &Vec2, p2: &Point, d2: &Vec2) -> Option<Point> {
    let det = d1.cross(d2);
    if det.abs() <= EPS {
        return None;
    }
    let dp = Vec2::between(p1, p2);
    let t = dp.cross(d2) / det;
    Some(p1.along(&d1.normalized()?, t * d1.length()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_angle_between_perpendicular() {
        let a = Vec2::new(1.0, 0.0);
        let b = Vec2::new(0.0, 5.0);
        let angle = angle_between(&a, &b).unwrap();
        assert!((angle - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_angle_between_zero_vector() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(1.0, 0.0);
        assert!(angle_between(&a, &b).is_none());
    }

    #[test]
    fn test_smootherstep_endpoints_exact() {
        assert_eq!(smootherstep(0.0), 0.0);
        assert_eq!(smootherstep(1.0), 1.0);
        assert!((smootherstep(0.5) - 0.5).abs() < 1e-12);
        // Clamped outside the unit interval.
        assert_eq!(smootherstep(-2.0), 0.0);
        assert_eq!(smootherstep(3.0), 1.0);
    }

    #[test]
    fn test_smootherstep_monotonic() {
        let mut prev = 0.0;
        for i in 1..=100 {
            let v = smootherstep(i as f64 / 100.0);
            assert!(v > prev);
            prev = v;
        }
    }

    #[test]
    fn test_cubic_bezier_even_controls_is_linear() {
        let (a, b) = (30.0, 10.0);
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            let bez = cubic_bezier(a, lerp(a, b, 1.0 / 3.0), lerp(a, b, 2.0 / 3.0), b, t);
            assert!((bez - lerp(a, b, t)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cubic_bezier_endpoint_exact() {
        assert_eq!(cubic_bezier(30.0, 25.0, 15.0, 10.0, 1.0), 10.0);
        assert_eq!(cubic_bezier(30.0, 25.0, 15.0, 10.0, 0.0), 30.0);
    }

    #[test]
    fn test_line_intersection() {
        let p = line_intersection(
            &Point::new(0.0, 0.0),
            &Vec2::new(1.0, 0.0),
            &Point::new(5.0, 5.0),
            &Vec2::new(0.0, -1.0),
        )
        .unwrap();
        assert!((p.x - 5.0).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }

    #[test]
    fn test_line_intersection_parallel() {
        let p = line_intersection(
            &Point::new(0.0, 0.0),
            &Vec2::new(1.0, 0.0),
            &Point::new(0.0, 5.0),
            &Vec2::new(2.0, 0.0),
        );
        assert!(p.is_none());
    }
}
