//! Shape and size measures for surface triangles.
//!
//! Both measures are evaluated on the 3-D images of the triangle vertices so
//! that they describe the mesh on the surface rather than in parameter
//! space.
//!
//! # Quality Metrics
//!
//! - **Radius ratio**: `2·r_in / r_circ`, normalised so an equilateral
//!   triangle scores 1 and a degenerate one scores 0.
//! - **Size ratio**: `√3 · r_circ / h`, where `h` is the target edge length.
//!   An equilateral triangle with side `h` has a size ratio of 1.
//!
//! # References
//!
//! - Shewchuk, J.R. "What Is a Good Linear Element? Interpolation, Conditioning,
//!   Anisotropy, and Quality Measures" (2002)
//! - Rebay, S. "Efficient Unstructured Mesh Generation by Means of Delaunay
//!   Triangulation and Bowyer-Watson Algorithm", J. Comput. Phys. 106 (1993)

use crate::geometry::point::Point3;
use crate::geometry::predicates::circumradius_3d;

/// Normalised radius ratio `2·r_in / r_circ` of a 3-D triangle.
///
/// # Examples
///
/// ```rust
/// use approx::assert_relative_eq;
/// use frontal_delaunay::geometry::point::Point3;
/// use frontal_delaunay::geometry::quality::radius_ratio;
///
/// let a = Point3::new(0.0, 0.0, 0.0);
/// let b = Point3::new(1.0, 0.0, 0.0);
/// let c = Point3::new(0.5, 0.75_f64.sqrt(), 0.0);
/// assert_relative_eq!(radius_ratio(a, b, c), 1.0, epsilon = 1e-12);
/// ```
#[must_use]
pub fn radius_ratio(a: Point3, b: Point3, c: Point3) -> f64 {
    let la = b.distance(c);
    let lb = c.distance(a);
    let lc = a.distance(b);
    let area = 0.5 * (b - a).cross(c - a).norm();
    let s = 0.5 * (la + lb + lc);
    let product = la * lb * lc;
    if area <= 0.0 || s <= 0.0 || product <= 0.0 {
        return 0.0;
    }

    // r_in = area / s, r_circ = abc / (4 area)
    let ratio = 8.0 * area * area / (s * product);
    ratio.clamp(0.0, 1.0)
}

/// Size ratio `√3 · r_circ / h` of a 3-D triangle against the target edge
/// length `h`.
///
/// Returns `f64::INFINITY` for degenerate triangles or a non-positive target.
#[must_use]
pub fn size_ratio(a: Point3, b: Point3, c: Point3, h: f64) -> f64 {
    if h <= 0.0 || !h.is_finite() {
        return f64::INFINITY;
    }
    3.0_f64.sqrt() * circumradius_3d(a, b, c) / h
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn equilateral_triangle_has_unit_ratios() {
        let h = 0.25;
        let a = Point3::new(1.0, 1.0, 0.0);
        let b = Point3::new(1.0 + h, 1.0, 0.0);
        let c = Point3::new(1.0 + 0.5 * h, 1.0 + 0.5 * 3.0_f64.sqrt() * h, 0.0);

        assert_relative_eq!(radius_ratio(a, b, c), 1.0, epsilon = 1e-12);
        assert_relative_eq!(size_ratio(a, b, c, h), 1.0, epsilon = 1e-12);
        assert_relative_eq!(size_ratio(a, b, c, 2.0 * h), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_triangles_score_zero_quality() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(2.0, 0.0, 0.0);
        assert_relative_eq!(radius_ratio(a, b, c), 0.0);
        assert!(size_ratio(a, b, c, 1.0).is_infinite());
        assert!(size_ratio(a, b, Point3::new(0.0, 1.0, 0.0), 0.0).is_infinite());
    }

    #[test]
    fn sliver_has_low_quality() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.5, 0.01, 0.0);
        assert!(radius_ratio(a, b, c) < 0.1);
    }
}
