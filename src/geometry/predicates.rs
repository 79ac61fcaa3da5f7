//! Geometric predicates for planar triangulation.
//!
//! All predicates are evaluated in double precision. Each determinant is
//! compared against a relative error bound (the determinant's permanent scaled
//! by a fixed epsilon) so that nearly collinear or nearly cocircular
//! configurations are reported as [`Orientation::DEGENERATE`] /
//! [`InCircle::BOUNDARY`] instead of with an arbitrary sign. Callers resolve
//! those ties deterministically by point index.

use crate::geometry::point::{Point2, Point3};

/// Relative tolerance applied to the in-circle determinant.
pub const IN_CIRCLE_EPSILON: f64 = 1e-12;

/// Relative tolerance applied to the orientation determinant.
pub const ORIENTATION_EPSILON: f64 = 1e-12;

/// Position of a point relative to the circumcircle of a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InCircle {
    /// The point is outside the circumcircle
    OUTSIDE,
    /// The point is on the circumcircle (within numerical tolerance)
    BOUNDARY,
    /// The point is inside the circumcircle
    INSIDE,
}

impl std::fmt::Display for InCircle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OUTSIDE => write!(f, "OUTSIDE"),
            Self::BOUNDARY => write!(f, "BOUNDARY"),
            Self::INSIDE => write!(f, "INSIDE"),
        }
    }
}

/// Orientation of an ordered point triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Clockwise turn
    NEGATIVE,
    /// Collinear (within numerical tolerance)
    DEGENERATE,
    /// Counter-clockwise turn
    POSITIVE,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

/// Twice the signed area of the triangle `(a, b, c)`.
///
/// Positive when the triple turns counter-clockwise.
///
/// # Examples
///
/// ```rust
/// use frontal_delaunay::geometry::point::Point2;
/// use frontal_delaunay::geometry::predicates::orient2d;
///
/// let a = Point2::new(0.0, 0.0);
/// let b = Point2::new(1.0, 0.0);
/// let c = Point2::new(0.0, 1.0);
/// assert_eq!(orient2d(a, b, c), 1.0);
/// assert_eq!(orient2d(a, c, b), -1.0);
/// ```
#[must_use]
#[inline]
pub fn orient2d(a: Point2, b: Point2, c: Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Classify the orientation of `(a, b, c)` with a relative tolerance.
#[must_use]
pub fn orientation(a: Point2, b: Point2, c: Point2) -> Orientation {
    let left = (b.x - a.x) * (c.y - a.y);
    let right = (b.y - a.y) * (c.x - a.x);
    let det = left - right;
    let bound = ORIENTATION_EPSILON * (left.abs() + right.abs());

    if det > bound {
        Orientation::POSITIVE
    } else if det < -bound {
        Orientation::NEGATIVE
    } else {
        Orientation::DEGENERATE
    }
}

/// The raw in-circle determinant together with its permanent.
///
/// For a counter-clockwise triangle `(a, b, c)` the determinant is positive
/// when `d` lies inside the circumcircle. The permanent bounds the magnitude
/// of the rounding error.
#[must_use]
pub fn in_circle_det(a: Point2, b: Point2, c: Point2, d: Point2) -> (f64, f64) {
    let adx = a.x - d.x;
    let ady = a.y - d.y;
    let bdx = b.x - d.x;
    let bdy = b.y - d.y;
    let cdx = c.x - d.x;
    let cdy = c.y - d.y;

    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    let bc = bdx * cdy - bdy * cdx;
    let ca = cdx * ady - cdy * adx;
    let ab = adx * bdy - ady * bdx;

    let det = alift * bc + blift * ca + clift * ab;
    let permanent = alift * ((bdx * cdy).abs() + (bdy * cdx).abs())
        + blift * ((cdx * ady).abs() + (cdy * adx).abs())
        + clift * ((adx * bdy).abs() + (ady * bdx).abs());

    (det, permanent)
}

/// Classify `d` against the circumcircle of the counter-clockwise triangle
/// `(a, b, c)`.
///
/// # Examples
///
/// ```rust
/// use frontal_delaunay::geometry::point::Point2;
/// use frontal_delaunay::geometry::predicates::{InCircle, in_circle};
///
/// let a = Point2::new(0.0, 0.0);
/// let b = Point2::new(1.0, 0.0);
/// let c = Point2::new(0.0, 1.0);
/// assert_eq!(in_circle(a, b, c, Point2::new(0.5, 0.5)), InCircle::INSIDE);
/// assert_eq!(in_circle(a, b, c, Point2::new(1.0, 1.0)), InCircle::BOUNDARY);
/// assert_eq!(in_circle(a, b, c, Point2::new(2.0, 2.0)), InCircle::OUTSIDE);
/// ```
#[must_use]
pub fn in_circle(a: Point2, b: Point2, c: Point2, d: Point2) -> InCircle {
    let (det, permanent) = in_circle_det(a, b, c, d);
    let bound = IN_CIRCLE_EPSILON * permanent;
    if det > bound {
        InCircle::INSIDE
    } else if det < -bound {
        InCircle::OUTSIDE
    } else {
        InCircle::BOUNDARY
    }
}

/// Circumcentre of the triangle `(a, b, c)`, or `None` if it is degenerate.
#[must_use]
pub fn circumcenter(a: Point2, b: Point2, c: Point2) -> Option<Point2> {
    let b_rel = b - a;
    let c_rel = c - a;
    let denom = 2.0 * b_rel.cross(c_rel);
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }

    let b2 = b_rel.dot(b_rel);
    let c2 = c_rel.dot(c_rel);
    let ux = (c_rel.y * b2 - b_rel.y * c2) / denom;
    let uy = (b_rel.x * c2 - c_rel.x * b2) / denom;
    let center = Point2::new(a.x + ux, a.y + uy);
    center.is_finite().then_some(center)
}

/// Circumradius of a triangle embedded in 3-D.
///
/// Returns `f64::INFINITY` for a degenerate triangle.
#[must_use]
pub fn circumradius_3d(a: Point3, b: Point3, c: Point3) -> f64 {
    let la = b.distance(c);
    let lb = c.distance(a);
    let lc = a.distance(b);
    let twice_area = (b - a).cross(c - a).norm();
    if twice_area <= 0.0 {
        return f64::INFINITY;
    }
    la * lb * lc / (2.0 * twice_area)
}

/// Is `p` strictly to the left of, on, or right of the directed line `a → b`?
///
/// Convenience wrapper returning the sign as `-1`, `0`, or `1` with the same
/// tolerance as [`orientation`].
#[must_use]
pub fn side_of_line(a: Point2, b: Point2, p: Point2) -> i32 {
    match orientation(a, b, p) {
        Orientation::POSITIVE => 1,
        Orientation::NEGATIVE => -1,
        Orientation::DEGENERATE => 0,
    }
}

// =============================================================================
// TESTS
// =============================================================================
