//! Element-size fields.
//!
//! A size field returns the desired local edge length at a point on the
//! surface. It drives both boundary discretisation and frontal point
//! placement.

use crate::geometry::point::Point3;
use serde::{Deserialize, Serialize};

/// Target element edge length as a function of position.
///
/// Implementations must return a strictly positive, finite length for every
/// point of the meshed surface.
///
/// Closures implement the trait directly:
///
/// ```rust
/// use frontal_delaunay::geometry::point::Point3;
/// use frontal_delaunay::geometry::size_field::ElementFeatureSize;
///
/// let graded = |x: &Point3| 0.05 + 0.1 * x.x.abs();
/// assert!((graded.feature_size(&Point3::new(1.0, 0.0, 0.0)) - 0.15).abs() < 1e-12);
/// ```
pub trait ElementFeatureSize {
    /// Target edge length at `x`.
    fn feature_size(&self, x: &Point3) -> f64;
}

impl<F> ElementFeatureSize for F
where
    F: Fn(&Point3) -> f64,
{
    fn feature_size(&self, x: &Point3) -> f64 {
        self(x)
    }
}

/// A uniform size field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstantSize {
    /// The edge length returned everywhere.
    pub h: f64,
}

impl ConstantSize {
    /// Create a uniform size field.
    #[must_use]
    pub const fn new(h: f64) -> Self {
        Self { h }
    }
}

impl ElementFeatureSize for ConstantSize {
    fn feature_size(&self, _x: &Point3) -> f64 {
        self.h
    }
}

/// A size field varying linearly in space, clamped to `[hmin, hmax]`:
/// `h(x) = clamp(c + a·x, hmin, hmax)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearSize {
    /// Lower bound on the edge length.
    pub hmin: f64,
    /// Upper bound on the edge length.
    pub hmax: f64,
    /// Constant term.
    pub c: f64,
    /// Gradient of the edge length.
    pub gradient: Point3,
}

impl LinearSize {
    /// Create a linear size field.
    #[must_use]
    pub const fn new(hmin: f64, hmax: f64, c: f64, gradient: Point3) -> Self {
        Self {
            hmin,
            hmax,
            c,
            gradient,
        }
    }
}

impl ElementFeatureSize for LinearSize {
    fn feature_size(&self, x: &Point3) -> f64 {
        (self.c + self.gradient.dot(*x)).clamp(self.hmin, self.hmax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linear_size_is_clamped() {
        let fs = LinearSize::new(0.1, 0.5, 0.2, Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(fs.feature_size(&Point3::new(0.1, 7.0, 0.0)), 0.3);
        assert_relative_eq!(fs.feature_size(&Point3::new(-5.0, 0.0, 0.0)), 0.1);
        assert_relative_eq!(fs.feature_size(&Point3::new(5.0, 0.0, 0.0)), 0.5);
    }

    #[test]
    fn constant_size_ignores_position() {
        let fs = ConstantSize::new(0.25);
        assert_relative_eq!(fs.feature_size(&Point3::new(1.0, 2.0, 3.0)), 0.25);
    }
}
