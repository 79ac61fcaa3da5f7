//! Surface evaluation collaborators.
//!
//! The triangulation only needs to map parametric points onto the surface
//! (and optionally back), plus the first derivatives to build a local metric.
//! Any CAD kernel can be plugged in by implementing [`Surface`].

use crate::geometry::point::{Point2, Point3};
use thiserror::Error;

/// Step size used by the finite-difference derivative fallback.
pub const DERIV_STEP_SIZE: f64 = 1e-6;

/// Errors raised by surface evaluation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SurfaceError {
    /// The parametric point lies outside the valid surface domain.
    #[error("Parametric point ({u}, {v}) is outside the surface domain")]
    OutsideDomain {
        /// First parameter.
        u: f64,
        /// Second parameter.
        v: f64,
    },
    /// The surface has no inverse evaluation, or it failed to converge.
    #[error("Inverse evaluation failed: {message}")]
    InverseFailed {
        /// Description of the failure.
        message: String,
    },
    /// The evaluation produced a non-finite value.
    #[error("Surface evaluation produced a non-finite value at ({u}, {v})")]
    NonFinite {
        /// First parameter.
        u: f64,
        /// Second parameter.
        v: f64,
    },
}

/// Parametric surface patch.
pub trait Surface {
    /// Map a parametric point onto the surface.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::OutsideDomain`] if `uv` is outside the valid
    /// parameter range of the surface.
    fn eval_point(&self, uv: Point2) -> Result<Point3, SurfaceError>;

    /// Best-effort inverse of [`Surface::eval_point`].
    ///
    /// # Errors
    ///
    /// The default implementation always fails with
    /// [`SurfaceError::InverseFailed`].
    fn inv_eval_point(&self, x: Point3) -> Result<Point2, SurfaceError> {
        let _ = x;
        Err(SurfaceError::InverseFailed {
            message: "surface does not provide an inverse map".to_string(),
        })
    }

    /// Evaluate the point and its first derivatives `(X, X_u, X_v)`.
    ///
    /// The default uses a forward difference, falling back to a backward
    /// difference when the forward step leaves the domain.
    ///
    /// # Errors
    ///
    /// Propagates evaluation failures at `uv` or at both difference stencils.
    fn eval_deriv(&self, uv: Point2) -> Result<(Point3, Point3, Point3), SurfaceError> {
        let x = self.eval_point(uv)?;
        let h = DERIV_STEP_SIZE;

        let xu = match self.eval_point(Point2::new(uv.x + h, uv.y)) {
            Ok(p) => (p - x) * (1.0 / h),
            Err(_) => (x - self.eval_point(Point2::new(uv.x - h, uv.y))?) * (1.0 / h),
        };
        let xv = match self.eval_point(Point2::new(uv.x, uv.y + h)) {
            Ok(p) => (p - x) * (1.0 / h),
            Err(_) => (x - self.eval_point(Point2::new(uv.x, uv.y - h))?) * (1.0 / h),
        };

        Ok((x, xu, xv))
    }
}

impl<S: Surface + ?Sized> Surface for &S {
    fn eval_point(&self, uv: Point2) -> Result<Point3, SurfaceError> {
        (**self).eval_point(uv)
    }

    fn inv_eval_point(&self, x: Point3) -> Result<Point2, SurfaceError> {
        (**self).inv_eval_point(x)
    }

    fn eval_deriv(&self, uv: Point2) -> Result<(Point3, Point3, Point3), SurfaceError> {
        (**self).eval_deriv(uv)
    }
}

/// The identity surface: `X(u, v) = (u, v, 0)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlanarSurface;

impl Surface for PlanarSurface {
    fn eval_point(&self, uv: Point2) -> Result<Point3, SurfaceError> {
        if !uv.is_finite() {
            return Err(SurfaceError::NonFinite { u: uv.x, v: uv.y });
        }
        Ok(Point3::new(uv.x, uv.y, 0.0))
    }

    fn inv_eval_point(&self, x: Point3) -> Result<Point2, SurfaceError> {
        Ok(Point2::new(x.x, x.y))
    }

    fn eval_deriv(&self, uv: Point2) -> Result<(Point3, Point3, Point3), SurfaceError> {
        Ok((
            self.eval_point(uv)?,
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ))
    }
}

/// An affine plane `X(u, v) = origin + u·du + v·dv`, optionally restricted to
/// a rectangular parameter range.
///
/// # Examples
///
/// ```rust
/// use frontal_delaunay::geometry::point::{Point2, Point3};
/// use frontal_delaunay::geometry::surface::{AffineSurface, Surface};
///
/// let surf = AffineSurface::new(
///     Point3::new(0.0, 0.0, 1.0),
///     Point3::new(2.0, 0.0, 0.0),
///     Point3::new(0.0, 0.0, 3.0),
/// );
/// let x = surf.eval_point(Point2::new(0.5, 1.0)).unwrap();
/// assert_eq!(x, Point3::new(1.0, 0.0, 4.0));
/// let uv = surf.inv_eval_point(x).unwrap();
/// assert!((uv.x - 0.5).abs() < 1e-12 && (uv.y - 1.0).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineSurface {
    origin: Point3,
    du: Point3,
    dv: Point3,
    range: Option<(Point2, Point2)>,
}

impl AffineSurface {
    /// Create an unbounded affine surface.
    #[must_use]
    pub const fn new(origin: Point3, du: Point3, dv: Point3) -> Self {
        Self {
            origin,
            du,
            dv,
            range: None,
        }
    }

    /// Restrict the valid parameter domain to `[low, high]`.
    #[must_use]
    pub const fn with_range(mut self, low: Point2, high: Point2) -> Self {
        self.range = Some((low, high));
        self
    }

    fn in_range(&self, uv: Point2) -> bool {
        self.range.is_none_or(|(low, high)| {
            uv.x >= low.x && uv.x <= high.x && uv.y >= low.y && uv.y <= high.y
        })
    }
}

impl Surface for AffineSurface {
    fn eval_point(&self, uv: Point2) -> Result<Point3, SurfaceError> {
        if !uv.is_finite() {
            return Err(SurfaceError::NonFinite { u: uv.x, v: uv.y });
        }
        if !self.in_range(uv) {
            return Err(SurfaceError::OutsideDomain { u: uv.x, v: uv.y });
        }
        Ok(self.origin + self.du * uv.x + self.dv * uv.y)
    }

    fn inv_eval_point(&self, x: Point3) -> Result<Point2, SurfaceError> {
        // Least-squares solve of [du dv] [u v]^T = x - origin
        let r = x - self.origin;
        let a11 = self.du.dot(self.du);
        let a12 = self.du.dot(self.dv);
        let a22 = self.dv.dot(self.dv);
        let det = a11 * a22 - a12 * a12;
        if det.abs() <= f64::EPSILON * a11 * a22 {
            return Err(SurfaceError::InverseFailed {
                message: "affine surface tangents are parallel".to_string(),
            });
        }
        let b1 = self.du.dot(r);
        let b2 = self.dv.dot(r);
        Ok(Point2::new(
            (a22 * b1 - a12 * b2) / det,
            (a11 * b2 - a12 * b1) / det,
        ))
    }

    fn eval_deriv(&self, uv: Point2) -> Result<(Point3, Point3, Point3), SurfaceError> {
        Ok((self.eval_point(uv)?, self.du, self.dv))
    }
}

/// First fundamental form of a surface at a point, factored so parametric
/// vectors can be mapped into a plane where Euclidean distance equals
/// (first-order) surface distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricTensor {
    g11: f64,
    g12: f64,
    g22: f64,
}

impl MetricTensor {
    /// Identity metric (flat parameter space).
    pub const IDENTITY: Self = Self {
        g11: 1.0,
        g12: 0.0,
        g22: 1.0,
    };

    /// Build the metric from the surface tangents.
    ///
    /// Returns `None` when the tangents are (numerically) parallel, in which
    /// case callers fall back to the flat parameter-space predicate.
    #[must_use]
    pub fn from_tangents(xu: Point3, xv: Point3) -> Option<Self> {
        let g11 = xu.dot(xu);
        let g12 = xu.dot(xv);
        let g22 = xv.dot(xv);
        let det = g11 * g22 - g12 * g12;
        let finite = g11.is_finite() && g12.is_finite() && g22.is_finite();
        (finite && g11 > 0.0 && det > 1e-14 * g11 * g22).then_some(Self { g11, g12, g22 })
    }

    /// Evaluate the metric of `surface` at `uv`.
    ///
    /// # Errors
    ///
    /// Propagates derivative evaluation failures.
    pub fn at<S: Surface + ?Sized>(surface: &S, uv: Point2) -> Result<Option<Self>, SurfaceError> {
        let (_, xu, xv) = surface.eval_deriv(uv)?;
        Ok(Self::from_tangents(xu, xv))
    }

    /// Map a parametric point through the Cholesky factor of the metric.
    ///
    /// The map is linear with positive determinant, so orientations are
    /// preserved.
    #[must_use]
    pub fn transform(&self, p: Point2) -> Point2 {
        let l11 = self.g11.sqrt();
        let l12 = self.g12 / l11;
        let l22 = (self.g22 - l12 * l12).max(0.0).sqrt();
        Point2::new(l11 * p.x + l12 * p.y, l22 * p.y)
    }

    /// Squared metric length of a parametric vector.
    #[must_use]
    pub fn length_squared(&self, d: Point2) -> f64 {
        self.g11 * d.x * d.x + 2.0 * self.g12 * d.x * d.y + self.g22 * d.y * d.y
    }
}

// =============================================================================
// TESTS
// =============================================================================
