//! Adaptive boundary discretisation.
//!
//! Boundary curves live in the parameter space of the surface. Their points
//! are spaced so that consecutive points are roughly one target edge length
//! apart on the surface: the surface arc length is integrated against the
//! reciprocal of the size field, and points are placed at equal increments
//! of that integral.
//!
//! [`PslgBuilder`] turns discretised loops into the `(points, segments,
//! holes)` input of [`Triangulation::triangulate`].
//!
//! [`Triangulation::triangulate`]: crate::core::triangulation::Triangulation::triangulate

use crate::geometry::point::{Point2, Point3};
use crate::geometry::size_field::ElementFeatureSize;
use crate::geometry::surface::{Surface, SurfaceError};
use std::f64::consts::TAU;
use thiserror::Error;

/// Absolute tolerance of the adaptive integration.
pub const INTEGRATION_EPS: f64 = 1e-8;

/// Minimum recursion depth before the error estimate is trusted.
const MIN_INTEGRATION_DEPTH: u32 = 6;

/// Maximum recursion depth of the adaptive integration.
const MAX_INTEGRATION_DEPTH: u32 = 20;

/// Errors that can occur while meshing a boundary curve.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EdgeMeshError {
    /// The curve could not be evaluated on the surface.
    #[error("Surface evaluation failed along the curve: {0}")]
    Surface(#[from] SurfaceError),
    /// The curve parameter range is empty or non-finite.
    #[error("Invalid curve parameter range [{tmin}, {tmax}]")]
    InvalidRange {
        /// Start of the range.
        tmin: f64,
        /// End of the range.
        tmax: f64,
    },
    /// The size field returned a non-positive or non-finite length.
    #[error("Size field returned invalid edge length {h}")]
    InvalidSize {
        /// The offending value.
        h: f64,
    },
}

/// A curve in the parameter space of a surface.
pub trait ParametricCurve {
    /// Parameter range `(tmin, tmax)`.
    fn range(&self) -> (f64, f64);

    /// Parametric surface location at curve parameter `t`.
    fn eval(&self, t: f64) -> Point2;

    /// Whether the curve starts and ends at the same point.
    fn is_closed(&self) -> bool {
        let (tmin, tmax) = self.range();
        self.eval(tmin).distance(self.eval(tmax)) <= 1e-12
    }
}

/// A straight segment in parameter space, `t ∈ [0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineCurve {
    /// Start point.
    pub start: Point2,
    /// End point.
    pub end: Point2,
}

impl LineCurve {
    /// Create a segment from `start` to `end`.
    #[must_use]
    pub const fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }
}

impl ParametricCurve for LineCurve {
    fn range(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn eval(&self, t: f64) -> Point2 {
        self.start + (self.end - self.start) * t
    }
}

/// A full circle in parameter space, traversed counter-clockwise,
/// `t ∈ [0, 2π]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircleCurve {
    /// Circle centre.
    pub center: Point2,
    /// Circle radius.
    pub radius: f64,
}

impl CircleCurve {
    /// Create a circle.
    #[must_use]
    pub const fn new(center: Point2, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl ParametricCurve for CircleCurve {
    fn range(&self) -> (f64, f64) {
        (0.0, TAU)
    }

    fn eval(&self, t: f64) -> Point2 {
        Point2::new(
            self.center.x + self.radius * t.cos(),
            self.center.y + self.radius * t.sin(),
        )
    }

    fn is_closed(&self) -> bool {
        true
    }
}

/// The discretisation of one curve.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeMesh {
    /// Curve parameters of the points, increasing.
    pub params: Vec<f64>,
    /// Parametric surface locations of the points.
    pub uv: Vec<Point2>,
    /// Surface points.
    pub points: Vec<Point3>,
    /// Whether the first and last point coincide.
    pub closed: bool,
}

impl EdgeMesh {
    /// Number of points, including both end points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the mesh has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

struct Integrator<'a, C: ?Sized, S: ?Sized, F: ?Sized> {
    curve: &'a C,
    surface: &'a S,
    fs: &'a F,
    tol: f64,
    tvals: Vec<f64>,
    dist: Vec<f64>,
}

impl<C, S, F> Integrator<'_, C, S, F>
where
    C: ParametricCurve + ?Sized,
    S: Surface + ?Sized,
    F: ElementFeatureSize + ?Sized,
{
    fn sample(&self, t: f64) -> Result<(Point3, f64), EdgeMeshError> {
        let x = self.surface.eval_point(self.curve.eval(t))?;
        let h = self.fs.feature_size(&x);
        if h <= 0.0 || !h.is_finite() {
            return Err(EdgeMeshError::InvalidSize { h });
        }
        Ok((x, h))
    }

    fn integrate(
        &mut self,
        t1: f64,
        h1: f64,
        p1: Point3,
        t2: f64,
        depth: u32,
    ) -> Result<(), EdgeMeshError> {
        let tmid = 0.5 * (t1 + t2);
        let (pmid, hmid) = self.sample(tmid)?;
        let (p2, h2) = self.sample(t2)?;

        let int1 = 2.0 * p1.distance(pmid) / (h1 + hmid);
        let int2 = 4.0 * pmid.distance(p2) / (h1 + 2.0 * hmid + h2);
        let int3 = 2.0 * p1.distance(p2) / (hmid + h2);
        let error = (int3 - int1 - int2).abs();

        if (depth > MIN_INTEGRATION_DEPTH && error < self.tol) || depth > MAX_INTEGRATION_DEPTH {
            let base = self.dist.last().copied().unwrap_or(0.0);
            self.tvals.push(tmid);
            self.dist.push(base + int1);
            self.tvals.push(t2);
            self.dist.push(base + int1 + int2);
            Ok(())
        } else {
            self.integrate(t1, h1, p1, tmid, depth + 1)?;
            self.integrate(tmid, hmid, pmid, t2, depth + 1)
        }
    }
}

/// Integrate `∫ |dX/dt| / h dt` along the curve.
///
/// Returns the sample parameters and the cumulative integral at each of them.
///
/// # Errors
///
/// Returns [`EdgeMeshError`] if the range is invalid, the surface fails to
/// evaluate, or the size field returns a non-positive length.
pub fn integrate_edge<C, S, F>(
    curve: &C,
    surface: &S,
    fs: &F,
    tol: f64,
) -> Result<(Vec<f64>, Vec<f64>), EdgeMeshError>
where
    C: ParametricCurve + ?Sized,
    S: Surface + ?Sized,
    F: ElementFeatureSize + ?Sized,
{
    let (tmin, tmax) = curve.range();
    if !(tmin.is_finite() && tmax.is_finite() && tmax > tmin) {
        return Err(EdgeMeshError::InvalidRange { tmin, tmax });
    }

    let mut integrator = Integrator {
        curve,
        surface,
        fs,
        tol,
        tvals: vec![tmin],
        dist: vec![0.0],
    };
    let (p1, h1) = integrator.sample(tmin)?;
    integrator.integrate(tmin, h1, p1, tmax, 0)?;

    Ok((integrator.tvals, integrator.dist))
}

/// Discretise a curve according to the size field.
///
/// The number of points is the rounded-up integral, at least 2 (5 for closed
/// curves), and always odd so that the curve has an even number of segments.
///
/// # Errors
///
/// See [`integrate_edge`].
///
/// # Examples
///
/// ```rust
/// use frontal_delaunay::geometry::edge_mesh::{LineCurve, mesh_edge};
/// use frontal_delaunay::geometry::point::Point2;
/// use frontal_delaunay::geometry::size_field::ConstantSize;
/// use frontal_delaunay::geometry::surface::PlanarSurface;
///
/// let line = LineCurve::new(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
/// let mesh = mesh_edge(&line, &PlanarSurface, &ConstantSize::new(0.1)).unwrap();
/// assert_eq!(mesh.len(), 11);
/// assert!((mesh.uv[5].x - 0.5).abs() < 1e-9);
/// ```
pub fn mesh_edge<C, S, F>(curve: &C, surface: &S, fs: &F) -> Result<EdgeMesh, EdgeMeshError>
where
    C: ParametricCurve + ?Sized,
    S: Surface + ?Sized,
    F: ElementFeatureSize + ?Sized,
{
    let (tmin, tmax) = curve.range();
    let (tvals, dist) = integrate_edge(curve, surface, fs, INTEGRATION_EPS)?;
    let closed = curve.is_closed();
    let total = dist.last().copied().unwrap_or(0.0);

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "the integral is finite and non-negative"
    )]
    let mut npts = (total.ceil() as usize).max(2);
    if npts % 2 == 0 {
        npts += 1;
    }
    if closed && npts < 5 {
        npts = 5;
    }

    #[expect(clippy::cast_precision_loss, reason = "point counts are small")]
    let spacing = total / (npts - 1) as f64;

    let mut params = vec![0.0; npts];
    params[0] = tmin;
    params[npts - 1] = tmax;

    let mut k = 1;
    for j in 1..tvals.len() {
        while k < npts - 1 {
            #[expect(clippy::cast_precision_loss, reason = "point counts are small")]
            let target = spacing * k as f64;
            if !(dist[j - 1] <= target && target < dist[j]) {
                break;
            }
            let span = dist[j] - dist[j - 1];
            let u = if span > 0.0 {
                (target - dist[j - 1]) / span
            } else {
                0.0
            };
            params[k] = tvals[j - 1] + (tvals[j] - tvals[j - 1]) * u;
            k += 1;
        }
        if k >= npts - 1 {
            break;
        }
    }
    // Round-off can leave the last few targets just past the final sample.
    for param in params.iter_mut().take(npts - 1).skip(k) {
        *param = tmax;
    }

    let uv: Vec<Point2> = params.iter().map(|&t| curve.eval(t)).collect();
    let points = uv
        .iter()
        .map(|&p| surface.eval_point(p))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(npts, total, closed, "meshed boundary curve");

    Ok(EdgeMesh {
        params,
        uv,
        points,
        closed,
    })
}

/// Planar straight-line graph input for the triangulation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pslg {
    /// Boundary and interior points.
    pub points: Vec<Point2>,
    /// Constrained segments as index pairs into `points`.
    pub segments: Vec<(usize, usize)>,
    /// One seed point strictly inside each hole.
    pub holes: Vec<Point2>,
}

/// Incremental assembly of a [`Pslg`] from loops of points.
///
/// # Examples
///
/// ```rust
/// use frontal_delaunay::geometry::edge_mesh::PslgBuilder;
/// use frontal_delaunay::geometry::point::Point2;
///
/// let pslg = PslgBuilder::new()
///     .add_loop(&[
///         Point2::new(0.0, 0.0),
///         Point2::new(1.0, 0.0),
///         Point2::new(1.0, 1.0),
///         Point2::new(0.0, 1.0),
///     ])
///     .build();
/// assert_eq!(pslg.points.len(), 4);
/// assert_eq!(pslg.segments, vec![(0, 1), (1, 2), (2, 3), (3, 0)]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct PslgBuilder {
    pslg: Pslg,
}

impl PslgBuilder {
    /// Start an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a closed polygon. The last point must not repeat the first.
    #[must_use]
    pub fn add_loop(mut self, points: &[Point2]) -> Self {
        let start = self.pslg.points.len();
        let n = points.len();
        self.pslg.points.extend_from_slice(points);
        if n >= 2 {
            for i in 0..n {
                self.pslg.segments.push((start + i, start + (i + 1) % n));
            }
        }
        self
    }

    /// Add an open polyline of constrained segments.
    #[must_use]
    pub fn add_polyline(mut self, points: &[Point2]) -> Self {
        let start = self.pslg.points.len();
        self.pslg.points.extend_from_slice(points);
        for i in 1..points.len() {
            self.pslg.segments.push((start + i - 1, start + i));
        }
        self
    }

    /// Add a closed loop made of consecutive edge meshes.
    ///
    /// Each edge must start where the previous one ended; the shared end
    /// points are emitted once.
    #[must_use]
    pub fn add_edge_loop(self, edges: &[EdgeMesh]) -> Self {
        let mut points = Vec::new();
        for edge in edges {
            if let Some((_, body)) = edge.uv.split_last() {
                points.extend_from_slice(body);
            }
        }
        self.add_loop(&points)
    }

    /// Add a seed point marking the inside of a hole.
    #[must_use]
    pub fn add_hole(mut self, seed: Point2) -> Self {
        self.pslg.holes.push(seed);
        self
    }

    /// Finish the graph.
    #[must_use]
    pub fn build(self) -> Pslg {
        self.pslg
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::size_field::{ConstantSize, LinearSize};
    use crate::geometry::surface::{AffineSurface, PlanarSurface};
    use approx::assert_relative_eq;

    #[test]
    fn uniform_line_is_evenly_spaced() {
        let line = LineCurve::new(Point2::new(0.0, 0.0), Point2::new(2.0, 0.0));
        let mesh = mesh_edge(&line, &PlanarSurface, &ConstantSize::new(0.25)).unwrap();

        assert_eq!(mesh.len(), 9);
        assert!(!mesh.closed);
        for (i, p) in mesh.uv.iter().enumerate() {
            #[expect(clippy::cast_precision_loss)]
            let expected = 0.25 * i as f64;
            assert_relative_eq!(p.x, expected, epsilon = 1e-8);
        }
    }

    #[test]
    fn point_count_is_odd() {
        let line = LineCurve::new(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        let mesh = mesh_edge(&line, &PlanarSurface, &ConstantSize::new(0.5)).unwrap();
        // Integral is 2 -> 2 points bumped to 3.
        assert_eq!(mesh.len(), 3);

        let coarse = mesh_edge(&line, &PlanarSurface, &ConstantSize::new(10.0)).unwrap();
        assert_eq!(coarse.len(), 3);
    }

    #[test]
    fn closed_curves_have_at_least_five_points() {
        let circle = CircleCurve::new(Point2::new(0.0, 0.0), 0.1);
        let mesh = mesh_edge(&circle, &PlanarSurface, &ConstantSize::new(10.0)).unwrap();
        assert!(mesh.closed);
        assert_eq!(mesh.len(), 5);
        assert_relative_eq!(mesh.uv[0].distance(mesh.uv[4]), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn spacing_follows_surface_length() {
        // The surface stretches u by 4, so a unit parameter line is 4 long.
        let surf = AffineSurface::new(
            Point3::default(),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let line = LineCurve::new(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        let mesh = mesh_edge(&line, &surf, &ConstantSize::new(1.0)).unwrap();
        assert_eq!(mesh.len(), 5);
    }

    #[test]
    fn graded_field_clusters_points() {
        let line = LineCurve::new(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        let fs = LinearSize::new(0.02, 0.2, 0.02, Point3::new(0.2, 0.0, 0.0));
        let mesh = mesh_edge(&line, &PlanarSurface, &fs).unwrap();

        let first = mesh.uv[1].x - mesh.uv[0].x;
        let n = mesh.len();
        let last = mesh.uv[n - 1].x - mesh.uv[n - 2].x;
        assert!(last > 2.0 * first, "first={first} last={last}");
        assert!(mesh.params.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn invalid_size_is_reported() {
        let line = LineCurve::new(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        let result = mesh_edge(&line, &PlanarSurface, &ConstantSize::new(0.0));
        assert_eq!(result, Err(EdgeMeshError::InvalidSize { h: 0.0 }));
    }

    #[test]
    fn edge_loop_drops_shared_endpoints() {
        let corners = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let fs = ConstantSize::new(0.5);
        let edges: Vec<EdgeMesh> = (0..4)
            .map(|i| {
                let line = LineCurve::new(corners[i], corners[(i + 1) % 4]);
                mesh_edge(&line, &PlanarSurface, &fs).unwrap()
            })
            .collect();

        let pslg = PslgBuilder::new()
            .add_edge_loop(&edges)
            .add_hole(Point2::new(5.0, 5.0))
            .build();
        assert_eq!(pslg.points.len(), 8);
        assert_eq!(pslg.segments.len(), 8);
        assert_eq!(pslg.segments[7], (7, 0));
        assert_eq!(pslg.holes.len(), 1);
    }
}
