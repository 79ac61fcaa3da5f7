//! Advancing-front refinement driven by an element-size field.
//!
//! Every triangle is classified by its size ratio `R = √3·r_circ / h`:
//! triangles with `R` below the acceptance ratio are
//! [`Accepted`](TriangleStatus::Accepted), the others wait. A waiting triangle
//! becomes [`Active`](TriangleStatus::Active) once it touches the front, i.e.
//! has a boundary edge, a constrained edge, or an accepted neighbour. The
//! active triangle with the largest ratio is refined first: a new point is
//! placed ahead of its longest front edge at the distance that would create
//! an ideal element, and inserted by Bowyer-Watson.
//!
//! Candidates that cannot be inserted force the triangle to be accepted, so
//! every iteration either inserts a point or accepts a triangle and the loop
//! terminates.
//!
//! # References
//!
//! - S. Rebay, "Efficient Unstructured Mesh Generation by Means of Delaunay
//!   Triangulation and Bowyer-Watson Algorithm", J. Comput. Phys. 106 (1993).

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::algorithms::insertion::InsertionError;
use crate::core::triangle::{TAG_FORCED_ACCEPT, TriangleStatus};
use crate::core::triangle_list::TriangleKey;
use crate::core::triangulation::{Triangulation, TriangulationError};
use crate::geometry::point::{Point2, Point3};
use crate::geometry::predicates::circumcenter;
use crate::geometry::quality::{radius_ratio, size_ratio};
use crate::geometry::size_field::ElementFeatureSize;
use crate::geometry::surface::{MetricTensor, Surface};

/// Tuning knobs of [`Triangulation::frontal`].
///
/// # Examples
///
/// ```rust
/// use frontal_delaunay::core::algorithms::frontal::FrontalOptionsBuilder;
///
/// let options = FrontalOptionsBuilder::default()
///     .acceptance_ratio(1.3)
///     .print_level(1_u32)
///     .build()
///     .unwrap();
/// assert_eq!(options.acceptance_ratio, 1.3);
/// assert_eq!(options.max_iterations, 1_000_000);
/// ```
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct FrontalOptions {
    /// Progress logging is enabled when greater than zero.
    pub print_level: u32,
    /// Iterations between progress messages.
    pub print_interval: usize,
    /// Triangles with a size ratio below this value are accepted.
    pub acceptance_ratio: f64,
    /// Candidates closer than this fraction of the target circumradius to an
    /// existing point are rejected.
    pub duplicate_factor: f64,
    /// Upper bound on refinement iterations.
    pub max_iterations: usize,
    /// Warp the in-circle test by the surface metric around each insertion.
    pub use_surface_metric: bool,
}

impl Default for FrontalOptions {
    fn default() -> Self {
        Self {
            print_level: 0,
            print_interval: 1000,
            acceptance_ratio: 1.5,
            duplicate_factor: 0.5,
            max_iterations: 1_000_000,
            use_surface_metric: false,
        }
    }
}

/// Summary of a frontal run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontalStatistics {
    /// Refinement iterations performed.
    pub iterations: usize,
    /// Points inserted.
    pub points_inserted: usize,
    /// Candidates that could not be inserted.
    pub candidates_rejected: usize,
    /// Triangles accepted without meeting the size criterion.
    pub forced_accepts: usize,
    /// Whether the iteration limit ended the run.
    pub hit_iteration_limit: bool,
    /// Live triangles at the end.
    pub triangles: usize,
    /// Largest size ratio among the final triangles.
    pub max_ratio: f64,
}

/// Active triangles ordered by size ratio; stale entries are skipped on pop.
#[derive(Debug, Default)]
struct Front {
    heap: BinaryHeap<(OrderedFloat<f64>, Reverse<u64>, TriangleKey)>,
    seq: u64,
}

impl Front {
    fn push(&mut self, key: TriangleKey, r: f64) {
        self.heap.push((OrderedFloat(r), Reverse(self.seq), key));
        self.seq += 1;
    }
}

/// Why a candidate point was not inserted.
#[derive(Debug)]
enum Rejection {
    NoCandidate,
    TooClose,
    Insertion(InsertionError),
}

impl<S: Surface> Triangulation<S> {
    /// Refine the mesh until every triangle matches the size field.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::Topology`] if an insertion corrupts the
    /// mesh topology. Rejected candidates are not errors.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use frontal_delaunay::prelude::*;
    ///
    /// let square = [
    ///     Point2::new(0.0, 0.0),
    ///     Point2::new(1.0, 0.0),
    ///     Point2::new(1.0, 1.0),
    ///     Point2::new(0.0, 1.0),
    /// ];
    /// let mut tri = Triangulation::triangulate(PlanarSurface, &square, &[], &[]).unwrap();
    /// let stats = tri.frontal(&ConstantSize::new(0.5), &FrontalOptions::default()).unwrap();
    ///
    /// assert!(stats.points_inserted > 0);
    /// assert!(tri.triangles().all(|(_, t)| t.status == TriangleStatus::Accepted));
    /// ```
    pub fn frontal<F>(
        &mut self,
        fs: &F,
        options: &FrontalOptions,
    ) -> Result<FrontalStatistics, TriangulationError>
    where
        F: ElementFeatureSize + ?Sized,
    {
        let mut stats = FrontalStatistics::default();
        let mut front = Front::default();

        let keys: Vec<TriangleKey> = self.triangles.keys().collect();
        for &key in &keys {
            self.classify(key, fs, options.acceptance_ratio);
        }
        for &key in &keys {
            self.activate(key, &mut front);
        }
        tracing::debug!(
            triangles = keys.len(),
            active = front.heap.len(),
            "frontal refinement started"
        );

        while let Some((OrderedFloat(r), _, key)) = front.heap.pop() {
            let current = self
                .triangles
                .get(key)
                .is_some_and(|t| t.status == TriangleStatus::Active && t.r == r);
            if !current {
                continue;
            }
            if stats.iterations >= options.max_iterations {
                stats.hit_iteration_limit = true;
                break;
            }
            stats.iterations += 1;

            match self.advance(key, fs, options) {
                Ok(created) => {
                    stats.points_inserted += 1;
                    for &k in &created {
                        self.classify(k, fs, options.acceptance_ratio);
                    }
                    for &k in &created {
                        self.activate_around(k, &mut front);
                    }
                    if self.triangles.contains(key) {
                        stats.forced_accepts += 1;
                        self.force_accept(key, &mut front);
                    }
                }
                Err(Rejection::Insertion(err)) if err.is_fatal() => {
                    if let InsertionError::Topology(err) = err {
                        return Err(err.into());
                    }
                }
                Err(rejection) => {
                    tracing::debug!(?rejection, ?key, "candidate rejected");
                    stats.candidates_rejected += 1;
                    stats.forced_accepts += 1;
                    self.force_accept(key, &mut front);
                }
            }

            if options.print_level > 0
                && options.print_interval > 0
                && stats.iterations % options.print_interval == 0
            {
                tracing::info!(
                    iterations = stats.iterations,
                    points = stats.points_inserted,
                    triangles = self.triangles.len(),
                    active = front.heap.len(),
                    "frontal progress"
                );
            }
        }

        let pending: Vec<TriangleKey> = self
            .triangles
            .iter()
            .filter(|(_, t)| t.status != TriangleStatus::Accepted)
            .map(|(k, _)| k)
            .collect();
        if !pending.is_empty() {
            tracing::warn!(
                pending = pending.len(),
                iterations = stats.iterations,
                "frontal loop ended with unaccepted triangles; forcing acceptance"
            );
        }
        for key in pending {
            if let Some(t) = self.triangles.get_mut(key) {
                t.status = TriangleStatus::Accepted;
                t.tag = TAG_FORCED_ACCEPT;
                stats.forced_accepts += 1;
            }
        }

        stats.triangles = self.triangles.len();
        stats.max_ratio = self
            .triangles
            .iter()
            .map(|(_, t)| t.r)
            .fold(0.0, f64::max);
        if options.print_level > 0 {
            tracing::info!(?stats, "frontal refinement finished");
        }
        Ok(stats)
    }

    /// Compute and store the size ratio and shape quality of a triangle.
    ///
    /// Returns the size ratio `R = √3·r_circ / h`, with `h` sampled at the
    /// centroid of the triangle's surface image, or `None` for a dead key.
    pub fn compute_size_ratio<F>(&mut self, key: TriangleKey, fs: &F) -> Option<f64>
    where
        F: ElementFeatureSize + ?Sized,
    {
        let [a, b, c] = self.triangles.get(key)?.vertices().map(|i| self.points[i]);
        let centroid = (a + b + c) * (1.0 / 3.0);
        let r = size_ratio(a, b, c, fs.feature_size(&centroid));
        let quality = radius_ratio(a, b, c);

        let t = self.triangles.get_mut(key)?;
        t.r = r;
        t.quality = quality;
        Some(r)
    }

    fn classify<F>(&mut self, key: TriangleKey, fs: &F, acceptance_ratio: f64)
    where
        F: ElementFeatureSize + ?Sized,
    {
        let Some(r) = self.compute_size_ratio(key, fs) else {
            return;
        };
        if let Some(t) = self.triangles.get_mut(key) {
            t.status = if r < acceptance_ratio {
                TriangleStatus::Accepted
            } else {
                TriangleStatus::Waiting
            };
        }
    }

    /// Whether a triangle has a boundary, constrained, or accepted edge.
    fn on_front(&self, key: TriangleKey) -> bool {
        let Some(t) = self.triangles.get(key) else {
            return false;
        };
        t.edges().into_iter().any(|(a, b)| {
            self.edge_in_pslg(a, b)
                || self.neighbor(a, b).is_none_or(|(k, _)| {
                    self.triangles
                        .get(k)
                        .is_some_and(|n| n.status == TriangleStatus::Accepted)
                })
        })
    }

    /// Promote a waiting triangle on the front.
    fn activate(&mut self, key: TriangleKey, front: &mut Front) {
        let waiting = self
            .triangles
            .get(key)
            .is_some_and(|t| t.status == TriangleStatus::Waiting);
        if !waiting || !self.on_front(key) {
            return;
        }
        if let Some(t) = self.triangles.get_mut(key) {
            t.status = TriangleStatus::Active;
            front.push(key, t.r);
        }
    }

    /// Activate a triangle and its three neighbours.
    fn activate_around(&mut self, key: TriangleKey, front: &mut Front) {
        let Some(t) = self.triangles.get(key) else {
            return;
        };
        let neighbors: Vec<TriangleKey> = t
            .edges()
            .into_iter()
            .filter_map(|(a, b)| self.neighbor(a, b).map(|(k, _)| k))
            .collect();
        self.activate(key, front);
        for k in neighbors {
            self.activate(k, front);
        }
    }

    fn force_accept(&mut self, key: TriangleKey, front: &mut Front) {
        if let Some(t) = self.triangles.get_mut(key) {
            t.status = TriangleStatus::Accepted;
            t.tag = TAG_FORCED_ACCEPT;
        }
        self.activate_around(key, front);
    }

    /// Place and insert the Rebay point of an active triangle.
    fn advance<F>(
        &mut self,
        key: TriangleKey,
        fs: &F,
        options: &FrontalOptions,
    ) -> Result<Vec<TriangleKey>, Rejection>
    where
        F: ElementFeatureSize + ?Sized,
    {
        let (uv, rho) = self.rebay_point(key, fs).ok_or(Rejection::NoCandidate)?;
        let xyz = self
            .surface
            .eval_point(uv)
            .map_err(|err| Rejection::Insertion(err.into()))?;
        if let Some((existing, distance)) = self.quadtree.find_closest(uv) {
            if distance < options.duplicate_factor * rho {
                tracing::trace!(existing, distance, ?uv, "candidate too close to existing point");
                return Err(Rejection::TooClose);
            }
        }

        if options.use_surface_metric {
            let centroid = self.param_centroid(key);
            self.metric = centroid.and_then(|c| MetricTensor::at(&self.surface, c).ok().flatten());
        }
        let result = self.insert_new_point(uv, xyz, Some(key));
        self.metric = None;

        let (index, created) = result.map_err(Rejection::Insertion)?;
        tracing::trace!(index, ?uv, "frontal point inserted");
        Ok(created.into_vec())
    }

    fn param_centroid(&self, key: TriangleKey) -> Option<Point2> {
        let [a, b, c] = self.triangles.get(key)?.vertices().map(|i| self.params[i]);
        Some((a + b + c) * (1.0 / 3.0))
    }

    /// Candidate point ahead of the longest front edge, with the target
    /// circumradius in parameter units.
    fn rebay_point<F>(&self, key: TriangleKey, fs: &F) -> Option<(Point2, f64)>
    where
        F: ElementFeatureSize + ?Sized,
    {
        let t = self.triangles.get(key)?;
        let front_edges: Vec<(usize, usize)> = t
            .edges()
            .into_iter()
            .filter(|&(a, b)| {
                self.edge_in_pslg(a, b)
                    || self.neighbor(a, b).is_none_or(|(k, _)| {
                        self.triangles
                            .get(k)
                            .is_some_and(|n| n.status == TriangleStatus::Accepted)
                    })
            })
            .collect();
        let candidates = if front_edges.is_empty() {
            t.edges().to_vec()
        } else {
            front_edges
        };
        let (a, b) = candidates.into_iter().max_by(|&(a, b), &(c, d)| {
            self.params[a]
                .distance_squared(self.params[b])
                .total_cmp(&self.params[c].distance_squared(self.params[d]))
        })?;

        let [pa, pb, pc] = t.vertices().map(|i| self.params[i]);
        let (xa, xb) = (self.points[a], self.points[b]);
        let p = self.params[a].distance(self.params[b]);
        if p <= 0.0 {
            return None;
        }
        let m = self.params[a].midpoint(self.params[b]);
        let q = circumcenter(pa, pb, pc).map_or(f64::INFINITY, |cc| m.distance(cc));

        let centroid: Point3 = t
            .vertices()
            .into_iter()
            .fold(Point3::default(), |acc, i| acc + self.points[i])
            * (1.0 / 3.0);
        let h = fs.feature_size(&centroid);
        let stretch = xa.distance(xb) / p;
        if !(h > 0.0 && h.is_finite() && stretch > 0.0 && stretch.is_finite()) {
            return None;
        }
        let rho = h / 3.0_f64.sqrt() / stretch;

        let half = 0.5 * p;
        let cap = if q > 0.0 && q.is_finite() {
            (half * half + q * q) / (2.0 * q)
        } else {
            f64::INFINITY
        };
        let rho_m = rho.max(half).min(cap);
        let d = rho_m + (rho_m * rho_m - half * half).max(0.0).sqrt();

        let dir = self.params[b] - self.params[a];
        let normal = dir.perp() * (1.0 / p);
        let uv = m + normal * d;
        uv.is_finite().then_some((uv, rho))
    }
}
