//! The constrained Delaunay triangulation engine.
//!
//! [`Triangulation`] owns the parallel point arrays (parametric and 3-D
//! coordinates), the triangle worklist, the directed-edge table, and the
//! quadtree. Points `0..FIXED_POINT_OFFSET` are frame points spanning an
//! enlarged bounding box of the input; they bootstrap the incremental
//! insertion and are carved away together with every triangle outside the
//! constrained boundary.
//!
//! The algorithms live in [`crate::core::algorithms`] as further `impl`
//! blocks:
//!
//! - point location: [`locate`](crate::core::algorithms::locate)
//! - Bowyer-Watson insertion: [`insertion`](crate::core::algorithms::insertion)
//! - constrained segments: [`segment_insertion`](crate::core::algorithms::segment_insertion)
//! - edge flips: [`flips`](crate::core::algorithms::flips)
//! - frontal refinement: [`frontal`](crate::core::algorithms::frontal)
//!
//! # Examples
//!
//! ```rust
//! use frontal_delaunay::prelude::*;
//!
//! let square = [
//!     Point2::new(0.0, 0.0),
//!     Point2::new(1.0, 0.0),
//!     Point2::new(1.0, 1.0),
//!     Point2::new(0.0, 1.0),
//! ];
//! let segments = [(0, 1), (1, 2), (2, 3), (3, 0)];
//! let tri = Triangulation::triangulate(PlanarSurface, &square, &segments, &[]).unwrap();
//!
//! assert_eq!(tri.num_triangles(), 2);
//! assert!(tri.diagnostics().is_clean());
//! ```

use crate::core::algorithms::insertion::InsertionError;
use crate::core::algorithms::segment_insertion::SegmentError;
use crate::core::collections::{
    FastHashMap, FastHashSet, STAR_BUFFER_SIZE, SmallBuffer, undirected,
};
use crate::core::edge_table::{EdgeTable, TopologyError};
use crate::core::quadtree::QuadTree;
use crate::core::triangle::{TAG_EXTERIOR, TAG_NONE, Triangle, TriangleStatus};
use crate::core::triangle_list::{TriangleKey, TriangleList};
use crate::geometry::algorithms::convex_hull::convex_hull;
use crate::geometry::point::{Point2, Point3};
use crate::geometry::predicates::{self, InCircle};
use crate::geometry::surface::{MetricTensor, Surface};
use thiserror::Error;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Number of frame points; the first input point has this index.
pub const FIXED_POINT_OFFSET: usize = 4;

/// Two points closer than this fraction of the frame diagonal are the same.
pub const DUPLICATE_TOLERANCE: f64 = 1e-10;

/// Frame margin on each side, as a fraction of the larger bounding-box
/// extent.
pub const FRAME_MARGIN: f64 = 0.1;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that abort a triangulation.
///
/// Geometric failures of individual points or segments do not abort; they are
/// collected in [`Diagnostics`].
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TriangulationError {
    /// Too few input points to form a triangle.
    #[error("At least 3 input points are required, got {count}")]
    InsufficientPoints {
        /// Number of points supplied.
        count: usize,
    },
    /// An input point or bound has a NaN or infinite coordinate.
    #[error("Input point {index} has non-finite coordinates")]
    NonFinitePoint {
        /// Index into the input array.
        index: usize,
    },
    /// The bounding rectangle is empty or inverted.
    #[error("Invalid bounds [{low:?}, {high:?}]")]
    InvalidBounds {
        /// Lower corner.
        low: Point2,
        /// Upper corner.
        high: Point2,
    },
    /// A segment references a point that does not exist.
    #[error("Segment {index} references point {point}, but only {count} points were given")]
    SegmentIndexOutOfRange {
        /// Segment index.
        index: usize,
        /// Offending point index.
        point: usize,
        /// Number of input points.
        count: usize,
    },
    /// All inserted points are collinear.
    #[error("Input points are collinear; no triangle can be formed")]
    DegenerateInput,
    /// Carving removed every triangle, so the constrained boundary leaks.
    #[error("Constrained boundary is not closed; carving removed every triangle")]
    UnclosedBoundary,
    /// A point index passed to the engine is out of range.
    #[error("Point index {index} is out of range")]
    PointIndexOutOfRange {
        /// The offending index.
        index: usize,
    },
    /// The mesh topology is inconsistent.
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// A point that was not inserted.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedPoint {
    /// Point index.
    pub index: usize,
    /// Why it was skipped.
    pub error: InsertionError,
}

/// A point that coincides with an earlier one and was merged into it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AliasedPoint {
    /// Point index of the duplicate.
    pub index: usize,
    /// Point index it was merged into.
    pub existing: usize,
}

/// A constrained segment that could not be recovered.
#[derive(Clone, Debug, PartialEq)]
pub struct FailedSegment {
    /// First end point.
    pub u: usize,
    /// Second end point.
    pub v: usize,
    /// Why it failed.
    pub error: SegmentError,
}

/// Non-fatal problems encountered while meshing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
    /// Points that could not be inserted.
    pub skipped_points: Vec<SkippedPoint>,
    /// Duplicate points merged into an earlier point.
    pub aliased_points: Vec<AliasedPoint>,
    /// Segments that could not be recovered.
    pub failed_segments: Vec<FailedSegment>,
    /// Hole seeds not inside any triangle.
    pub unlocated_holes: Vec<usize>,
}

impl Diagnostics {
    /// Whether nothing was skipped, merged, or left out.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped_points.is_empty()
            && self.aliased_points.is_empty()
            && self.failed_segments.is_empty()
            && self.unlocated_holes.is_empty()
    }
}

// =============================================================================
// TRIANGULATION
// =============================================================================

/// Constrained Delaunay triangulation of a parametric surface patch.
#[derive(Clone, Debug)]
pub struct Triangulation<S> {
    pub(crate) surface: S,
    pub(crate) params: Vec<Point2>,
    pub(crate) points: Vec<Point3>,
    pub(crate) in_mesh: Vec<bool>,
    pub(crate) point_to_triangle: Vec<Option<TriangleKey>>,
    pub(crate) triangles: TriangleList,
    pub(crate) edges: EdgeTable,
    pub(crate) quadtree: QuadTree,
    pub(crate) pslg: FastHashSet<(usize, usize)>,
    pub(crate) aliases: FastHashMap<usize, usize>,
    pub(crate) holes: Vec<Point2>,
    pub(crate) degenerate_pairs: Vec<(usize, usize)>,
    pub(crate) metric: Option<MetricTensor>,
    pub(crate) duplicate_tolerance: f64,
    pub(crate) diagnostics: Diagnostics,
}

impl<S: Surface> Triangulation<S> {
    /// Create an empty triangulation whose frame encloses `[low, high]`.
    ///
    /// The result holds only the four frame points and two frame triangles;
    /// points are added with [`add_point`](Self::add_point).
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::InvalidBounds`] if the bounds are not
    /// finite or `low > high` in either coordinate.
    pub fn with_bounds(surface: S, low: Point2, high: Point2) -> Result<Self, TriangulationError> {
        if !(low.is_finite() && high.is_finite() && low.x <= high.x && low.y <= high.y) {
            return Err(TriangulationError::InvalidBounds { low, high });
        }

        let extent = (high.x - low.x).max(high.y - low.y);
        let margin = if extent > 0.0 {
            FRAME_MARGIN * extent
        } else {
            1.0
        };
        let lo = Point2::new(low.x - margin, low.y - margin);
        let hi = Point2::new(high.x + margin, high.y + margin);
        let frame = [
            lo,
            Point2::new(hi.x, lo.y),
            hi,
            Point2::new(lo.x, hi.y),
        ];

        let mut tri = Self {
            surface,
            params: Vec::new(),
            points: Vec::new(),
            in_mesh: Vec::new(),
            point_to_triangle: Vec::new(),
            triangles: TriangleList::new(),
            edges: EdgeTable::new(),
            quadtree: QuadTree::new(lo, hi),
            pslg: FastHashSet::default(),
            aliases: FastHashMap::default(),
            holes: Vec::new(),
            degenerate_pairs: Vec::new(),
            metric: None,
            duplicate_tolerance: DUPLICATE_TOLERANCE * lo.distance(hi),
            diagnostics: Diagnostics::default(),
        };

        // Frame points are never evaluated on the surface.
        for (id, p) in frame.into_iter().enumerate() {
            tri.push_point(p, Point3::new(p.x, p.y, 0.0));
            tri.in_mesh[id] = true;
            tri.quadtree
                .add_node(id, p)
                .map_err(|_| TriangulationError::InvalidBounds { low, high })?;
        }
        tri.add_triangle(0, 1, 2)?;
        tri.add_triangle(0, 2, 3)?;

        tracing::debug!(?lo, ?hi, "created frame triangulation");
        Ok(tri)
    }

    /// Batch-triangulate a planar straight-line graph in parameter space.
    ///
    /// Input point `i` receives point index `FIXED_POINT_OFFSET + i`;
    /// `segments` and [`remove_degenerate_edges`](Self::remove_degenerate_edges)
    /// use input indices and point indices respectively. The steps are:
    ///
    /// 1. insert every point by Bowyer-Watson (duplicates are aliased),
    /// 2. recover every segment, or the convex hull when `segments` is empty,
    /// 3. flip unconstrained edges until locally Delaunay,
    /// 4. carve away triangles outside the boundary or inside a hole.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError`] for invalid input, collinear input, an
    /// unclosed boundary, or a topology violation. Points and segments that
    /// fail geometrically are reported in [`diagnostics`](Self::diagnostics).
    pub fn triangulate(
        surface: S,
        points: &[Point2],
        segments: &[(usize, usize)],
        holes: &[Point2],
    ) -> Result<Self, TriangulationError> {
        if points.len() < 3 {
            return Err(TriangulationError::InsufficientPoints {
                count: points.len(),
            });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(TriangulationError::NonFinitePoint { index });
        }
        for (index, &(a, b)) in segments.iter().enumerate() {
            if let Some(point) = [a, b].into_iter().find(|&p| p >= points.len()) {
                return Err(TriangulationError::SegmentIndexOutOfRange {
                    index,
                    point,
                    count: points.len(),
                });
            }
        }

        let (low, high) = bounding_box(points);
        let mut tri = Self::with_bounds(surface, low, high)?;

        for &uv in points {
            let xyz = tri.surface.eval_point(uv);
            let fallback = Point3::new(uv.x, uv.y, 0.0);
            let index = tri.push_point(uv, xyz.as_ref().copied().unwrap_or(fallback));
            match xyz {
                Ok(_) => tri.insert_input_point(index)?,
                Err(err) => tri.skip_point(index, err.into()),
            }
        }

        let constraints: Vec<(usize, usize)> = if segments.is_empty() {
            tri.hull_segments()?
        } else {
            segments
                .iter()
                .map(|&(a, b)| (a + FIXED_POINT_OFFSET, b + FIXED_POINT_OFFSET))
                .collect()
        };
        if tri.real_triangle_count() == 0 {
            return Err(TriangulationError::DegenerateInput);
        }

        tri.set_up_pslg_edges(&constraints)?;
        let flips = tri.delaunay_edge_flip()?;

        tri.holes = holes.to_vec();
        let carved = tri.carve_exterior()?;
        if tri.triangles.is_empty() {
            return Err(TriangulationError::UnclosedBoundary);
        }

        tracing::info!(
            points = points.len(),
            segments = constraints.len(),
            triangles = tri.triangles.len(),
            flips,
            carved,
            skipped = tri.diagnostics.skipped_points.len(),
            failed_segments = tri.diagnostics.failed_segments.len(),
            "triangulated planar straight-line graph"
        );
        Ok(tri)
    }

    fn insert_input_point(&mut self, index: usize) -> Result<(), TriangulationError> {
        let uv = self.params[index];
        let duplicate = self
            .quadtree
            .find_closest(uv)
            .filter(|&(_, dist)| dist <= self.duplicate_tolerance);
        if let Some((existing, dist)) = duplicate {
            tracing::debug!(index, existing, dist, "aliasing duplicate input point");
            self.aliases.insert(index, existing);
            self.diagnostics
                .aliased_points
                .push(AliasedPoint { index, existing });
            return Ok(());
        }

        match self.add_point_to_mesh(index, None) {
            Ok(_) => {
                if let Err(err) = self.quadtree.add_node(index, uv) {
                    self.skip_point(index, err.into());
                }
                Ok(())
            }
            Err(InsertionError::Topology(err)) => Err(err.into()),
            Err(err) => {
                self.skip_point(index, err);
                Ok(())
            }
        }
    }

    fn skip_point(&mut self, index: usize, error: InsertionError) {
        tracing::warn!(index, %error, "skipping point");
        self.diagnostics
            .skipped_points
            .push(SkippedPoint { index, error });
    }

    /// Convex hull of the inserted points as closed segment loop.
    fn hull_segments(&self) -> Result<Vec<(usize, usize)>, TriangulationError> {
        let candidates: Vec<(usize, Point2)> = (FIXED_POINT_OFFSET..self.params.len())
            .filter(|&i| self.in_mesh[i])
            .map(|i| (i, self.params[i]))
            .collect();
        let hull = convex_hull(&candidates);
        if hull.len() < 3 {
            return Err(TriangulationError::DegenerateInput);
        }
        Ok((0..hull.len())
            .map(|i| (hull[i], hull[(i + 1) % hull.len()]))
            .collect())
    }

    fn real_triangle_count(&self) -> usize {
        self.triangles
            .iter()
            .filter(|(_, t)| t.vertices().iter().all(|&p| !self.is_frame_point(p)))
            .count()
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// The surface collaborator.
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// Number of stored points, frame points included.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.params.len()
    }

    /// Number of live triangles.
    #[must_use]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Parametric coordinates of every stored point.
    #[must_use]
    pub fn params(&self) -> &[Point2] {
        &self.params
    }

    /// Surface coordinates of every stored point.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Whether point `index` is one of the frame points.
    #[must_use]
    pub const fn is_frame_point(&self, index: usize) -> bool {
        index < FIXED_POINT_OFFSET
    }

    /// Whether point `index` is a vertex of the mesh.
    #[must_use]
    pub fn is_in_mesh(&self, index: usize) -> bool {
        self.in_mesh.get(index).copied().unwrap_or(false)
    }

    /// The point that `index` was merged into, or `index` itself.
    #[must_use]
    pub fn resolve_alias(&self, index: usize) -> usize {
        self.aliases.get(&index).copied().unwrap_or(index)
    }

    /// Live triangles in insertion order.
    pub fn triangles(&self) -> impl Iterator<Item = (TriangleKey, &Triangle)> + '_ {
        self.triangles.iter()
    }

    /// Borrow a triangle.
    #[must_use]
    pub fn triangle(&self, key: TriangleKey) -> Option<&Triangle> {
        self.triangles.get(key)
    }

    /// Owner of the directed edge `(u, v)`.
    #[must_use]
    pub fn edge_owner(&self, u: usize, v: usize) -> Option<TriangleKey> {
        self.edges.get(u, v)
    }

    /// Triangle across edge `(u, v)` of a triangle owning `(u, v)`, with its
    /// vertex opposite the edge.
    #[must_use]
    pub fn neighbor(&self, u: usize, v: usize) -> Option<(TriangleKey, usize)> {
        let key = self.edges.get(v, u)?;
        let x = self.triangles.get(key)?.opposite(v, u)?;
        Some((key, x))
    }

    /// Whether the directed edge `(u, v)` has no triangle on its far side.
    #[must_use]
    pub fn is_boundary_edge(&self, u: usize, v: usize) -> bool {
        self.edges.contains(u, v) && !self.edges.contains(v, u)
    }

    /// Constrained edges as sorted index pairs.
    pub fn pslg_edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pslg.iter().copied()
    }

    /// Non-fatal problems collected so far.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Hole seeds used for carving.
    #[must_use]
    pub fn holes(&self) -> &[Point2] {
        &self.holes
    }

    // =========================================================================
    // POINTS
    // =========================================================================

    pub(crate) fn push_point(&mut self, uv: Point2, xyz: Point3) -> usize {
        self.params.push(uv);
        self.points.push(xyz);
        self.in_mesh.push(false);
        self.point_to_triangle.push(None);
        self.params.len() - 1
    }

    // =========================================================================
    // TRIANGLES
    // =========================================================================

    /// Add triangle `(u, v, w)` and register its three directed edges.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::DuplicateEdge`] if any of the edges is
    /// already owned, [`TopologyError::DegenerateTriangle`] if a vertex
    /// repeats or is unknown, or [`TopologyError::Inverted`] if the vertices
    /// are not counter-clockwise in parameter space. Nothing is modified on
    /// error.
    pub fn add_triangle(
        &mut self,
        u: usize,
        v: usize,
        w: usize,
    ) -> Result<TriangleKey, TopologyError> {
        let tri = Triangle::new(u, v, w);
        if !tri.has_distinct_vertices() {
            return Err(TopologyError::DegenerateTriangle { u, v, w });
        }
        let (Some(&pu), Some(&pv), Some(&pw)) =
            (self.params.get(u), self.params.get(v), self.params.get(w))
        else {
            return Err(TopologyError::DegenerateTriangle { u, v, w });
        };
        if predicates::orientation(pu, pv, pw) != predicates::Orientation::POSITIVE {
            return Err(TopologyError::Inverted { u, v, w });
        }
        if let Some((a, b)) = tri.edges().into_iter().find(|&(a, b)| self.edges.contains(a, b)) {
            return Err(TopologyError::DuplicateEdge { u: a, v: b });
        }

        let key = self.triangles.push(tri);
        for (a, b) in tri.edges() {
            self.edges.insert(a, b, key)?;
        }
        for p in tri.vertices() {
            if let Some(slot) = self.point_to_triangle.get_mut(p) {
                *slot = Some(key);
            }
        }
        Ok(key)
    }

    /// Remove a triangle and its edge registrations.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::StaleTriangle`] for a dead key and
    /// [`TopologyError::MissingEdge`] if an edge registration is missing.
    pub fn delete_triangle(&mut self, key: TriangleKey) -> Result<Triangle, TopologyError> {
        let tri = self.triangles.remove(key).ok_or(TopologyError::StaleTriangle)?;
        for (a, b) in tri.edges() {
            if self.edges.remove(a, b) != Some(key) {
                return Err(TopologyError::MissingEdge { u: a, v: b });
            }
        }
        for p in tri.vertices() {
            if let Some(slot) = self.point_to_triangle.get_mut(p) {
                if *slot == Some(key) {
                    *slot = None;
                }
            }
        }
        Ok(tri)
    }

    /// Purge every triangle whose status is [`TriangleStatus::DeleteMe`].
    ///
    /// # Errors
    ///
    /// Propagates [`TopologyError`] from [`delete_triangle`](Self::delete_triangle).
    pub fn delete_triangles_from_list(&mut self) -> Result<usize, TopologyError> {
        let doomed: Vec<TriangleKey> = self
            .triangles
            .iter()
            .filter(|(_, t)| t.status == TriangleStatus::DeleteMe)
            .map(|(k, _)| k)
            .collect();
        for &key in &doomed {
            self.delete_triangle(key)?;
        }
        Ok(doomed.len())
    }

    /// Set the tag of every triangle.
    pub fn set_triangle_tags(&mut self, tag: i32) {
        let keys: Vec<TriangleKey> = self.triangles.keys().collect();
        for key in keys {
            if let Some(t) = self.triangles.get_mut(key) {
                t.tag = tag;
            }
        }
    }

    /// Flood-fill `tag` from `seed` across unconstrained edges.
    ///
    /// Triangles already carrying `tag` stop the fill. Returns the number of
    /// triangles tagged.
    pub fn tag_triangles(&mut self, seed: TriangleKey, tag: i32) -> usize {
        let mut stack = vec![seed];
        let mut count = 0;
        while let Some(key) = stack.pop() {
            let Some(t) = self.triangles.get_mut(key) else {
                continue;
            };
            if t.tag == tag {
                continue;
            }
            t.tag = tag;
            count += 1;
            let edges = t.edges();
            for (a, b) in edges {
                if self.edge_in_pslg(a, b) {
                    continue;
                }
                if let Some(next) = self.edges.get(b, a) {
                    stack.push(next);
                }
            }
        }
        count
    }

    /// Remove the triangles outside the constrained boundary and inside
    /// holes. Returns the number of triangles removed.
    pub(crate) fn carve_exterior(&mut self) -> Result<usize, TopologyError> {
        self.set_triangle_tags(TAG_NONE);

        let mut seeds: Vec<TriangleKey> = self
            .triangles
            .iter()
            .filter(|(_, t)| t.vertices().iter().any(|&p| self.is_frame_point(p)))
            .map(|(k, _)| k)
            .collect();
        for (i, &hole) in self.holes.iter().enumerate() {
            match self.locate_linear(hole) {
                Some(key) => seeds.push(key),
                None => {
                    tracing::warn!(hole = i, ?hole, "hole seed is not inside any triangle");
                    self.diagnostics.unlocated_holes.push(i);
                }
            }
        }

        for seed in seeds {
            self.tag_triangles(seed, TAG_EXTERIOR);
        }

        let keys: Vec<TriangleKey> = self.triangles.keys().collect();
        for key in keys {
            if let Some(t) = self.triangles.get_mut(key) {
                if t.tag == TAG_EXTERIOR {
                    t.status = TriangleStatus::DeleteMe;
                }
            }
        }
        let removed = self.delete_triangles_from_list()?;

        // Points that lost every triangle are no longer part of the mesh.
        let mut referenced = vec![false; self.params.len()];
        for (_, t) in self.triangles.iter() {
            for p in t.vertices() {
                referenced[p] = true;
            }
        }
        for (i, flag) in referenced.into_iter().enumerate() {
            if !flag && self.in_mesh[i] {
                self.in_mesh[i] = false;
                if self.is_frame_point(i) {
                    continue;
                }
                if let Err(err) = self.quadtree.delete_node(i, self.params[i]) {
                    tracing::debug!(%err, point = i, "carved point was not indexed");
                }
            }
        }

        tracing::debug!(removed, remaining = self.triangles.len(), "carved exterior");
        Ok(removed)
    }

    /// Triangles incident to point `p`, rotating counter-clockwise first.
    pub(crate) fn star(&self, p: usize) -> SmallBuffer<TriangleKey, STAR_BUFFER_SIZE> {
        let mut star = SmallBuffer::new();
        let start = self
            .point_to_triangle
            .get(p)
            .copied()
            .flatten()
            .filter(|&k| self.triangles.get(k).is_some_and(|t| t.has_vertex(p)))
            .or_else(|| {
                self.triangles
                    .iter()
                    .find(|(_, t)| t.has_vertex(p))
                    .map(|(k, _)| k)
            });
        let Some(start) = start else {
            return star;
        };
        star.push(start);

        let limit = self.triangles.len();
        let mut current = start;
        let mut closed = false;
        while star.len() <= limit {
            let Some((_, b)) = self.fan_edge(current, p) else {
                break;
            };
            match self.edges.get(p, b) {
                Some(next) if next == start => {
                    closed = true;
                    break;
                }
                Some(next) => {
                    star.push(next);
                    current = next;
                }
                None => break,
            }
        }

        if !closed {
            current = start;
            while star.len() <= limit {
                let Some((a, _)) = self.fan_edge(current, p) else {
                    break;
                };
                match self.edges.get(a, p) {
                    Some(prev) if prev != start => {
                        star.push(prev);
                        current = prev;
                    }
                    _ => break,
                }
            }
        }
        star
    }

    /// `(a, b)` such that the triangle is `(p, a, b)` up to rotation.
    pub(crate) fn fan_edge(&self, key: TriangleKey, p: usize) -> Option<(usize, usize)> {
        let t = self.triangles.get(key)?;
        if t.u == p {
            Some((t.v, t.w))
        } else if t.v == p {
            Some((t.w, t.u))
        } else if t.w == p {
            Some((t.u, t.v))
        } else {
            None
        }
    }

    // =========================================================================
    // CONSTRAINTS
    // =========================================================================

    /// Recover every segment as a mesh edge and mark it constrained.
    ///
    /// Segment end points are point indices; aliases are resolved first.
    /// Segments that cannot be recovered are recorded in the diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::PointIndexOutOfRange`] for an unknown
    /// point and propagates topology violations.
    pub fn set_up_pslg_edges(
        &mut self,
        segments: &[(usize, usize)],
    ) -> Result<(), TriangulationError> {
        for &(a, b) in segments {
            for p in [a, b] {
                if p >= self.params.len() {
                    return Err(TriangulationError::PointIndexOutOfRange { index: p });
                }
            }
            let (u, v) = (self.resolve_alias(a), self.resolve_alias(b));
            if u == v {
                tracing::debug!(a, b, "dropping zero-length segment");
                continue;
            }
            match self.insert_segment(u, v) {
                Ok(()) => {}
                Err(SegmentError::Topology(err)) => return Err(err.into()),
                Err(error) => {
                    tracing::warn!(u = a, v = b, %error, "could not recover segment");
                    self.diagnostics.failed_segments.push(FailedSegment {
                        u: a,
                        v: b,
                        error,
                    });
                }
            }
        }
        Ok(())
    }

    /// Whether `(u, v)`, in either direction, is a constrained edge.
    #[must_use]
    pub fn edge_in_pslg(&self, u: usize, v: usize) -> bool {
        self.pslg.contains(&undirected(u, v))
    }

    // =========================================================================
    // PREDICATES
    // =========================================================================

    /// In-circle test of point `d` against the counter-clockwise triangle
    /// `(a, b, c)`.
    ///
    /// While a face metric is active (frontal refinement on a curved
    /// surface), the points are first mapped through it so the test measures
    /// approximate surface distance.
    #[must_use]
    pub fn in_circle(&self, a: usize, b: usize, c: usize, d: usize) -> InCircle {
        let [pa, pb, pc, pd] = [a, b, c, d].map(|i| self.params[i]);
        match self.metric {
            Some(m) => predicates::in_circle(
                m.transform(pa),
                m.transform(pb),
                m.transform(pc),
                m.transform(pd),
            ),
            None => predicates::in_circle(pa, pb, pc, pd),
        }
    }

    /// Whether the diagonal `(a, b)` should replace the diagonal `(c, d)` of
    /// a quadrilateral whose four points are cocircular.
    #[must_use]
    pub(crate) const fn prefers_diagonal(a: usize, b: usize, c: usize, d: usize) -> bool {
        let (p0, p1) = undirected(a, b);
        let (q0, q1) = undirected(c, d);
        p0 < q0 || (p0 == q0 && p1 < q1)
    }

    /// Whether the edge `(v, w)` shared by the triangles `(u, v, w)` and
    /// `(w, v, x)` must be replaced by `(u, x)`.
    ///
    /// Cocircular configurations keep the lexicographically smaller diagonal,
    /// which makes the outcome independent of insertion history.
    pub(crate) fn is_illegal(&self, u: usize, v: usize, w: usize, x: usize) -> bool {
        match self.in_circle(u, v, w, x) {
            InCircle::INSIDE => true,
            InCircle::OUTSIDE => false,
            InCircle::BOUNDARY => Self::prefers_diagonal(u, x, v, w),
        }
    }

    // =========================================================================
    // EXPORT PREPARATION
    // =========================================================================

    /// Record pairs of point indices that are the same physical point.
    ///
    /// [`get_mesh`](Self::get_mesh) merges the second point of each pair into
    /// the first and drops triangles that collapse.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::PointIndexOutOfRange`] for an unknown
    /// point.
    pub fn remove_degenerate_edges(
        &mut self,
        pairs: &[(usize, usize)],
    ) -> Result<(), TriangulationError> {
        for &(a, b) in pairs {
            for p in [a, b] {
                if p >= self.params.len() {
                    return Err(TriangulationError::PointIndexOutOfRange { index: p });
                }
            }
            if a != b {
                self.degenerate_pairs.push((a, b));
            }
        }
        Ok(())
    }
}

/// Axis-aligned bounding box of a non-empty point set.
fn bounding_box(points: &[Point2]) -> (Point2, Point2) {
    points.iter().fold(
        (
            Point2::new(f64::INFINITY, f64::INFINITY),
            Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        ),
        |(lo, hi), p| {
            (
                Point2::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point2::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        },
    )
}

// =============================================================================
// TESTS
// =============================================================================
