//! Planar convex hull of indexed points.
//!
//! Used as the constrained boundary when a triangulation is requested without
//! segments, so the mesh covers exactly the convex hull of its input.

use crate::geometry::point::Point2;
use crate::geometry::predicates::{Orientation, orientation};

/// Counter-clockwise convex hull by Andrew's monotone chain.
///
/// Returns the ids of the hull vertices, starting from the lowest-leftmost
/// point. Points on hull edges (within the orientation tolerance) are left
/// out. Fewer than three ids are returned for collinear input.
///
/// # Examples
///
/// ```rust
/// use frontal_delaunay::geometry::algorithms::convex_hull::convex_hull;
/// use frontal_delaunay::geometry::point::Point2;
///
/// let pts = [
///     (10, Point2::new(0.0, 0.0)),
///     (11, Point2::new(2.0, 0.0)),
///     (12, Point2::new(1.0, 0.5)),
///     (13, Point2::new(2.0, 2.0)),
///     (14, Point2::new(0.0, 2.0)),
///     (15, Point2::new(1.0, 0.0)),
/// ];
/// assert_eq!(convex_hull(&pts), vec![10, 11, 13, 14]);
/// ```
#[must_use]
pub fn convex_hull(points: &[(usize, Point2)]) -> Vec<usize> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|(_, a), (_, b)| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup_by(|(_, a), (_, b)| a == b);
    if sorted.len() < 3 {
        return sorted.into_iter().map(|(id, _)| id).collect();
    }

    let mut hull: Vec<(usize, Point2)> = Vec::with_capacity(2 * sorted.len());
    let build = |hull: &mut Vec<(usize, Point2)>, min_len: usize, item: (usize, Point2)| {
        while hull.len() >= min_len {
            let o = hull[hull.len() - 2].1;
            let a = hull[hull.len() - 1].1;
            if orientation(o, a, item.1) == Orientation::POSITIVE {
                break;
            }
            hull.pop();
        }
        hull.push(item);
    };

    for &item in &sorted {
        build(&mut hull, 2, item);
    }
    let lower_len = hull.len() + 1;
    for &item in sorted.iter().rev().skip(1) {
        build(&mut hull, lower_len, item);
    }
    hull.pop();

    hull.into_iter().map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collinear_points_yield_degenerate_hull() {
        let pts: Vec<_> = (0..5)
            .map(|i| {
                #[expect(clippy::cast_precision_loss)]
                let t = i as f64;
                (i, Point2::new(t, 2.0 * t))
            })
            .collect();
        assert!(convex_hull(&pts).len() < 3);
    }

    #[test]
    fn interior_points_are_excluded() {
        let mut pts = vec![
            (0, Point2::new(0.0, 0.0)),
            (1, Point2::new(1.0, 0.0)),
            (2, Point2::new(1.0, 1.0)),
            (3, Point2::new(0.0, 1.0)),
        ];
        pts.extend((0..10).map(|i| {
            #[expect(clippy::cast_precision_loss)]
            let t = 0.05 + 0.09 * i as f64;
            (4 + i, Point2::new(t, 1.0 - t * 0.5))
        }));
        let hull = convex_hull(&pts);
        assert_eq!(hull, vec![0, 1, 2, 3]);
    }
}
