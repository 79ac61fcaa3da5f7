//! Legacy ASCII VTK export for inspecting meshes.
//!
//! The output is an `UNSTRUCTURED_GRID` with one triangle cell (type 5) per
//! mesh triangle, in surface coordinates or in parameter space (`z = 0`).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::core::mesh::Mesh;
use crate::core::triangulation::Triangulation;
use crate::geometry::surface::Surface;

/// VTK cell type of a linear triangle.
pub const VTK_TRIANGLE: u8 = 5;

/// Errors raised while exporting a mesh.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Writing failed.
    #[error("I/O error during export: {0}")]
    Io(#[from] io::Error),
}

/// Coordinates written for each point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VtkSpace {
    /// Surface coordinates.
    #[default]
    Surface,
    /// Parametric coordinates with `z = 0`.
    Parametric,
}

/// Write `mesh` as a legacy ASCII VTK unstructured grid.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if writing fails.
///
/// # Examples
///
/// ```rust
/// use frontal_delaunay::core::mesh::Mesh;
/// use frontal_delaunay::geometry::point::{Point2, Point3};
/// use frontal_delaunay::io::vtk::{VtkSpace, write_vtk};
///
/// let mesh = Mesh {
///     num_points: 3,
///     num_triangles: 1,
///     conn: vec![[0, 1, 2]],
///     params: vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)],
///     points: vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
/// };
/// let mut out = Vec::new();
/// write_vtk(&mesh, VtkSpace::Surface, &mut out).unwrap();
/// let text = String::from_utf8(out).unwrap();
/// assert!(text.contains("POINTS 3 double"));
/// assert!(text.contains("CELLS 1 4"));
/// ```
pub fn write_vtk<W: Write>(mesh: &Mesh, space: VtkSpace, out: &mut W) -> Result<(), ExportError> {
    writeln!(out, "# vtk DataFile Version 2.0")?;
    writeln!(out, "frontal-delaunay mesh")?;
    writeln!(out, "ASCII")?;
    writeln!(out, "DATASET UNSTRUCTURED_GRID")?;

    writeln!(out, "POINTS {} double", mesh.params.len())?;
    match space {
        VtkSpace::Surface => {
            for p in &mesh.points {
                writeln!(out, "{} {} {}", p.x, p.y, p.z)?;
            }
        }
        VtkSpace::Parametric => {
            for p in &mesh.params {
                writeln!(out, "{} {} 0", p.x, p.y)?;
            }
        }
    }

    let n = mesh.conn.len();
    writeln!(out, "CELLS {n} {}", 4 * n)?;
    for [a, b, c] in &mesh.conn {
        writeln!(out, "3 {a} {b} {c}")?;
    }
    writeln!(out, "CELL_TYPES {n}")?;
    for _ in 0..n {
        writeln!(out, "{VTK_TRIANGLE}")?;
    }
    out.flush()?;
    Ok(())
}

impl<S: Surface> Triangulation<S> {
    /// Export the current mesh to a VTK file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the file cannot be created or written.
    pub fn write_to_vtk<P: AsRef<Path>>(
        &self,
        path: P,
        space: VtkSpace,
    ) -> Result<(), ExportError> {
        let mesh = self.get_mesh();
        let mut out = BufWriter::new(File::create(path.as_ref())?);
        write_vtk(&mesh, space, &mut out)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            points = mesh.num_points,
            triangles = mesh.num_triangles,
            "wrote VTK mesh"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::{Point2, Point3};
    use crate::geometry::surface::AffineSurface;

    #[test]
    fn parametric_export_has_flat_points() {
        let surface = AffineSurface::new(
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let tri = Triangulation::triangulate(surface, &pts, &[], &[]).unwrap();
        let mesh = tri.get_mesh();

        let mut flat = Vec::new();
        write_vtk(&mesh, VtkSpace::Parametric, &mut flat).unwrap();
        let flat = String::from_utf8(flat).unwrap();
        assert!(flat.contains("\n1 1 0\n"));

        let mut lifted = Vec::new();
        write_vtk(&mesh, VtkSpace::Surface, &mut lifted).unwrap();
        let lifted = String::from_utf8(lifted).unwrap();
        assert!(lifted.contains("\n1 1 2\n"));
        assert_eq!(lifted.lines().filter(|l| *l == "5").count(), 2);
    }

    #[test]
    fn io_errors_are_reported() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let err = write_vtk(&Mesh::default(), VtkSpace::Surface, &mut Broken).unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }
}
