//! Volume estimation by tetrahedron decomposition.
//!
//! Every triangle forms a tetrahedron with the origin; the estimate is the
//! sum of their unsigned volumes. For a closed mesh enclosing the origin
//! this is the enclosed volume. Partial scans are rarely watertight, so the
//! result is an estimate, not an exact measure.

use foodscan_geom::{Point3, Triangle};
use rayon::prelude::*;

/// Unsigned volume of the tetrahedron `(origin, a, b, c)`: `|a · (b × c)| / 6`.
///
/// Evaluated in `f64` to keep thin slabs from cancelling out.
pub fn tetrahedron_volume(a: &Point3, b: &Point3, c: &Point3) -> f64 {
    let a = a.coords.cast::<f64>();
    let b = b.coords.cast::<f64>();
    let c = c.coords.cast::<f64>();
    a.dot(&b.cross(&c)).abs() / 6.0
}

/// Sum tetrahedron volumes over all triangles whose indices fit `vertices`.
///
/// Triangles with any index `>= vertices.len()` are skipped.
pub fn mesh_volume(vertices: &[Point3], triangles: &[Triangle]) -> f64 {
    triangles
        .par_iter()
        .filter(|t| t.fits(vertices.len()))
        .map(|t| {
            let [a, b, c] = t.as_usize();
            tetrahedron_volume(&vertices[a], &vertices[b], &vertices[c])
        })
        .sum()
}
