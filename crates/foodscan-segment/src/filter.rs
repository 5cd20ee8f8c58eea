//! Height filtering of anchor geometry.
//!
//! Removes low-lying vertices (residual plate geometry fused into an object
//! anchor) and rebuilds the triangle list according to a [`FilterPolicy`].

use foodscan_geom::{Point3, Triangle};

use crate::config::FilterPolicy;

/// Geometry left after the height filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredMesh {
    /// Retained vertices, in original order.
    pub vertices: Vec<Point3>,
    /// Triangles indexing into `vertices`.
    pub triangles: Vec<Triangle>,
    /// Face count to report for this segment.
    pub face_count: usize,
}

/// Keep vertices with `y > cutoff` and resolve triangles per `policy`.
pub fn filter_by_height<I>(
    vertices: I,
    triangles: &[Triangle],
    cutoff: f32,
    policy: FilterPolicy,
) -> FilteredMesh
where
    I: IntoIterator<Item = Point3>,
{
    match policy {
        FilterPolicy::Remap => filter_remap(vertices, triangles, cutoff),
        FilterPolicy::Positional => filter_positional(vertices, triangles, cutoff),
    }
}

fn filter_remap<I>(vertices: I, triangles: &[Triangle], cutoff: f32) -> FilteredMesh
where
    I: IntoIterator<Item = Point3>,
{
    let mut kept = Vec::new();
    let remap: Vec<Option<u32>> = vertices
        .into_iter()
        .map(|v| {
            (v.y > cutoff).then(|| {
                kept.push(v);
                (kept.len() - 1) as u32
            })
        })
        .collect();

    let resolve = |i: u32| remap.get(i as usize).copied().flatten();
    let triangles: Vec<Triangle> = triangles
        .iter()
        .filter_map(|t| {
            let [a, b, c] = t.indices;
            Some(Triangle::new(resolve(a)?, resolve(b)?, resolve(c)?))
        })
        .collect();

    FilteredMesh {
        vertices: kept,
        face_count: triangles.len(),
        triangles,
    }
}

fn filter_positional<I>(vertices: I, triangles: &[Triangle], cutoff: f32) -> FilteredMesh
where
    I: IntoIterator<Item = Point3>,
{
    let kept: Vec<Point3> = vertices.into_iter().filter(|v| v.y > cutoff).collect();
    let retained = triangles
        .iter()
        .copied()
        .filter(|t| t.fits(kept.len()))
        .collect();

    FilteredMesh {
        vertices: kept,
        triangles: retained,
        face_count: triangles.len(),
    }
}
