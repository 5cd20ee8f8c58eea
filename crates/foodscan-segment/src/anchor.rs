//! Raw mesh anchors as delivered by the scanning subsystem.

use foodscan_geom::{FaceView, Point3, Triangle, VertexView};
use nalgebra::Matrix4;
use uuid::Uuid;

use crate::error::Result;

/// A strided buffer of `f32` triples.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexSource {
    /// Raw bytes, native-endian.
    pub bytes: Vec<u8>,
    /// Byte distance between consecutive entries.
    pub stride: usize,
    /// Number of entries.
    pub count: usize,
}

impl VertexSource {
    /// Pack points tightly (stride 12).
    pub fn from_points(points: &[Point3]) -> Self {
        let coords: Vec<f32> = points.iter().flat_map(|p| [p.x, p.y, p.z]).collect();
        Self {
            bytes: bytemuck::cast_slice::<f32, u8>(&coords).to_vec(),
            stride: 3 * std::mem::size_of::<f32>(),
            count: points.len(),
        }
    }

    /// Typed view over the buffer.
    pub fn view(&self) -> Result<VertexView<'_>> {
        Ok(VertexView::new(&self.bytes, self.stride, self.count)?)
    }
}

/// A packed buffer of `u32` triangle index triples.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceSource {
    /// Raw bytes, native-endian.
    pub bytes: Vec<u8>,
    /// Number of triangles.
    pub count: usize,
}

impl FaceSource {
    /// Pack triangles.
    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        let indices: Vec<u32> = triangles.iter().flat_map(|t| t.indices).collect();
        Self {
            bytes: bytemuck::cast_slice::<u32, u8>(&indices).to_vec(),
            count: triangles.len(),
        }
    }

    /// Typed view over the buffer.
    pub fn view(&self) -> Result<FaceView<'_>> {
        Ok(FaceView::new(&self.bytes, self.count)?)
    }
}

/// One identified patch of reconstructed surface.
///
/// Normals and the transform ride along for downstream consumers; the
/// segmentation math works on raw vertex positions only.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMeshAnchor {
    /// Stable identifier, unique per anchor.
    pub id: Uuid,
    /// Vertex positions.
    pub vertices: VertexSource,
    /// Triangle indices into `vertices`.
    pub faces: FaceSource,
    /// Per-vertex normals, if the subsystem provides them.
    pub normals: Option<VertexSource>,
    /// Anchor-to-world transform.
    pub transform: Matrix4<f32>,
}

impl RawMeshAnchor {
    /// Create an anchor with an identity transform and no normals.
    pub fn new(id: Uuid, vertices: VertexSource, faces: FaceSource) -> Self {
        Self {
            id,
            vertices,
            faces,
            normals: None,
            transform: Matrix4::identity(),
        }
    }

    /// Build an anchor from typed geometry.
    pub fn from_points(id: Uuid, points: &[Point3], triangles: &[Triangle]) -> Self {
        Self::new(
            id,
            VertexSource::from_points(points),
            FaceSource::from_triangles(triangles),
        )
    }

    /// Set the anchor-to-world transform.
    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    /// Attach per-vertex normals.
    pub fn with_normals(mut self, normals: VertexSource) -> Self {
        self.normals = Some(normals);
        self
    }
}
