//! Typed views over raw vertex and face buffers.
//!
//! Scanning subsystems hand geometry over as untyped byte buffers: vertices
//! as `f32` triples laid out with an arbitrary byte stride, faces as packed
//! `u32` index triples. The views here validate the layout once, up front,
//! so that every later read is in bounds.

use bytemuck::pod_read_unaligned;

use crate::error::{GeomError, Result};
use crate::Point3;

const COORD_SIZE: usize = std::mem::size_of::<f32>();
const POINT_SIZE: usize = 3 * COORD_SIZE;
const INDEX_SIZE: usize = std::mem::size_of::<u32>();
const TRIANGLE_SIZE: usize = 3 * INDEX_SIZE;

/// A triangular face: three indices into a vertex sequence.
///
/// Indices are not checked against any vertex count here; consumers must
/// skip triangles that reach past the vertices they hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triangle {
    /// Vertex indices, in winding order.
    pub indices: [u32; 3],
}

impl Triangle {
    /// Create a triangle from three vertex indices.
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self { indices: [a, b, c] }
    }

    /// Indices widened to `usize`.
    pub fn as_usize(&self) -> [usize; 3] {
        self.indices.map(|i| i as usize)
    }

    /// True if every index is `< vertex_count`.
    pub fn fits(&self, vertex_count: usize) -> bool {
        self.indices.iter().all(|&i| (i as usize) < vertex_count)
    }
}

/// Read-only view of a strided vertex buffer.
///
/// Each vertex occupies `stride` bytes, the first twelve of which are its
/// `x`, `y`, `z` coordinates as native-endian `f32`.
#[derive(Debug, Clone, Copy)]
pub struct VertexView<'a> {
    bytes: &'a [u8],
    stride: usize,
    count: usize,
}

impl<'a> VertexView<'a> {
    /// Wrap `bytes` as `count` vertices spaced `stride` bytes apart.
    ///
    /// Fails with [`GeomError::InvalidBufferLayout`] if the stride is not a
    /// positive multiple of the coordinate size, is too small to hold a
    /// point, or if the buffer is shorter than the layout requires.
    pub fn new(bytes: &'a [u8], stride: usize, count: usize) -> Result<Self> {
        if stride == 0 || stride % COORD_SIZE != 0 {
            return Err(GeomError::InvalidBufferLayout(format!(
                "vertex stride {stride} is not a positive multiple of {COORD_SIZE}"
            )));
        }
        if stride < POINT_SIZE {
            return Err(GeomError::InvalidBufferLayout(format!(
                "vertex stride {stride} cannot hold a {POINT_SIZE}-byte point"
            )));
        }

        let required = match count {
            0 => 0,
            n => (n - 1)
                .checked_mul(stride)
                .and_then(|b| b.checked_add(POINT_SIZE))
                .ok_or_else(|| {
                    GeomError::InvalidBufferLayout(format!(
                        "{n} vertices at stride {stride} overflow the address space"
                    ))
                })?,
        };
        if bytes.len() < required {
            return Err(GeomError::InvalidBufferLayout(format!(
                "vertex buffer holds {} bytes, layout needs {required}",
                bytes.len()
            )));
        }

        Ok(Self {
            bytes,
            stride,
            count,
        })
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if the view holds no vertices.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Byte distance between consecutive vertices.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The vertex at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<Point3> {
        (index < self.count).then(|| self.point_at(index))
    }

    /// Iterate vertices in buffer order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Point3> + '_ {
        (0..self.count).map(move |i| self.point_at(i))
    }

    fn point_at(&self, index: usize) -> Point3 {
        let offset = index * self.stride;
        let [x, y, z]: [f32; 3] = pod_read_unaligned(&self.bytes[offset..offset + POINT_SIZE]);
        Point3::new(x, y, z)
    }
}

/// Read-only view of a packed `u32` triangle index buffer.
#[derive(Debug, Clone, Copy)]
pub struct FaceView<'a> {
    bytes: &'a [u8],
    count: usize,
}

impl<'a> FaceView<'a> {
    /// Wrap `bytes` as `count` triangles of three `u32` indices each.
    pub fn new(bytes: &'a [u8], count: usize) -> Result<Self> {
        let required = count.checked_mul(TRIANGLE_SIZE).ok_or_else(|| {
            GeomError::InvalidBufferLayout(format!("{count} faces overflow the address space"))
        })?;
        if bytes.len() < required {
            return Err(GeomError::InvalidBufferLayout(format!(
                "face buffer holds {} bytes, {count} faces need {required}",
                bytes.len()
            )));
        }
        Ok(Self { bytes, count })
    }

    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if the view holds no triangles.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The triangle at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<Triangle> {
        (index < self.count).then(|| self.triangle_at(index))
    }

    /// Iterate triangles in buffer order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Triangle> + '_ {
        (0..self.count).map(move |i| self.triangle_at(i))
    }

    fn triangle_at(&self, index: usize) -> Triangle {
        let offset = index * TRIANGLE_SIZE;
        let indices: [u32; 3] = pod_read_unaligned(&self.bytes[offset..offset + TRIANGLE_SIZE]);
        Triangle { indices }
    }
}

/// Decode a strided vertex buffer into points.
pub fn decode_vertices(bytes: &[u8], stride: usize, count: usize) -> Result<Vec<Point3>> {
    Ok(VertexView::new(bytes, stride, count)?.iter().collect())
}

/// Decode a packed index buffer into triangles.
pub fn decode_triangles(bytes: &[u8], count: usize) -> Result<Vec<Triangle>> {
    Ok(FaceView::new(bytes, count)?.iter().collect())
}
