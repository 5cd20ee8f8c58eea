#![warn(missing_docs)]

//! Geometry primitives for the foodscan pipeline.
//!
//! Decodes the raw vertex and face buffers handed over by a scanning
//! subsystem into typed points and triangles, and computes axis-aligned
//! bounding volumes over vertex sets.
//!
//! # Example
//!
//! ```
//! use foodscan_geom::{bounding_box, VertexView};
//!
//! let coords: [f32; 6] = [0.0, 0.0, 0.0, 1.0, 2.0, 3.0];
//! let view = VertexView::new(bytemuck::cast_slice::<f32, u8>(&coords), 12, 2).unwrap();
//! let bbox = bounding_box(view.iter()).unwrap();
//! assert_eq!(bbox.height(), 2.0);
//! ```

pub mod bbox;
pub mod buffer;
pub mod error;

pub use bbox::{bounding_box, BoundingBox};
pub use buffer::{decode_triangles, decode_vertices, FaceView, Triangle, VertexView};
pub use error::{GeomError, Result};

/// A point in the scanning subsystem's world frame (meters).
pub type Point3 = nalgebra::Point3<f32>;

/// A vector in the scanning subsystem's world frame.
pub type Vec3 = nalgebra::Vector3<f32>;
