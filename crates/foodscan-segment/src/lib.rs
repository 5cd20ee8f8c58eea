#![warn(missing_docs)]

//! Segmentation and volume estimation for scanned mesh anchors.
//!
//! Each anchor delivered by the scanning subsystem goes through the same
//! pipeline:
//! 1. Skip it if its identifier was already processed in this scan
//! 2. Decode its vertex and face buffers
//! 3. Drop it if its bounding box looks like the supporting surface (plate)
//! 4. Remove vertices lying within the plate band above the box floor
//! 5. Estimate the enclosed volume of what is left
//! 6. Emit a [`SegmentResult`] if the volume clears the configured minimum
//!
//! # Example
//!
//! ```
//! use foodscan_geom::{Point3, Triangle};
//! use foodscan_segment::{AnchorOutcome, RawMeshAnchor, SegmentConfig, SegmentEngine};
//!
//! let mut engine = SegmentEngine::new(SegmentConfig::default()).unwrap();
//! let anchor = RawMeshAnchor::from_points(
//!     uuid::Uuid::new_v4(),
//!     &[
//!         Point3::new(1.0, 0.2, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!         Point3::new(0.0, 0.3, 1.0),
//!         Point3::new(0.0, 0.0, 0.0),
//!     ],
//!     &[Triangle::new(0, 1, 2)],
//! );
//! let outcome = engine.process_anchor(&anchor).unwrap();
//! assert!(matches!(outcome, AnchorOutcome::Emitted(_)));
//! ```

pub mod anchor;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod volume;

pub use anchor::{FaceSource, RawMeshAnchor, VertexSource};
pub use classify::{is_supporting_surface, SurfaceClassifier, ThresholdClassifier};
pub use config::{FilterPolicy, SegmentConfig};
pub use engine::{measure_anchor, AnchorOutcome, DiscardReason, Measurement, SegmentEngine, SegmentResult};
pub use error::{Result, SegmentError};
pub use filter::{filter_by_height, FilteredMesh};
pub use volume::{mesh_volume, tetrahedron_volume};
