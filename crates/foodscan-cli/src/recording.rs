//! Recorded scan event logs.
//!
//! A recording is a JSON document listing the events a tracking session
//! produced, in arrival order:
//!
//! ```json
//! { "events": [
//!     { "type": "pose", "distance": 0.5 },
//!     { "type": "start" },
//!     { "type": "anchor", "vertices": [0, 0, 0, 1, 0.2, 0], "faces": [0, 1, 1] },
//!     { "type": "tick" }
//! ] }
//! ```

use anyhow::{Context, Result};
use foodscan_segment::{FaceSource, RawMeshAnchor, VertexSource};
use serde::Deserialize;
use uuid::Uuid;

const POINT_SIZE: usize = 3 * std::mem::size_of::<f32>();

/// A full recording.
#[derive(Debug, Deserialize)]
pub struct Recording {
    pub events: Vec<RecordedEvent>,
}

/// One recorded event.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordedEvent {
    /// Camera distance reading.
    Pose { distance: f32 },
    /// User pressed start.
    Start,
    /// User pressed stop.
    Stop,
    /// One second elapsed.
    Tick,
    /// A mesh anchor was added.
    Anchor(RecordedAnchor),
}

/// Anchor geometry as flat arrays.
#[derive(Debug, Deserialize)]
pub struct RecordedAnchor {
    /// Anchor identifier; a fresh one is generated if absent.
    pub id: Option<Uuid>,
    /// Flat vertex floats, `stride / 4` per vertex.
    pub vertices: Vec<f32>,
    /// Vertex stride in bytes.
    #[serde(default = "default_stride")]
    pub stride: usize,
    /// Vertex count; derived from the buffer length if absent.
    pub vertex_count: Option<usize>,
    /// Flat triangle indices.
    pub faces: Vec<u32>,
    /// Face count; `faces.len() / 3` if absent.
    pub face_count: Option<usize>,
}

fn default_stride() -> usize {
    POINT_SIZE
}

impl RecordedAnchor {
    /// Pack into the raw buffers the tracking subsystem would hand over.
    pub fn to_raw(&self) -> RawMeshAnchor {
        let vertex_bytes = bytemuck::cast_slice::<f32, u8>(&self.vertices).to_vec();
        let vertex_count = self.vertex_count.unwrap_or_else(|| {
            // the last vertex needs no trailing padding
            match vertex_bytes.len().checked_sub(POINT_SIZE) {
                Some(rest) => rest.checked_div(self.stride).map_or(0, |n| n + 1),
                None => 0,
            }
        });
        let face_bytes = bytemuck::cast_slice::<u32, u8>(&self.faces).to_vec();
        let face_count = self.face_count.unwrap_or(self.faces.len() / 3);

        RawMeshAnchor::new(
            self.id.unwrap_or_else(Uuid::new_v4),
            VertexSource {
                bytes: vertex_bytes,
                stride: self.stride,
                count: vertex_count,
            },
            FaceSource {
                bytes: face_bytes,
                count: face_count,
            },
        )
    }
}

impl Recording {
    /// Parse a recording from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("malformed recording")
    }
}
