//! Error types for buffer decoding and bounding volumes.

use thiserror::Error;

/// Errors produced while reading raw mesh geometry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeomError {
    /// Buffer stride, length, or count do not describe a valid layout.
    #[error("invalid buffer layout: {0}")]
    InvalidBufferLayout(String),

    /// A bounding volume was requested over zero vertices.
    #[error("geometry has no vertices")]
    EmptyGeometry,
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeomError>;
