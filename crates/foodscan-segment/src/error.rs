//! Error types for anchor segmentation.

use foodscan_geom::GeomError;
use thiserror::Error;

/// Errors that can occur while segmenting an anchor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    /// The anchor's geometry could not be decoded or measured.
    #[error(transparent)]
    Geometry(#[from] GeomError),

    /// Invalid segmentation settings.
    #[error("invalid settings: {0}")]
    InvalidConfig(String),
}

/// Result type for segmentation operations.
pub type Result<T> = std::result::Result<T, SegmentError>;
