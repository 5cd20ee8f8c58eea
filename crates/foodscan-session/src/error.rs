//! Error types for scan sessions.

use foodscan_segment::SegmentError;
use thiserror::Error;

use crate::state::ScanState;

/// Errors from scan session commands.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Start requested while the camera is not at a usable distance.
    #[error("not ready to scan (state: {0})")]
    NotReady(ScanState),

    /// Start requested while a scan is already running.
    #[error("a scan is already in progress")]
    AlreadyScanning,

    /// Invalid session settings.
    #[error("invalid settings: {0}")]
    InvalidConfig(String),

    /// Segmentation engine error.
    #[error(transparent)]
    Segment(#[from] SegmentError),

    /// The session task has shut down.
    #[error("session closed")]
    Closed,
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
