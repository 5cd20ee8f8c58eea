//! Session settings.

use foodscan_segment::SegmentConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Timing, proximity and segmentation settings for a scan session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Countdown length of one scan.
    pub scan_duration_seconds: u32,
    /// Target camera distance from the object (m).
    pub optimal_distance: f32,
    /// Accepted deviation from `optimal_distance` (m).
    pub distance_tolerance: f32,
    /// Segmentation thresholds.
    pub segment: SegmentConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scan_duration_seconds: 5,
            optimal_distance: 0.5,
            distance_tolerance: 0.1,
            segment: SegmentConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.scan_duration_seconds == 0 {
            return Err(SessionError::InvalidConfig(
                "scan_duration_seconds must be positive".into(),
            ));
        }
        if !self.optimal_distance.is_finite() || self.optimal_distance < 0.0 {
            return Err(SessionError::InvalidConfig(
                "optimal_distance must be finite and non-negative".into(),
            ));
        }
        if !self.distance_tolerance.is_finite() || self.distance_tolerance < 0.0 {
            return Err(SessionError::InvalidConfig(
                "distance_tolerance must be finite and non-negative".into(),
            ));
        }
        self.segment.validate()?;
        Ok(())
    }
}
