//! Segmentation settings.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SegmentError};

/// How triangle indices are resolved after the height filter removes vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterPolicy {
    /// Carry an explicit old-to-new index map and drop every triangle that
    /// touches a removed vertex. Reported face count is the number of
    /// retained triangles.
    #[default]
    Remap,
    /// Legacy behavior: keep original indices, check them only against the
    /// filtered vertex count, and index the filtered array positionally.
    /// Reported face count is the anchor's unfiltered face count.
    ///
    /// Only exact when the filter removes a contiguous tail of vertices.
    Positional,
}

/// Thresholds for plate rejection, height filtering and the volume gate.
///
/// Distances are meters in the scanning frame, volumes cubic meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Segments with a smaller estimated volume are discarded.
    pub min_volume_threshold: f64,
    /// Maximum box height for a plate, and the band above the box floor
    /// whose vertices are removed. Negative values keep every vertex.
    pub plate_height_threshold: f32,
    /// Minimum box width (X) for a plate.
    pub plate_width_threshold: f32,
    /// Minimum box depth (Z) for a plate.
    pub plate_depth_threshold: f32,
    /// Index handling after the height filter.
    pub filter_policy: FilterPolicy,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_volume_threshold: 0.001,
            plate_height_threshold: 0.05,
            plate_width_threshold: 0.15,
            plate_depth_threshold: 0.3,
            filter_policy: FilterPolicy::Remap,
        }
    }
}

impl SegmentConfig {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.min_volume_threshold.is_finite() || self.min_volume_threshold < 0.0 {
            return Err(SegmentError::InvalidConfig(
                "min_volume_threshold must be finite and non-negative".into(),
            ));
        }
        if !self.plate_height_threshold.is_finite() {
            return Err(SegmentError::InvalidConfig(
                "plate_height_threshold must be finite".into(),
            ));
        }
        for (name, value) in [
            ("plate_width_threshold", self.plate_width_threshold),
            ("plate_depth_threshold", self.plate_depth_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SegmentError::InvalidConfig(format!(
                    "{name} must be finite and non-negative"
                )));
            }
        }
        Ok(())
    }
}
