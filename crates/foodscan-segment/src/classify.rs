//! Supporting-surface classification.
//!
//! The plate (or table) under a scanned item shows up as its own anchor:
//! wide, deep and flat. The default classifier recognizes it from its
//! bounding-box extents alone. It is a heuristic and will misjudge some
//! anchors; it only has to reject the one dominant flat surface of a
//! close-range scan.

use foodscan_geom::BoundingBox;

use crate::config::SegmentConfig;

/// Decides whether an anchor is the supporting surface.
///
/// Implemented for any `Fn(&BoundingBox) -> bool`, so alternative
/// strategies can be plugged into the engine without a new type.
pub trait SurfaceClassifier {
    /// True if the anchor bounded by `bbox` should be excluded as support.
    fn is_supporting_surface(&self, bbox: &BoundingBox) -> bool;
}

impl<F> SurfaceClassifier for F
where
    F: Fn(&BoundingBox) -> bool,
{
    fn is_supporting_surface(&self, bbox: &BoundingBox) -> bool {
        self(bbox)
    }
}

/// Wide, flat and deep: `width > w && height < h && depth > d`.
pub fn is_supporting_surface(
    bbox: &BoundingBox,
    width_threshold: f32,
    height_threshold: f32,
    depth_threshold: f32,
) -> bool {
    bbox.width() > width_threshold
        && bbox.height() < height_threshold
        && bbox.depth() > depth_threshold
}

/// Fixed-threshold extents classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdClassifier {
    /// Minimum width (X).
    pub width_threshold: f32,
    /// Maximum height (Y).
    pub height_threshold: f32,
    /// Minimum depth (Z).
    pub depth_threshold: f32,
}

impl ThresholdClassifier {
    /// Take the plate thresholds from segmentation settings.
    pub fn from_config(config: &SegmentConfig) -> Self {
        Self {
            width_threshold: config.plate_width_threshold,
            height_threshold: config.plate_height_threshold,
            depth_threshold: config.plate_depth_threshold,
        }
    }
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self::from_config(&SegmentConfig::default())
    }
}

impl SurfaceClassifier for ThresholdClassifier {
    fn is_supporting_surface(&self, bbox: &BoundingBox) -> bool {
        is_supporting_surface(
            bbox,
            self.width_threshold,
            self.height_threshold,
            self.depth_threshold,
        )
    }
}
