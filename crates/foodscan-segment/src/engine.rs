//! Per-anchor segmentation pipeline.

use std::collections::HashSet;

use foodscan_geom::bounding_box;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::anchor::RawMeshAnchor;
use crate::classify::{SurfaceClassifier, ThresholdClassifier};
use crate::config::SegmentConfig;
use crate::error::Result;
use crate::filter::filter_by_height;
use crate::volume::mesh_volume;

/// One estimated object segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentResult {
    /// Sequential id, 1-based, in emission order.
    pub id: usize,
    /// Vertices left after the height filter.
    pub vertex_count: usize,
    /// Face count as defined by the active [`FilterPolicy`](crate::FilterPolicy).
    pub face_count: usize,
    /// Estimated volume in cubic meters.
    pub volume: f64,
}

/// Why an anchor produced no result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiscardReason {
    /// Arrived while no scan was running.
    NotScanning,
    /// Already processed in the current scan.
    Duplicate,
    /// Classified as the supporting surface.
    SupportingSurface,
    /// Geometry held non-finite coordinates, so no volume could be estimated.
    NonFiniteVolume,
    /// Estimated volume fell below the configured minimum.
    BelowVolumeThreshold {
        /// The estimate that was rejected.
        volume: f64,
    },
}

/// What happened to a submitted anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorOutcome {
    /// A new segment was recorded.
    Emitted(SegmentResult),
    /// No segment was recorded.
    Discarded(DiscardReason),
}

/// Measurement of a single anchor, before dedup and the volume gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// The anchor is the supporting surface.
    SupportingSurface,
    /// The anchor is (part of) an object.
    Segment {
        /// Vertices left after the height filter.
        vertex_count: usize,
        /// Reported face count.
        face_count: usize,
        /// Estimated volume in cubic meters.
        volume: f64,
    },
}

/// Classify, filter and measure one anchor.
///
/// Pure: reads the anchor's buffers for the duration of the call only.
pub fn measure_anchor<C>(
    anchor: &RawMeshAnchor,
    config: &SegmentConfig,
    classifier: &C,
) -> Result<Measurement>
where
    C: SurfaceClassifier + ?Sized,
{
    let vertices = anchor.vertices.view()?;
    let faces = anchor.faces.view()?;

    let bbox = bounding_box(vertices.iter())?;
    if classifier.is_supporting_surface(&bbox) {
        debug!(
            anchor = %anchor.id,
            width = bbox.width(),
            height = bbox.height(),
            depth = bbox.depth(),
            "excluded supporting surface"
        );
        return Ok(Measurement::SupportingSurface);
    }

    let triangles: Vec<_> = faces.iter().collect();
    let cutoff = bbox.min.y + config.plate_height_threshold;
    let filtered = filter_by_height(vertices.iter(), &triangles, cutoff, config.filter_policy);
    let volume = mesh_volume(&filtered.vertices, &filtered.triangles);

    debug!(
        anchor = %anchor.id,
        vertices = vertices.len(),
        kept = filtered.vertices.len(),
        triangles = filtered.triangles.len(),
        volume,
        "measured anchor"
    );

    Ok(Measurement::Segment {
        vertex_count: filtered.vertices.len(),
        face_count: filtered.face_count,
        volume,
    })
}

/// Turns a stream of anchors into an append-only list of segments.
///
/// Each anchor identifier is processed at most once per scan, whether it
/// yields a segment, is discarded, or fails to decode.
pub struct SegmentEngine<C = ThresholdClassifier> {
    config: SegmentConfig,
    classifier: C,
    processed: HashSet<Uuid>,
    results: Vec<SegmentResult>,
}

impl SegmentEngine<ThresholdClassifier> {
    /// Create an engine using the plate thresholds from `config`.
    pub fn new(config: SegmentConfig) -> Result<Self> {
        let classifier = ThresholdClassifier::from_config(&config);
        Self::with_classifier(config, classifier)
    }
}

impl<C: SurfaceClassifier> SegmentEngine<C> {
    /// Create an engine with a custom supporting-surface classifier.
    pub fn with_classifier(config: SegmentConfig, classifier: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            classifier,
            processed: HashSet::new(),
            results: Vec::new(),
        })
    }

    /// Active settings.
    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    /// Forget processed identifiers so a new scan can revisit anchors.
    /// Emitted results are kept.
    pub fn begin_scan(&mut self) {
        self.processed.clear();
    }

    /// True if `id` was already processed in the current scan.
    pub fn is_processed(&self, id: &Uuid) -> bool {
        self.processed.contains(id)
    }

    /// Number of anchors processed in the current scan.
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    /// All segments emitted so far, in emission order.
    pub fn results(&self) -> &[SegmentResult] {
        &self.results
    }

    /// Run one anchor through the pipeline.
    ///
    /// The anchor is marked processed before measuring, so a malformed
    /// anchor returns its error once and is a [`DiscardReason::Duplicate`]
    /// afterwards.
    pub fn process_anchor(&mut self, anchor: &RawMeshAnchor) -> Result<AnchorOutcome> {
        if !self.processed.insert(anchor.id) {
            debug!(anchor = %anchor.id, "skipping duplicate anchor");
            return Ok(AnchorOutcome::Discarded(DiscardReason::Duplicate));
        }

        let (vertex_count, face_count, volume) =
            match measure_anchor(anchor, &self.config, &self.classifier)? {
                Measurement::SupportingSurface => {
                    return Ok(AnchorOutcome::Discarded(DiscardReason::SupportingSurface));
                }
                Measurement::Segment {
                    vertex_count,
                    face_count,
                    volume,
                } => (vertex_count, face_count, volume),
            };

        if !volume.is_finite() {
            warn!(anchor = %anchor.id, volume, "non-finite segment volume");
            return Ok(AnchorOutcome::Discarded(DiscardReason::NonFiniteVolume));
        }
        if volume < self.config.min_volume_threshold {
            debug!(anchor = %anchor.id, volume, "segment below volume threshold");
            return Ok(AnchorOutcome::Discarded(
                DiscardReason::BelowVolumeThreshold { volume },
            ));
        }

        let result = SegmentResult {
            id: self.results.len() + 1,
            vertex_count,
            face_count,
            volume,
        };
        self.results.push(result);
        info!(
            anchor = %anchor.id,
            segment = result.id,
            vertices = vertex_count,
            faces = face_count,
            volume,
            "segment emitted"
        );
        Ok(AnchorOutcome::Emitted(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::VertexSource;
    use crate::config::FilterPolicy;
    use crate::error::SegmentError;
    use crate::volume::tetrahedron_volume;
    use approx::assert_relative_eq;
    use foodscan_geom::{BoundingBox, GeomError, Point3, Triangle};

    fn corner_anchor() -> RawMeshAnchor {
        RawMeshAnchor::from_points(
            Uuid::new_v4(),
            &[
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            &[Triangle::new(0, 1, 2)],
        )
    }

    /// Keeps every vertex, so the whole triangle is measured.
    fn keep_all_config() -> SegmentConfig {
        SegmentConfig {
            plate_height_threshold: -0.01,
            min_volume_threshold: 0.001,
            ..Default::default()
        }
    }

    fn plate_anchor() -> RawMeshAnchor {
        RawMeshAnchor::from_points(
            Uuid::new_v4(),
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.2, 0.0, 0.0),
                Point3::new(0.2, 0.02, 0.4),
                Point3::new(0.0, 0.01, 0.4),
            ],
            &[Triangle::new(0, 1, 2), Triangle::new(0, 2, 3)],
        )
    }

    /// Ten vertices: three at the bottom (indices 0..3), seven above the
    /// plate band (indices 3..10).
    fn stacked_points() -> Vec<Point3> {
        let mut points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.1, 0.01, 0.0),
            Point3::new(0.0, 0.02, 0.1),
        ];
        for i in 0..7 {
            let t = i as f32;
            points.push(Point3::new(0.05 * t, 0.1 + 0.02 * t * t, 0.2 - 0.03 * t));
        }
        points
    }

    fn stacked_triangles() -> Vec<Triangle> {
        vec![
            Triangle::new(3, 4, 5),
            Triangle::new(6, 7, 8),
            Triangle::new(0, 3, 4),
            Triangle::new(1, 2, 9),
        ]
    }

    #[test]
    fn test_supporting_surface_is_discarded() {
        let mut engine = SegmentEngine::new(SegmentConfig::default()).unwrap();
        let anchor = plate_anchor();
        let outcome = engine.process_anchor(&anchor).unwrap();
        assert_eq!(outcome, AnchorOutcome::Discarded(DiscardReason::SupportingSurface));
        assert!(engine.results().is_empty());
        assert!(engine.is_processed(&anchor.id));
    }

    #[test]
    fn test_single_triangle_volume_is_emitted() {
        let mut engine = SegmentEngine::new(keep_all_config()).unwrap();
        let outcome = engine.process_anchor(&corner_anchor()).unwrap();
        let AnchorOutcome::Emitted(result) = outcome else {
            panic!("expected a segment, got {outcome:?}");
        };
        assert_eq!(result.id, 1);
        assert_eq!(result.vertex_count, 3);
        assert_eq!(result.face_count, 1);
        assert_relative_eq!(result.volume, 1.0 / 6.0, epsilon = 1e-6);
    }

    #[test]
    fn test_duplicate_anchor_emits_once() {
        let mut engine = SegmentEngine::new(keep_all_config()).unwrap();
        let anchor = corner_anchor();
        assert!(matches!(
            engine.process_anchor(&anchor).unwrap(),
            AnchorOutcome::Emitted(_)
        ));
        assert_eq!(
            engine.process_anchor(&anchor).unwrap(),
            AnchorOutcome::Discarded(DiscardReason::Duplicate)
        );
        assert_eq!(engine.results().len(), 1);
    }

    #[test]
    fn test_new_scan_allows_reprocessing() {
        let mut engine = SegmentEngine::new(keep_all_config()).unwrap();
        let anchor = corner_anchor();
        engine.process_anchor(&anchor).unwrap();
        engine.begin_scan();
        assert!(!engine.is_processed(&anchor.id));
        let outcome = engine.process_anchor(&anchor).unwrap();
        let AnchorOutcome::Emitted(result) = outcome else {
            panic!("expected a segment, got {outcome:?}");
        };
        assert_eq!(result.id, 2);
    }

    #[test]
    fn test_non_finite_vertex_is_discarded() {
        let mut engine = SegmentEngine::new(keep_all_config()).unwrap();
        for bad in [f32::NAN, f32::INFINITY] {
            let anchor = RawMeshAnchor::from_points(
                Uuid::new_v4(),
                &[
                    Point3::new(bad, 1.0, 0.0),
                    Point3::new(0.0, 1.0, 0.0),
                    Point3::new(0.0, 0.0, 1.0),
                ],
                &[Triangle::new(0, 1, 2)],
            );
            assert_eq!(
                engine.process_anchor(&anchor).unwrap(),
                AnchorOutcome::Discarded(DiscardReason::NonFiniteVolume)
            );
            assert!(engine.is_processed(&anchor.id));
        }
        assert!(engine.results().is_empty());

        let AnchorOutcome::Emitted(result) = engine.process_anchor(&corner_anchor()).unwrap() else {
            panic!("finite geometry should still be measured");
        };
        assert_eq!(result.id, 1);
        assert!(result.volume >= 0.0);
    }

    #[test]
    fn test_below_volume_threshold() {
        let config = SegmentConfig {
            min_volume_threshold: 0.5,
            ..keep_all_config()
        };
        let mut engine = SegmentEngine::new(config).unwrap();
        let outcome = engine.process_anchor(&corner_anchor()).unwrap();
        let AnchorOutcome::Discarded(DiscardReason::BelowVolumeThreshold { volume }) = outcome
        else {
            panic!("expected a volume rejection, got {outcome:?}");
        };
        assert_relative_eq!(volume, 1.0 / 6.0, epsilon = 1e-6);
        assert!(engine.results().is_empty());
    }

    #[test]
    fn test_height_filter_with_remap() {
        let points = stacked_points();
        let anchor = RawMeshAnchor::from_points(Uuid::new_v4(), &points, &stacked_triangles());
        let config = SegmentConfig {
            min_volume_threshold: 0.0,
            ..Default::default()
        };
        let mut engine = SegmentEngine::new(config).unwrap();
        let AnchorOutcome::Emitted(result) = engine.process_anchor(&anchor).unwrap() else {
            panic!("expected a segment");
        };

        assert_eq!(result.vertex_count, 7);
        // only the two triangles built purely from upper vertices survive
        assert_eq!(result.face_count, 2);
        let expected = tetrahedron_volume(&points[3], &points[4], &points[5])
            + tetrahedron_volume(&points[6], &points[7], &points[8]);
        assert_relative_eq!(result.volume, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_height_filter_with_positional_indices() {
        let points = stacked_points();
        let anchor = RawMeshAnchor::from_points(Uuid::new_v4(), &points, &stacked_triangles());
        let config = SegmentConfig {
            min_volume_threshold: 0.0,
            filter_policy: FilterPolicy::Positional,
            ..Default::default()
        };
        let mut engine = SegmentEngine::new(config).unwrap();
        let AnchorOutcome::Emitted(result) = engine.process_anchor(&anchor).unwrap() else {
            panic!("expected a segment");
        };

        assert_eq!(result.vertex_count, 7);
        // the unfiltered face count is reported
        assert_eq!(result.face_count, 4);
        // kept[i] == points[i + 3]; (3,4,5) and (0,3,4) fit within 7 and are
        // read positionally, the other two reach past the filtered array
        let expected = tetrahedron_volume(&points[6], &points[7], &points[8])
            + tetrahedron_volume(&points[3], &points[6], &points[7]);
        assert_relative_eq!(result.volume, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_anchor_is_an_error_once() {
        let mut engine = SegmentEngine::new(SegmentConfig::default()).unwrap();
        let anchor = RawMeshAnchor::from_points(Uuid::new_v4(), &[], &[]);
        assert_eq!(
            engine.process_anchor(&anchor),
            Err(SegmentError::Geometry(GeomError::EmptyGeometry))
        );
        assert_eq!(
            engine.process_anchor(&anchor),
            Ok(AnchorOutcome::Discarded(DiscardReason::Duplicate))
        );
    }

    #[test]
    fn test_malformed_buffer_does_not_stop_the_engine() {
        let mut engine = SegmentEngine::new(keep_all_config()).unwrap();
        let mut bad = corner_anchor();
        bad.vertices = VertexSource {
            stride: 7,
            ..bad.vertices
        };
        assert!(matches!(
            engine.process_anchor(&bad),
            Err(SegmentError::Geometry(GeomError::InvalidBufferLayout(_)))
        ));
        assert!(matches!(
            engine.process_anchor(&corner_anchor()).unwrap(),
            AnchorOutcome::Emitted(_)
        ));
    }

    #[test]
    fn test_custom_classifier() {
        let everything_is_a_plate = |_: &BoundingBox| true;
        let mut engine =
            SegmentEngine::with_classifier(keep_all_config(), everything_is_a_plate).unwrap();
        assert_eq!(
            engine.process_anchor(&corner_anchor()).unwrap(),
            AnchorOutcome::Discarded(DiscardReason::SupportingSurface)
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SegmentConfig {
            min_volume_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            SegmentEngine::new(config),
            Err(SegmentError::InvalidConfig(_))
        ));
    }
}
