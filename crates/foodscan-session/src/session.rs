//! The scan session state machine.

use foodscan_segment::{
    AnchorOutcome, DiscardReason, RawMeshAnchor, SegmentEngine, SegmentResult, SurfaceClassifier,
    ThresholdClassifier,
};
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::pose::pose_distance;
use crate::state::{Guidance, ScanState, INITIAL_MESSAGE};

/// Point-in-time view of a session for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Current state.
    pub state: ScanState,
    /// True if the last camera distance was within tolerance.
    pub ready: bool,
    /// Proximity guidance message.
    pub message: String,
    /// Seconds left on the countdown.
    pub remaining_seconds: u32,
    /// Segments emitted so far.
    pub result_count: usize,
}

/// Scan state machine: `Idle -> ArmedReady -> Scanning -> Completed`.
///
/// - Every pose update re-evaluates readiness. Drifting out of range
///   demotes any state to `Idle`, cancelling a running scan; coming back
///   in range arms an idle session.
/// - `start_scan` moves a ready session into `Scanning`, resets the
///   countdown and clears the processed-anchor set.
/// - Each `tick` takes one second off the countdown; the tick that reaches
///   zero completes the scan.
/// - Anchors reach the engine only while `Scanning`.
///
/// Emitted results are append-only and survive across scans.
pub struct ScanSession<C = ThresholdClassifier> {
    config: SessionConfig,
    engine: SegmentEngine<C>,
    state: ScanState,
    guidance: Option<Guidance>,
    remaining_seconds: u32,
}

impl ScanSession<ThresholdClassifier> {
    /// Create a session with the default extents classifier.
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let engine = SegmentEngine::new(config.segment.clone())?;
        Ok(Self::from_parts(config, engine))
    }
}

impl<C: SurfaceClassifier> ScanSession<C> {
    /// Create a session with a custom supporting-surface classifier.
    pub fn with_classifier(config: SessionConfig, classifier: C) -> Result<Self> {
        config.validate()?;
        let engine = SegmentEngine::with_classifier(config.segment.clone(), classifier)?;
        Ok(Self::from_parts(config, engine))
    }

    fn from_parts(config: SessionConfig, engine: SegmentEngine<C>) -> Self {
        Self {
            remaining_seconds: config.scan_duration_seconds,
            config,
            engine,
            state: ScanState::Idle,
            guidance: None,
        }
    }

    /// Active settings.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// True if the last camera distance was within tolerance.
    pub fn is_ready(&self) -> bool {
        self.guidance.is_some_and(Guidance::is_ready)
    }

    /// Latest guidance, if any pose has been seen.
    pub fn guidance(&self) -> Option<Guidance> {
        self.guidance
    }

    /// Proximity message for display.
    pub fn message(&self) -> &'static str {
        self.guidance.map_or(INITIAL_MESSAGE, Guidance::message)
    }

    /// Seconds left on the countdown.
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Segments emitted so far, in order.
    pub fn results(&self) -> &[SegmentResult] {
        self.engine.results()
    }

    /// Capture the presentation-facing state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            ready: self.is_ready(),
            message: self.message().to_string(),
            remaining_seconds: self.remaining_seconds,
            result_count: self.results().len(),
        }
    }

    /// Re-evaluate readiness from a camera distance (m).
    pub fn on_pose_update(&mut self, distance: f32) -> Guidance {
        let guidance = Guidance::from_distance(
            distance,
            self.config.optimal_distance,
            self.config.distance_tolerance,
        );
        self.guidance = Some(guidance);

        let next = match (guidance.is_ready(), self.state) {
            (false, ScanState::Scanning) => {
                info!(distance, remaining = self.remaining_seconds, "scan interrupted: {guidance}");
                ScanState::Idle
            }
            (false, _) => ScanState::Idle,
            (true, ScanState::Scanning) => ScanState::Scanning,
            (true, _) => ScanState::ArmedReady,
        };
        self.transition(next);
        guidance
    }

    /// Re-evaluate readiness from a full camera pose.
    pub fn on_camera_pose(&mut self, transform: &Matrix4<f32>) -> Guidance {
        self.on_pose_update(pose_distance(transform))
    }

    /// Begin a timed scan. Only allowed from `ArmedReady`.
    pub fn start_scan(&mut self) -> Result<()> {
        match self.state {
            ScanState::ArmedReady => {}
            ScanState::Scanning => return Err(SessionError::AlreadyScanning),
            state => return Err(SessionError::NotReady(state)),
        }
        self.remaining_seconds = self.config.scan_duration_seconds;
        self.engine.begin_scan();
        self.transition(ScanState::Scanning);
        Ok(())
    }

    /// End a running scan early. Returns false if no scan was running.
    pub fn stop_scan(&mut self) -> bool {
        if self.state != ScanState::Scanning {
            return false;
        }
        self.transition(ScanState::Completed);
        true
    }

    /// Advance the countdown by one second.
    ///
    /// Returns true on the tick that completes the scan. Ticks outside
    /// `Scanning` are ignored.
    pub fn tick(&mut self) -> bool {
        if self.state != ScanState::Scanning {
            return false;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return false;
        }
        self.transition(ScanState::Completed);
        true
    }

    /// Submit a mesh anchor from the tracking subsystem.
    ///
    /// Outside `Scanning` the anchor is discarded without being marked
    /// processed. Errors are per-anchor; the session stays usable.
    pub fn on_anchor_added(&mut self, anchor: &RawMeshAnchor) -> foodscan_segment::Result<AnchorOutcome> {
        if self.state != ScanState::Scanning {
            return Ok(AnchorOutcome::Discarded(DiscardReason::NotScanning));
        }
        self.engine.process_anchor(anchor)
    }

    fn transition(&mut self, next: ScanState) {
        if next != self.state {
            info!(from = %self.state, to = %next, message = self.message(), "scan state changed");
            self.state = next;
        }
    }
}
