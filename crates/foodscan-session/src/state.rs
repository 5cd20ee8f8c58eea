//! Scan states and proximity guidance.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Message shown before the first camera pose arrives.
pub const INITIAL_MESSAGE: &str = "Position yourself closer to the object.";

/// Scan session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    /// Camera out of range, or no pose seen yet.
    #[default]
    Idle,
    /// Camera in range; a scan may be started.
    ArmedReady,
    /// Scan running; anchors are accepted.
    Scanning,
    /// Countdown expired or scan stopped; results are final.
    Completed,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ArmedReady => "armed",
            Self::Scanning => "scanning",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Proximity guidance derived from a camera distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guidance {
    /// Too far from the target.
    MoveCloser,
    /// Too close to the target.
    MoveFurther,
    /// Within tolerance.
    Optimal,
}

impl Guidance {
    /// Classify `distance` against `optimal ± tolerance`.
    ///
    /// A non-finite distance is treated as out of range.
    pub fn from_distance(distance: f32, optimal: f32, tolerance: f32) -> Self {
        if distance.is_nan() || distance > optimal + tolerance {
            Self::MoveCloser
        } else if distance < optimal - tolerance {
            Self::MoveFurther
        } else {
            Self::Optimal
        }
    }

    /// True if scanning may proceed.
    pub fn is_ready(self) -> bool {
        self == Self::Optimal
    }

    /// User-facing message.
    pub fn message(self) -> &'static str {
        match self {
            Self::MoveCloser => "Move closer to the object.",
            Self::MoveFurther => "Move further away from the object.",
            Self::Optimal => "Distance is optimal.",
        }
    }
}

impl fmt::Display for Guidance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
