#![warn(missing_docs)]

//! Scan session control for the foodscan pipeline.
//!
//! A [`ScanSession`] owns the scan state machine, the countdown and the
//! segmentation engine. Camera-pose distances gate readiness, an explicit
//! start command begins a timed scan, and mesh anchors are only accepted
//! while a scan is running.
//!
//! [`spawn_session`] moves a session into a single tokio task so that
//! tracking callbacks, control commands and the one-second countdown tick
//! all mutate it from one place.
//!
//! # Example
//!
//! ```
//! use foodscan_session::{ScanSession, ScanState, SessionConfig};
//!
//! let mut session = ScanSession::new(SessionConfig::default()).unwrap();
//! session.on_pose_update(0.5);
//! assert_eq!(session.state(), ScanState::ArmedReady);
//!
//! session.start_scan().unwrap();
//! for _ in 0..5 {
//!     session.tick();
//! }
//! assert_eq!(session.state(), ScanState::Completed);
//! ```

pub mod config;
pub mod error;
pub mod pose;
pub mod runtime;
pub mod session;
pub mod state;

pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use pose::pose_distance;
pub use runtime::{spawn_session, SessionHandle, TICK_PERIOD};
pub use session::{ScanSession, SessionSnapshot};
pub use state::{Guidance, ScanState, INITIAL_MESSAGE};
