//! Single-owner async runtime for a scan session.
//!
//! The tracking subsystem, the UI and the countdown timer all run on
//! different execution contexts. None of them touch the [`ScanSession`]
//! directly: they send commands over a channel to one task that owns it,
//! and that task also drives the one-second tick. Every mutation therefore
//! happens in a single `select!` loop, so the tick that completes a scan
//! and the teardown of its timer occur together.

use std::time::Duration;

use foodscan_segment::{AnchorOutcome, RawMeshAnchor, SegmentResult, SurfaceClassifier};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval};
use tracing::{debug, warn};

use crate::error::{Result, SessionError};
use crate::session::{ScanSession, SessionSnapshot};
use crate::state::ScanState;

/// Countdown tick interval.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

const COMMAND_CAPACITY: usize = 64;
const SEGMENT_CAPACITY: usize = 32;

enum Command {
    Pose(f32),
    Anchor(Box<RawMeshAnchor>),
    Start(oneshot::Sender<Result<()>>),
    Stop(oneshot::Sender<bool>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Results(oneshot::Sender<Vec<SegmentResult>>),
}

enum Event {
    Command(Option<Command>),
    Tick,
}

/// Cloneable handle to a running session task.
///
/// The task stops once every handle is dropped and hands the session back
/// through its [`JoinHandle`].
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<SessionSnapshot>,
    segments: broadcast::Sender<SegmentResult>,
}

/// Move `session` into its own task.
pub fn spawn_session<C>(session: ScanSession<C>) -> (SessionHandle, JoinHandle<ScanSession<C>>)
where
    C: SurfaceClassifier + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
    let (status_tx, status_rx) = watch::channel(session.snapshot());
    let (segment_tx, _) = broadcast::channel(SEGMENT_CAPACITY);

    let task = tokio::spawn(run(session, command_rx, status_tx, segment_tx.clone()));
    let handle = SessionHandle {
        commands: command_tx,
        status: status_rx,
        segments: segment_tx,
    };
    (handle, task)
}

impl SessionHandle {
    /// Deliver a camera distance reading.
    pub async fn pose_update(&self, distance: f32) -> Result<()> {
        self.send(Command::Pose(distance)).await
    }

    /// Deliver a camera distance from a synchronous callback.
    ///
    /// Pose frames are superseded by the next one, so a frame is dropped
    /// rather than waited on when the queue is full.
    pub fn try_pose_update(&self, distance: f32) -> Result<()> {
        match self.commands.try_send(Command::Pose(distance)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(distance, "session queue full, dropping pose frame");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SessionError::Closed),
        }
    }

    /// Deliver a newly added mesh anchor. The session drops it once processed.
    pub async fn anchor_added(&self, anchor: RawMeshAnchor) -> Result<()> {
        self.send(Command::Anchor(Box::new(anchor))).await
    }

    /// Start a scan.
    pub async fn start_scan(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Start(tx)).await?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Stop a running scan. Returns false if none was running.
    pub async fn stop_scan(&self) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Stop(tx)).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Current session state, after every previously sent command.
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx)).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// All segments emitted so far.
    pub async fn results(&self) -> Result<Vec<SegmentResult>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Results(tx)).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Watch the latest snapshot, updated after every command and tick.
    pub fn status(&self) -> watch::Receiver<SessionSnapshot> {
        self.status.clone()
    }

    /// Receive each segment as it is emitted.
    pub fn subscribe_segments(&self) -> broadcast::Receiver<SegmentResult> {
        self.segments.subscribe()
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

async fn run<C>(
    mut session: ScanSession<C>,
    mut commands: mpsc::Receiver<Command>,
    status: watch::Sender<SessionSnapshot>,
    segments: broadcast::Sender<SegmentResult>,
) -> ScanSession<C>
where
    C: SurfaceClassifier,
{
    let mut countdown: Option<Interval> = None;

    loop {
        let event = tokio::select! {
            command = commands.recv() => Event::Command(command),
            _ = next_tick(&mut countdown), if countdown.is_some() => Event::Tick,
        };

        match event {
            Event::Command(None) => break,
            Event::Command(Some(command)) => {
                if apply(&mut session, command, &segments) {
                    countdown = Some(countdown_timer());
                }
            }
            Event::Tick => {
                session.tick();
            }
        }

        if session.state() != ScanState::Scanning {
            countdown = None;
        }
        status.send_replace(session.snapshot());
    }

    debug!("session handles dropped, stopping");
    session
}

/// Apply one command. Returns true if a new scan was started.
fn apply<C>(
    session: &mut ScanSession<C>,
    command: Command,
    segments: &broadcast::Sender<SegmentResult>,
) -> bool
where
    C: SurfaceClassifier,
{
    match command {
        Command::Pose(distance) => {
            session.on_pose_update(distance);
        }
        Command::Anchor(anchor) => match session.on_anchor_added(&anchor) {
            Ok(AnchorOutcome::Emitted(result)) => {
                // no subscribers is fine
                let _ = segments.send(result);
            }
            Ok(AnchorOutcome::Discarded(reason)) => {
                debug!(anchor = %anchor.id, ?reason, "anchor discarded");
            }
            Err(e) => {
                warn!(anchor = %anchor.id, error = %e, "skipping anchor");
            }
        },
        Command::Start(reply) => {
            let started = session.start_scan();
            let ok = started.is_ok();
            let _ = reply.send(started);
            return ok;
        }
        Command::Stop(reply) => {
            let _ = reply.send(session.stop_scan());
        }
        Command::Snapshot(reply) => {
            let _ = reply.send(session.snapshot());
        }
        Command::Results(reply) => {
            let _ = reply.send(session.results().to_vec());
        }
    }
    false
}

fn countdown_timer() -> Interval {
    interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD)
}

async fn next_tick(countdown: &mut Option<Interval>) {
    match countdown {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use foodscan_geom::{Point3, Triangle};
    use uuid::Uuid;

    fn object_anchor() -> RawMeshAnchor {
        RawMeshAnchor::from_points(
            Uuid::new_v4(),
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.2, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.3, 1.0),
            ],
            &[Triangle::new(1, 2, 3)],
        )
    }

    fn spawn_default() -> (SessionHandle, JoinHandle<ScanSession>) {
        spawn_session(ScanSession::new(SessionConfig::default()).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_completes_after_duration() {
        let (handle, _task) = spawn_default();
        handle.pose_update(0.5).await.unwrap();
        handle.start_scan().await.unwrap();

        tokio::time::sleep(Duration::from_millis(4500)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, ScanState::Scanning);
        assert_eq!(snapshot.remaining_seconds, 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, ScanState::Completed);
        assert_eq!(snapshot.remaining_seconds, 0);

        // the timer is gone; nothing changes afterwards
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.snapshot().await.unwrap(), snapshot);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_rejected_when_not_ready() {
        let (handle, _task) = spawn_default();
        assert_eq!(
            handle.start_scan().await,
            Err(SessionError::NotReady(ScanState::Idle))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_segments_are_broadcast() {
        let (handle, _task) = spawn_default();
        let mut segments = handle.subscribe_segments();
        handle.pose_update(0.5).await.unwrap();

        // before the scan starts the anchor is ignored
        handle.anchor_added(object_anchor()).await.unwrap();
        assert!(handle.results().await.unwrap().is_empty());

        handle.start_scan().await.unwrap();
        let anchor = object_anchor();
        handle.anchor_added(anchor.clone()).await.unwrap();
        handle.anchor_added(anchor).await.unwrap();

        let first = segments.recv().await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(handle.results().await.unwrap(), vec![first]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drift_stops_countdown() {
        let (handle, _task) = spawn_default();
        handle.pose_update(0.5).await.unwrap();
        handle.start_scan().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        handle.pose_update(1.0).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, ScanState::Idle);
        assert_eq!(snapshot.remaining_seconds, 3);
        assert!(!snapshot.ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let (handle, _task) = spawn_default();
        handle.pose_update(0.5).await.unwrap();
        handle.start_scan().await.unwrap();
        assert!(handle.stop_scan().await.unwrap());
        assert!(!handle.stop_scan().await.unwrap());
        assert_eq!(handle.snapshot().await.unwrap().state, ScanState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_watch_tracks_state() {
        let (handle, _task) = spawn_default();
        let mut status = handle.status();
        assert_eq!(status.borrow().state, ScanState::Idle);

        handle.try_pose_update(0.5).unwrap();
        status.changed().await.unwrap();
        assert_eq!(status.borrow().state, ScanState::ArmedReady);
        assert_eq!(status.borrow().message, "Distance is optimal.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handles_returns_session() {
        let (handle, task) = spawn_default();
        handle.pose_update(0.5).await.unwrap();
        handle.start_scan().await.unwrap();
        handle.anchor_added(object_anchor()).await.unwrap();
        drop(handle);

        let session = task.await.unwrap();
        assert_eq!(session.results().len(), 1);
        assert_eq!(session.state(), ScanState::Scanning);
    }
}
