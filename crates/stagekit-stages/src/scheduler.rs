//! Periodic redraw with explicit cancellation.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use stagekit_common::{Result, StageKitError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Shortest redraw period; shorter intervals are raised to it.
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);

/// What a finished loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub frames: u64,
    pub elapsed: Duration,
}

/// Cancels the loop it came from. Cheap to clone and `Send`.
#[derive(Debug, Clone)]
pub struct StopHandle {
    stop_tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }
}

/// Calls a frame callback every `interval` until stopped.
///
/// The first frame fires one interval after the loop starts. Ticks missed
/// because a frame ran long are delayed rather than replayed in a burst.
#[derive(Debug)]
pub struct FrameScheduler {
    interval: Duration,
    max_frames: Option<u64>,
    stop_tx: Arc<watch::Sender<bool>>,
}

impl FrameScheduler {
    pub fn new(interval: Duration) -> Self {
        let interval = if interval < MIN_FRAME_INTERVAL {
            warn!(?interval, "Frame interval too short, using {:?}", MIN_FRAME_INTERVAL);
            MIN_FRAME_INTERVAL
        } else {
            interval
        };
        let (stop_tx, _) = watch::channel(false);
        Self {
            interval,
            max_frames: None,
            stop_tx: Arc::new(stop_tx),
        }
    }

    /// Stop on its own after `frames` frames.
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stop_tx: Arc::clone(&self.stop_tx),
        }
    }

    /// Run until stopped, the frame limit is hit, or `on_frame` breaks.
    ///
    /// `on_frame` receives the 1-based frame number.
    pub async fn run<F>(&self, mut on_frame: F) -> FrameStats
    where
        F: FnMut(u64) -> ControlFlow<()>,
    {
        let mut stop_rx = self.stop_tx.subscribe();
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let start = Instant::now();
        let mut frames = 0u64;

        // the first tick is immediate; redraws start one period in
        ticker.tick().await;

        loop {
            if *stop_rx.borrow_and_update() {
                debug!(frames, "Frame loop stopped");
                break;
            }
            if self.max_frames.is_some_and(|max| frames >= max) {
                debug!(frames, "Frame limit reached");
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                changed = stop_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            frames += 1;
            if on_frame(frames).is_break() {
                debug!(frames, "Frame callback ended the loop");
                break;
            }
        }

        let stats = FrameStats {
            frames,
            elapsed: start.elapsed(),
        };
        info!(frames = stats.frames, elapsed_ms = stats.elapsed.as_millis() as u64, "Frame loop finished");
        stats
    }

    /// Run on a tokio task. Must be called inside a runtime.
    pub fn spawn<F>(self, on_frame: F) -> RunningLoop
    where
        F: FnMut(u64) -> ControlFlow<()> + Send + 'static,
    {
        let stop = self.stop_handle();
        let task = tokio::spawn(async move { self.run(on_frame).await });
        RunningLoop { stop, task }
    }
}

/// A frame loop running on its own task.
#[derive(Debug)]
pub struct RunningLoop {
    stop: StopHandle,
    task: JoinHandle<FrameStats>,
}

impl RunningLoop {
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the loop and wait for it to wind down.
    pub async fn stop(self) -> Result<FrameStats> {
        self.stop.stop();
        self.join().await
    }

    /// Wait for the loop to end on its own.
    pub async fn join(self) -> Result<FrameStats> {
        self.task
            .await
            .map_err(|e| StageKitError::render_with_source("frame loop task failed", e))
    }
}
