//! Playback Controller
//!
//! Two-state machine (stopped / playing) over a looping time index. The
//! controller never owns a clock: starting playback hands out a `TickToken`
//! and something implementing `TickScheduler` delivers that token back on a
//! fixed cadence. Pausing bumps the generation, so a token still in flight
//! from an earlier run is recognized as stale and ignored.
//!
//! - `ManualTicker`: records the pending token; tests and headless export fire it
//! - `TokioTicker`:  tokio interval task sending tokens over a channel

use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default tick cadence
pub const DEFAULT_INTERVAL_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    Stopped,
    Playing,
}

/// Snapshot of the controller, safe to hand to readers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub time_index: usize,
    pub interval_ms: u64,
}

/// Proof that a tick belongs to the current playback run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickToken {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Time index moved to the contained value
    Advanced(usize),
    /// Token from a cancelled run, or playback is stopped
    Stale,
}

/// Delivers tick tokens back to the controller's owner on a fixed cadence.
///
/// At most one schedule is live: `schedule` replaces any previous one.
pub trait TickScheduler {
    fn schedule(&mut self, token: TickToken, interval: Duration);
    fn cancel(&mut self);
}

#[derive(Debug, Clone)]
pub struct PlaybackController {
    status: PlaybackStatus,
    time_index: usize,
    interval_ms: u64,
    frame_count: usize,
    generation: u64,
}

impl PlaybackController {
    /// A zero interval is bumped to 1ms
    pub fn new(interval_ms: u64, frame_count: usize) -> Self {
        Self {
            status: PlaybackStatus::Stopped,
            time_index: 0,
            interval_ms: interval_ms.max(1),
            frame_count,
            generation: 0,
        }
    }

    /// stopped -> playing. Returns the token for the new run, or None if
    /// already playing.
    pub fn play(&mut self) -> Option<TickToken> {
        if self.status == PlaybackStatus::Playing {
            return None;
        }
        self.status = PlaybackStatus::Playing;
        self.generation += 1;
        tracing::debug!(generation = self.generation, "Playback started");
        Some(TickToken {
            generation: self.generation,
        })
    }

    /// playing -> stopped. Outstanding tokens become stale.
    pub fn pause(&mut self) -> bool {
        if self.status == PlaybackStatus::Stopped {
            return false;
        }
        self.status = PlaybackStatus::Stopped;
        self.generation += 1;
        tracing::debug!(time_index = self.time_index, "Playback paused");
        true
    }

    pub fn on_tick(&mut self, token: TickToken) -> TickOutcome {
        if self.status != PlaybackStatus::Playing || token.generation != self.generation {
            tracing::debug!(
                token = token.generation,
                current = self.generation,
                "Ignoring stale tick"
            );
            return TickOutcome::Stale;
        }
        TickOutcome::Advanced(self.advance())
    }

    /// Step forward one frame, wrapping past the last
    pub fn advance(&mut self) -> usize {
        self.time_index = if self.frame_count == 0 {
            0
        } else {
            (self.time_index + 1) % self.frame_count
        };
        self.time_index
    }

    /// External scrub. Indices past the end wrap.
    pub fn set_time_index(&mut self, index: usize) -> usize {
        self.time_index = if self.frame_count == 0 {
            0
        } else {
            index % self.frame_count
        };
        self.time_index
    }

    /// New dataset: rewind, keep the play/pause state
    pub fn reset(&mut self, frame_count: usize) {
        self.frame_count = frame_count;
        self.time_index = 0;
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn time_index(&self) -> usize {
        self.time_index
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            is_playing: self.is_playing(),
            time_index: self.time_index,
            interval_ms: self.interval_ms,
        }
    }
}

/// Scheduler driven by hand: remembers the live token until cancelled
#[derive(Debug, Default)]
pub struct ManualTicker {
    pending: Option<(TickToken, Duration)>,
    cancellations: usize,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token to deliver for the next simulated tick
    pub fn pending(&self) -> Option<TickToken> {
        self.pending.map(|(token, _)| token)
    }

    pub fn interval(&self) -> Option<Duration> {
        self.pending.map(|(_, interval)| interval)
    }

    pub fn cancellations(&self) -> usize {
        self.cancellations
    }
}

impl TickScheduler for ManualTicker {
    fn schedule(&mut self, token: TickToken, interval: Duration) {
        self.pending = Some((token, interval));
    }

    fn cancel(&mut self) {
        if self.pending.take().is_some() {
            self.cancellations += 1;
        }
    }
}

/// Wall-clock scheduler backed by a tokio task.
///
/// Ticks go through a one-slot channel; if the owner has not consumed the
/// previous tick the new one is dropped rather than queued.
pub struct TokioTicker {
    tx: mpsc::Sender<TickToken>,
    task: Option<JoinHandle<()>>,
}

impl TokioTicker {
    pub fn new() -> (Self, mpsc::Receiver<TickToken>) {
        let (tx, rx) = mpsc::channel(1);
        (Self { tx, task: None }, rx)
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl TickScheduler for TokioTicker {
    fn schedule(&mut self, token: TickToken, interval: Duration) {
        self.cancel();

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!("Playback timer not started, no tokio runtime: {}", e);
                return;
            }
        };

        let tx = self.tx.clone();
        self.task = Some(handle.spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticks = tokio::time::interval_at(start, interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                match tx.try_send(token) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::trace!("Previous tick still pending, skipping");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TokioTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}
