//! Playback clock.
//!
//! The clock turns a time source into tick deltas, and only while the
//! controller is playing. Time spent paused, composing or closed is never
//! credited: leaving `Playing` drops the mark, re-entering sets a new one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Source of monotonic milliseconds.
///
/// All methods take `&self`; sources manage their own concurrency.
pub trait TimeSource: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall-clock source backed by `Instant`.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Manually advanced source for deterministic tests and host-driven frames.
#[derive(Default)]
pub struct VirtualClock {
    now: AtomicU64,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl TimeSource for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Converts source time into tick deltas for the current item.
pub struct PlaybackClock {
    source: Arc<dyn TimeSource>,
    /// Time of the last poll while playing. `None` while suspended.
    mark: Option<u64>,
}

impl PlaybackClock {
    pub fn new(source: Arc<dyn TimeSource>) -> Self {
        Self { source, mark: None }
    }

    /// Delta since the last poll, or `None` when not playing or just resumed.
    pub fn poll(&mut self, playing: bool) -> Option<u64> {
        if !playing {
            self.mark = None;
            return None;
        }
        let now = self.source.now_ms();
        self.mark
            .replace(now)
            .map(|prev| now.saturating_sub(prev))
    }

    /// Restart measurement after a transition. Playing sets a fresh mark so
    /// the next delta only covers time on the new state.
    pub fn sync(&mut self, playing: bool) {
        self.mark = if playing { Some(self.source.now_ms()) } else { None };
    }

    pub fn is_running(&self) -> bool {
        self.mark.is_some()
    }
}
