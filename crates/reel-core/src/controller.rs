//! Playback controller: the viewer state machine.
//!
//! ```text
//!            toggle_pause
//!   Playing <------------> Paused
//!      |  ^                  |
//!      |  | submit/cancel    | open_reply_draft
//!      v  |                  v
//!   open_reply_draft ---> Composing
//!
//!   any --close()--> Closed   (terminal)
//!   advance past last / rewind past first --> Closed
//! ```
//!
//! The controller owns no timer. Ticks come from outside (the session
//! heartbeat) and are ignored unless the state is `Playing`.

use crate::error::{ViewerError, ViewerResult};
use crate::models::item::{Reply, UpdateItem};
use crate::models::snapshot::{Snapshot, ViewerState};
use crate::progress;
use crate::queue::UpdateQueue;
use crate::reply::{self, ReplyChannel};

/// Outcome of a transition that may move the current index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Stayed,
    Moved { from: usize, to: usize },
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackController {
    queue: UpdateQueue,
    index: usize,
    elapsed_ms: u64,
    paused: bool,
    reply: ReplyChannel,
    closed: bool,
    seen: Vec<bool>,
}

impl PlaybackController {
    /// Open a session at `start_index`, playing from zero.
    pub fn new(queue: UpdateQueue, start_index: usize) -> ViewerResult<Self> {
        if start_index >= queue.len() {
            return Err(ViewerError::InvalidStartIndex {
                index: start_index,
                len: queue.len(),
            });
        }
        let mut seen = vec![false; queue.len()];
        seen[start_index] = true;
        Ok(Self {
            queue,
            index: start_index,
            elapsed_ms: 0,
            paused: false,
            reply: ReplyChannel::default(),
            closed: false,
            seen,
        })
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn state(&self) -> ViewerState {
        if self.closed {
            ViewerState::Closed
        } else if self.reply.is_open() {
            ViewerState::Composing
        } else if self.paused {
            ViewerState::Paused
        } else {
            ViewerState::Playing
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state() == ViewerState::Playing
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn queue(&self) -> &UpdateQueue {
        &self.queue
    }

    pub fn current_item(&self) -> &UpdateItem {
        // index is validated at construction and only ever moves in range
        &self.queue.items()[self.index]
    }

    pub fn replies(&self, index: usize) -> Option<&[Reply]> {
        self.queue.get(index).map(|item| item.replies.as_slice())
    }

    pub fn seen_ids(&self) -> Vec<&str> {
        self.queue
            .items()
            .iter()
            .zip(&self.seen)
            .filter(|(_, seen)| **seen)
            .map(|(item, _)| item.id.as_str())
            .collect()
    }

    pub fn progress_ratios(&self) -> Vec<f32> {
        progress::progress_ratios(
            self.queue.len(),
            self.index,
            self.elapsed_ms,
            self.current_item().duration_ms,
        )
    }

    pub fn snapshot(&self) -> Snapshot {
        let item = self.current_item();
        Snapshot {
            state: self.state(),
            current_index: self.index,
            current_id: item.id.clone(),
            elapsed_ms: self.elapsed_ms,
            duration_ms: item.duration_ms,
            paused: self.paused,
            composing: self.reply.is_open(),
            closed: self.closed,
            progress_ratios: self.progress_ratios(),
            draft: self.reply.draft().to_string(),
            reply_count: item.replies.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Credit `delta_ms` of play time. Silent no-op unless playing, so a
    /// tick that raced a pause or close changes nothing.
    pub fn tick(&mut self, delta_ms: u64) -> Step {
        if !self.is_playing() {
            return Step::Stayed;
        }
        let duration = self.current_item().duration_ms;
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms).min(duration);
        if self.elapsed_ms >= duration {
            self.step_forward()
        } else {
            Step::Stayed
        }
    }

    /// Manual advance. Past the last item the session closes.
    ///
    /// Paused and composing are kept; an open draft carries over and is
    /// submitted against the item it ends up on.
    pub fn advance(&mut self) -> ViewerResult<Step> {
        self.ensure_open()?;
        Ok(self.step_forward())
    }

    /// Manual rewind. Before the first item the session closes.
    pub fn rewind(&mut self) -> ViewerResult<Step> {
        self.ensure_open()?;
        if self.index == 0 {
            self.finish("rewind past first item");
            return Ok(Step::Closed);
        }
        Ok(self.move_to(self.index - 1))
    }

    /// Flip between playing and paused. Returns the new paused flag.
    /// No-op while composing.
    pub fn toggle_pause(&mut self) -> ViewerResult<bool> {
        self.ensure_open()?;
        if !self.reply.is_open() {
            self.paused = !self.paused;
        }
        Ok(self.paused)
    }

    /// Enter `Composing` from `Playing` or `Paused`. Idempotent.
    pub fn open_reply_draft(&mut self) -> ViewerResult<()> {
        self.ensure_open()?;
        self.reply.open();
        Ok(())
    }

    /// Replace the draft text. Ignored unless composing.
    pub fn edit_reply_draft(&mut self, text: &str) -> ViewerResult<()> {
        self.ensure_open()?;
        if self.reply.is_open() {
            self.reply.edit(text);
        }
        Ok(())
    }

    /// Submit `text` as a reply to the current item and resume playing.
    ///
    /// Returns whether a reply was appended. Blank text closes the draft
    /// without touching the log; outside `Composing` nothing happens.
    pub fn submit_reply(&mut self, text: &str) -> ViewerResult<bool> {
        self.ensure_open()?;
        if !self.reply.is_open() {
            return Ok(false);
        }
        self.reply.edit(text);
        let text = self.reply.take();
        self.paused = false;
        if text.trim().is_empty() {
            return Ok(false);
        }
        self.queue.append_reply(
            self.index,
            Reply {
                text,
                submitted_at_ms: reply::now_ms(),
            },
        );
        log::debug!("reel: reply appended to {}", self.current_item().id);
        Ok(true)
    }

    /// Leave `Composing` without replying.
    pub fn cancel_reply_draft(&mut self) -> ViewerResult<()> {
        self.ensure_open()?;
        if self.reply.is_open() {
            self.reply.discard();
            self.paused = false;
        }
        Ok(())
    }

    /// End the session. Idempotent.
    pub fn close(&mut self) {
        if !self.closed {
            self.finish("close requested");
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn ensure_open(&self) -> ViewerResult<()> {
        if self.closed {
            Err(ViewerError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn step_forward(&mut self) -> Step {
        if self.index + 1 >= self.queue.len() {
            self.finish("advance past last item");
            return Step::Closed;
        }
        self.move_to(self.index + 1)
    }

    fn move_to(&mut self, to: usize) -> Step {
        let from = self.index;
        self.index = to;
        self.elapsed_ms = 0;
        self.seen[to] = true;
        log::debug!("reel: item {} -> {}", from, to);
        Step::Moved { from, to }
    }

    fn finish(&mut self, reason: &str) {
        self.reply.discard();
        self.closed = true;
        log::info!("reel: session closed ({}) at item {}", reason, self.index);
    }
}
