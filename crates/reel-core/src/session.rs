//! Viewing session: controller + clock + heartbeat.
//!
//! Owns the controller and its clock behind one mutex. A heartbeat thread
//! polls the clock and applies ticks; input entry points run transitions.
//! Both go through the same lock, so every tick is applied against the
//! state it read, and a pause or close can never be overtaken by a tick
//! that did not observe it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::ops::Deref;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;

use crate::clock::{MonotonicClock, PlaybackClock, TimeSource};
use crate::config::ViewerConfig;
use crate::controller::{PlaybackController, Step};
use crate::error::{ViewerError, ViewerResult};
use crate::gesture::{self, TapZone};
use crate::models::command::ViewerCommand;
use crate::models::item::{Reply, UpdateItem};
use crate::models::snapshot::{Snapshot, ViewerState};
use crate::queue::UpdateQueue;
use crate::reply::ReplyPreview;

/// Open a session with the default config and the monotonic clock.
pub fn start_session(queue: UpdateQueue, start_index: usize) -> ViewerResult<Session> {
    Session::open(queue, start_index, ViewerConfig::default())
}

/// Everything that must change together.
struct Core {
    controller: PlaybackController,
    clock: PlaybackClock,
    /// Set when a long press paused playback; release only resumes then.
    held: bool,
}

/// Session side of a subscription. The slot holds at most one snapshot;
/// `rx` lets the publisher evict a stale one before sending the latest.
struct Watcher {
    tx: Sender<Snapshot>,
    rx: Receiver<Snapshot>,
    alive: Weak<()>,
}

type Subscribers = Mutex<Vec<Watcher>>;

/// Latest-snapshot feed from `Session::subscribe`.
///
/// A watcher that falls behind only ever finds the newest snapshot waiting.
/// Dropping the subscription unregisters it on the next publish.
pub struct Subscription {
    rx: Receiver<Snapshot>,
    _alive: Arc<()>,
}

impl Subscription {
    pub fn receiver(&self) -> &Receiver<Snapshot> {
        &self.rx
    }
}

impl Deref for Subscription {
    type Target = Receiver<Snapshot>;

    fn deref(&self) -> &Self::Target {
        &self.rx
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One open viewing session.
pub struct Session {
    core: Arc<Mutex<Core>>,
    /// Snapshot watchers. Lock ordering: core before subscribers.
    subscribers: Arc<Subscribers>,
    config: ViewerConfig,
    /// Shutdown signal for the heartbeat.
    shutdown: Arc<AtomicBool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Session {
    /// Validate the start index and begin playing. On `InvalidStartIndex`
    /// no session begins.
    pub fn open(queue: UpdateQueue, start_index: usize, config: ViewerConfig) -> ViewerResult<Self> {
        Self::with_time_source(queue, start_index, config, Arc::new(MonotonicClock::new()))
    }

    /// Open at the item with `id`. An id not in the queue is reported as
    /// `InvalidStartIndex` (index == queue length) and no session begins.
    pub fn open_at_id(queue: UpdateQueue, id: &str, config: ViewerConfig) -> ViewerResult<Self> {
        match queue.index_of(id) {
            Some(index) => Self::open(queue, index, config),
            None => {
                log::warn!("reel: no item with id {} in queue", id);
                Err(ViewerError::InvalidStartIndex {
                    index: queue.len(),
                    len: queue.len(),
                })
            }
        }
    }

    /// Same as `open` with an injected time source (e.g. `VirtualClock`).
    pub fn with_time_source(
        queue: UpdateQueue,
        start_index: usize,
        config: ViewerConfig,
        source: Arc<dyn TimeSource>,
    ) -> ViewerResult<Self> {
        let controller = PlaybackController::new(queue, start_index)?;
        let mut clock = PlaybackClock::new(source);
        clock.sync(controller.is_playing());

        log::info!(
            "reel: session opened at {} of {}",
            start_index,
            controller.queue().len()
        );

        Ok(Self {
            core: Arc::new(Mutex::new(Core {
                controller,
                clock,
                held: false,
            })),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
            handles: Mutex::new(Vec::new()),
        })
    }

    /// Start the heartbeat. Idempotent.
    pub fn start(&self) {
        let mut handles = self.handles.lock();
        if !handles.is_empty() {
            return;
        }
        handles.push(self.start_heartbeat());
    }

    /// Stop the heartbeat and wait for it. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let mut handles = self.handles.lock();
        for handle in handles.drain(..) {
            let _ = handle.join();
        }
    }

    /// Clock-driven heartbeat. Exits on shutdown or once the session closes.
    fn start_heartbeat(&self) -> JoinHandle<()> {
        let core = Arc::clone(&self.core);
        let subscribers = Arc::clone(&self.subscribers);
        let shutdown = Arc::clone(&self.shutdown);
        let interval = self.config.tick_interval();

        thread::spawn(move || {
            while !shutdown.load(Ordering::SeqCst) {
                thread::sleep(interval);

                if shutdown.load(Ordering::SeqCst) {
                    break;
                }

                if pump(&core, &subscribers).closed {
                    log::debug!("reel: heartbeat stopping, session closed");
                    break;
                }
            }
        })
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> Snapshot {
        self.core.lock().controller.snapshot()
    }

    pub fn state(&self) -> ViewerState {
        self.core.lock().controller.state()
    }

    pub fn current_item(&self) -> UpdateItem {
        self.core.lock().controller.current_item().clone()
    }

    pub fn replies(&self, index: usize) -> Option<Vec<Reply>> {
        self.core.lock().controller.replies(index).map(<[Reply]>::to_vec)
    }

    /// First `limit` replies of item `index` and the hidden count.
    pub fn replies_preview(&self, index: usize, limit: usize) -> Option<ReplyPreview> {
        self.core
            .lock()
            .controller
            .replies(index)
            .map(|replies| ReplyPreview::of(replies, limit))
    }

    pub fn seen_ids(&self) -> Vec<String> {
        self.core
            .lock()
            .controller
            .seen_ids()
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Watch snapshots. The current one is waiting immediately; after that
    /// each tick or transition replaces whatever is still unread.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let alive = Arc::new(());
        let core = self.core.lock();
        let _ = tx.try_send(core.controller.snapshot());
        self.subscribers.lock().push(Watcher {
            tx,
            rx: rx.clone(),
            alive: Arc::downgrade(&alive),
        });
        Subscription { rx, _alive: alive }
    }

    /// One heartbeat step, run inline. Hosts that drive their own frame
    /// loop (and tests with a `VirtualClock`) call this instead of `start`.
    pub fn pump(&self) -> Snapshot {
        pump(&self.core, &self.subscribers)
    }

    // -----------------------------------------------------------------------
    // Input entry points
    // -----------------------------------------------------------------------

    /// Route a tap through the zone mapper. Returns the zone it was routed
    /// to; a middle tap while composing is still a no-op.
    pub fn on_tap(&self, x: f32, width: f32) -> ViewerResult<TapZone> {
        let zone = gesture::map_tap(x, width);
        self.transition(|core| {
            match zone {
                TapZone::Previous => {
                    core.controller.rewind()?;
                }
                TapZone::Next => {
                    core.controller.advance()?;
                }
                TapZone::TogglePause => {
                    core.controller.toggle_pause()?;
                }
            }
            Ok(zone)
        })
    }

    /// Pause while the finger is down.
    pub fn on_long_press_start(&self) -> ViewerResult<()> {
        self.transition(|core| {
            if core.controller.is_closed() {
                return Err(ViewerError::SessionClosed);
            }
            if core.controller.is_playing() {
                core.controller.toggle_pause()?;
                core.held = true;
            }
            Ok(())
        })
    }

    /// Resume on release, but only if the press is what paused us.
    pub fn on_long_press_end(&self) -> ViewerResult<()> {
        self.transition(|core| {
            if core.controller.is_closed() {
                return Err(ViewerError::SessionClosed);
            }
            if std::mem::take(&mut core.held) && core.controller.state() == ViewerState::Paused {
                core.controller.toggle_pause()?;
            }
            Ok(())
        })
    }

    pub fn toggle_pause(&self) -> ViewerResult<bool> {
        self.transition(|core| core.controller.toggle_pause())
    }

    pub fn next(&self) -> ViewerResult<Step> {
        self.transition(|core| core.controller.advance())
    }

    pub fn previous(&self) -> ViewerResult<Step> {
        self.transition(|core| core.controller.rewind())
    }

    pub fn on_reply_open(&self) -> ViewerResult<()> {
        self.transition(|core| core.controller.open_reply_draft())
    }

    pub fn on_reply_edit(&self, text: &str) -> ViewerResult<()> {
        self.transition(|core| core.controller.edit_reply_draft(text))
    }

    /// Returns whether a reply was appended.
    pub fn on_reply_submit(&self, text: &str) -> ViewerResult<bool> {
        self.transition(|core| core.controller.submit_reply(text))
    }

    pub fn on_reply_cancel(&self) -> ViewerResult<()> {
        self.transition(|core| core.controller.cancel_reply_draft())
    }

    /// Close the session. Closing twice is fine.
    pub fn on_request_close(&self) -> ViewerResult<()> {
        self.transition(|core| {
            core.controller.close();
            Ok(())
        })
    }

    /// Dispatch a serialized command.
    pub fn command(&self, cmd: ViewerCommand) -> ViewerResult<()> {
        match cmd {
            ViewerCommand::Tap { x, width } => self.on_tap(x, width).map(drop),
            ViewerCommand::LongPressStart => self.on_long_press_start(),
            ViewerCommand::LongPressEnd => self.on_long_press_end(),
            ViewerCommand::TogglePause => self.toggle_pause().map(drop),
            ViewerCommand::Next => self.next().map(drop),
            ViewerCommand::Previous => self.previous().map(drop),
            ViewerCommand::ReplyOpen => self.on_reply_open(),
            ViewerCommand::ReplyEdit { ref text } => self.on_reply_edit(text),
            ViewerCommand::ReplySubmit { ref text } => self.on_reply_submit(text).map(drop),
            ViewerCommand::ReplyCancel => self.on_reply_cancel(),
            ViewerCommand::Close => self.on_request_close(),
        }
    }

    /// Run a transition under the lock. Play time up to this instant is
    /// credited first, the clock is re-synced if the state or item changed,
    /// then watchers get a snapshot.
    fn transition<T>(&self, f: impl FnOnce(&mut Core) -> ViewerResult<T>) -> ViewerResult<T> {
        let mut core = self.core.lock();
        let flushed = flush(&mut core);
        let before = (core.controller.state(), core.controller.current_index());

        let out = f(&mut *core);

        let after = (core.controller.state(), core.controller.current_index());
        if before != after {
            let playing = core.controller.is_playing();
            core.clock.sync(playing);
        }
        if out.is_ok() || flushed {
            publish(&self.subscribers, &core.controller.snapshot());
        }
        out
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // Don't join here; the heartbeat exits on its next wake
    }
}

// ---------------------------------------------------------------------------
// Heartbeat step
// ---------------------------------------------------------------------------

/// Single authoritative read of the state, then clock poll and tick,
/// all under one lock.
fn pump(core: &Mutex<Core>, subscribers: &Subscribers) -> Snapshot {
    let mut core = core.lock();
    if !flush(&mut core) {
        return core.controller.snapshot();
    }
    let snapshot = core.controller.snapshot();
    publish(subscribers, &snapshot);
    snapshot
}

/// Apply the time elapsed since the last poll. Returns whether a tick ran.
fn flush(core: &mut Core) -> bool {
    let playing = core.controller.is_playing();
    match core.clock.poll(playing) {
        Some(delta) => {
            if let Step::Moved { from, to } = core.controller.tick(delta) {
                log::debug!("reel: auto-advance {} -> {}", from, to);
            }
            true
        }
        None => false,
    }
}

/// Leave the latest snapshot in every watcher's slot, dropping the ones
/// whose subscription is gone.
fn publish(subscribers: &Subscribers, snapshot: &Snapshot) {
    subscribers.lock().retain(|watcher| {
        if watcher.alive.strong_count() == 0 {
            return false;
        }
        match watcher.tx.try_send(snapshot.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(latest)) => {
                let _ = watcher.rx.try_recv();
                let _ = watcher.tx.try_send(latest);
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    })
}
