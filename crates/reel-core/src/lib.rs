//! reel-core: ephemeral update viewer.
//!
//! A full-screen, auto-advancing slideshow over a fixed queue of timed
//! items, with pause, tap-zone navigation and a reply side channel.
//!
//! # Architecture
//!
//! ```text
//! Layer 0: UpdateQueue, ViewerConfig (data, duration policy)
//! Layer 1: PlaybackController (state machine), PlaybackClock (time → ticks)
//! Layer 2: Session (heartbeat, input routing, snapshot watchers)
//! Layer 3: Hosts (FFI, CLI: send commands, render snapshots)
//! ```
//!
//! Gesture mapping and progress projection are pure functions over
//! controller state; neither owns anything.

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod gesture;
pub mod models;
pub mod progress;
pub mod queue;
pub mod reply;
pub mod session;

pub use clock::{MonotonicClock, PlaybackClock, TimeSource, VirtualClock};
pub use config::ViewerConfig;
pub use controller::{PlaybackController, Step};
pub use error::{ViewerError, ViewerResult};
pub use gesture::{map_tap, TapZone};
pub use models::*;
pub use queue::UpdateQueue;
pub use reply::ReplyPreview;
pub use session::{start_session, Session, Subscription};
