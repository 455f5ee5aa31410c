//! Reel data models.
//!
//! Items, commands and snapshots are plain serde types: they cross the
//! FFI and CLI boundaries as JSON.

pub mod command;
pub mod item;
pub mod snapshot;

pub use command::ViewerCommand;
pub use item::{parse_clock_label, ItemKind, ItemRecord, Reply, UpdateItem};
pub use snapshot::{Snapshot, ViewerState};
