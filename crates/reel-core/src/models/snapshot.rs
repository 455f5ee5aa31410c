//! Render snapshot: everything a view needs for one frame.

use serde::{Deserialize, Serialize};

/// Coarse controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerState {
    Playing,
    Paused,
    Composing,
    Closed,
}

/// Read-only copy of controller state plus derived progress ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: ViewerState,
    pub current_index: usize,
    pub current_id: String,
    pub elapsed_ms: u64,
    pub duration_ms: u64,
    pub paused: bool,
    pub composing: bool,
    pub closed: bool,
    pub progress_ratios: Vec<f32>,
    /// Draft text while composing, empty otherwise.
    pub draft: String,
    pub reply_count: usize,
}

impl Snapshot {
    pub fn remaining_ms(&self) -> u64 {
        self.duration_ms.saturating_sub(self.elapsed_ms)
    }
}
