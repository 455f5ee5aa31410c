//! Tap zone mapping as a pure function over horizontal thirds.

use serde::{Deserialize, Serialize};

/// Logical action for a tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TapZone {
    Previous,
    TogglePause,
    Next,
}

/// Left third goes back, right third goes forward, the middle (boundaries
/// included) toggles pause. A degenerate width always toggles.
pub fn map_tap(x: f32, width: f32) -> TapZone {
    if !width.is_finite() || width <= 0.0 || !x.is_finite() {
        return TapZone::TogglePause;
    }
    let third = width / 3.0;
    if x < third {
        TapZone::Previous
    } else if x > third * 2.0 {
        TapZone::Next
    } else {
        TapZone::TogglePause
    }
}
