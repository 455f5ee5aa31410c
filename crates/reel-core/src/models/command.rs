//! Viewer commands.
//!
//! ViewerCommand is a tagged enum, the serialized form of every input
//! entry point, so FFI hosts and the CLI speak one JSON vocabulary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Command sent to a session, e.g. `{"action": "tap", "x": 50, "width": 300}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ViewerCommand {
    Tap { x: f32, width: f32 },
    LongPressStart,
    LongPressEnd,
    TogglePause,
    Next,
    Previous,
    ReplyOpen,
    ReplyEdit { text: String },
    ReplySubmit { text: String },
    ReplyCancel,
    Close,
}

impl ViewerCommand {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn from_value(v: &Value) -> Option<Self> {
        serde_json::from_value(v.clone()).ok()
    }
}
