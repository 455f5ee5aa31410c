//! Reply side channel.
//!
//! `ReplyChannel` is scratch space for the draft while composing. It never
//! touches the clock: opening and closing it goes through the controller,
//! and the session re-syncs the clock after every transition.

use serde::Serialize;

use crate::models::item::Reply;

/// Replies shown under an item before the "+N more" line.
pub const PREVIEW_LIMIT: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyChannel {
    open: bool,
    draft: String,
}

impl ReplyChannel {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Open the draft. Reopening keeps what was typed.
    pub(crate) fn open(&mut self) {
        self.open = true;
    }

    pub(crate) fn edit(&mut self, text: &str) {
        self.draft.clear();
        self.draft.push_str(text);
    }

    /// Close and hand back the draft text.
    pub(crate) fn take(&mut self) -> String {
        self.open = false;
        std::mem::take(&mut self.draft)
    }

    pub(crate) fn discard(&mut self) {
        self.open = false;
        self.draft.clear();
    }
}

/// First `limit` replies and how many more are hidden.
pub fn preview(replies: &[Reply], limit: usize) -> (&[Reply], usize) {
    let shown = replies.len().min(limit);
    (&replies[..shown], replies.len() - shown)
}

/// Owned form of `preview` for hosts: the replies to draw and how many
/// more sit behind them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyPreview {
    pub shown: Vec<Reply>,
    pub more: usize,
}

impl ReplyPreview {
    pub fn of(replies: &[Reply], limit: usize) -> Self {
        let (shown, more) = preview(replies, limit);
        Self {
            shown: shown.to_vec(),
            more,
        }
    }
}

pub(crate) fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
