//! Update items and replies.
//!
//! `UpdateItem` is what the controller plays. `ItemRecord` is the looser
//! shape hosts hand us as JSON, where the duration may be missing or given
//! as an `m:ss` label.

use serde::{Deserialize, Serialize};

use crate::config::ViewerConfig;

/// What kind of visual this item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Static,
    Video,
}

/// One entry in an item's reply log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub submitted_at_ms: i64,
}

/// One playable update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateItem {
    pub id: String,
    pub kind: ItemKind,
    pub duration_ms: u64,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub business: bool,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl UpdateItem {
    pub fn new(id: impl Into<String>, kind: ItemKind, duration_ms: u64) -> Self {
        Self {
            id: id.into(),
            kind,
            duration_ms,
            author: String::new(),
            posted: None,
            caption: None,
            muted: false,
            private: false,
            business: false,
            replies: Vec::new(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_replies(mut self, replies: Vec<Reply>) -> Self {
        self.replies = replies;
        self
    }
}

/// Item as supplied by a host, before the duration policy is applied.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemRecord {
    pub id: String,
    #[serde(default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Human label such as `"0:15"`; used when `duration_ms` is absent.
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub posted: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub business: bool,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl ItemRecord {
    /// Apply the duration policy. An explicit `duration_ms` always wins,
    /// even zero, so that queue validation can reject it.
    pub fn resolve(self, config: &ViewerConfig) -> UpdateItem {
        let duration_ms = match (self.duration_ms, self.duration.as_deref()) {
            (Some(ms), _) => ms,
            (None, Some(label)) => match parse_clock_label(label) {
                Some(ms) if ms > 0 => ms,
                _ => {
                    log::warn!(
                        "reel: item {} has unusable duration label {:?}, using default",
                        self.id,
                        label
                    );
                    config.default_duration_ms
                }
            },
            (None, None) => config.default_duration_ms,
        };

        UpdateItem {
            id: self.id,
            kind: self.kind,
            duration_ms,
            author: self.author,
            posted: self.posted,
            caption: self.caption,
            muted: self.muted,
            private: self.private,
            business: self.business,
            replies: self.replies,
        }
    }
}

/// Parse `"m:ss"` / `"h:mm:ss"` / `"ss"` into milliseconds.
pub fn parse_clock_label(label: &str) -> Option<u64> {
    let mut total: u64 = 0;
    for (i, part) in label.trim().split(':').enumerate() {
        if i > 2 {
            return None;
        }
        let value: u64 = part.trim().parse().ok()?;
        if i > 0 && value >= 60 {
            return None;
        }
        total = total.checked_mul(60)?.checked_add(value)?;
    }
    total.checked_mul(1000)
}
