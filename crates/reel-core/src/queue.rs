//! Update queue: the fixed item list of one viewing session.
//!
//! Length and order never change once built. The only mutation is
//! appending to an item's reply log, and only the controller does it.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::config::ViewerConfig;
use crate::error::{ViewerError, ViewerResult};
use crate::models::item::{ItemRecord, Reply, UpdateItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateQueue {
    items: Vec<UpdateItem>,
}

/// Accepted queue documents: a bare array or `{"items": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum QueueDocument {
    Bare(Vec<ItemRecord>),
    Wrapped { items: Vec<ItemRecord> },
}

impl UpdateQueue {
    /// Validate and freeze a list of items.
    pub fn new(items: Vec<UpdateItem>) -> ViewerResult<Self> {
        let mut ids = HashSet::with_capacity(items.len());
        for item in &items {
            if item.duration_ms == 0 {
                return Err(ViewerError::InvalidDuration { id: item.id.clone() });
            }
            if !ids.insert(item.id.as_str()) {
                return Err(ViewerError::DuplicateId { id: item.id.clone() });
            }
        }
        Ok(Self { items })
    }

    /// Resolve host records against the duration policy, then validate.
    pub fn from_records(records: Vec<ItemRecord>, config: &ViewerConfig) -> ViewerResult<Self> {
        Self::new(records.into_iter().map(|r| r.resolve(config)).collect())
    }

    pub fn from_json(json: &str, config: &ViewerConfig) -> ViewerResult<Self> {
        let records = match serde_json::from_str::<QueueDocument>(json)? {
            QueueDocument::Bare(items) | QueueDocument::Wrapped { items } => items,
        };
        Self::from_records(records, config)
    }

    pub fn load(path: impl AsRef<Path>, config: &ViewerConfig) -> ViewerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text, config)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&UpdateItem> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[UpdateItem] {
        &self.items
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub(crate) fn append_reply(&mut self, index: usize, reply: Reply) {
        if let Some(item) = self.items.get_mut(index) {
            item.replies.push(reply);
        }
    }
}
