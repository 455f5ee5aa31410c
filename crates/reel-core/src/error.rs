//! Viewer error taxonomy.
//!
//! Blank reply text is not here on purpose: an empty submission is a
//! silent no-op, not a failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    /// Session requested at an index outside the queue. No session begins.
    #[error("start index {index} out of range for queue of {len} items")]
    InvalidStartIndex { index: usize, len: usize },

    /// Explicit input arrived after the session reached `Closed`.
    #[error("viewing session is closed")]
    SessionClosed,

    #[error("item {id} has a zero duration")]
    InvalidDuration { id: String },

    #[error("duplicate item id in queue: {id}")]
    DuplicateId { id: String },

    #[error("queue file: {0}")]
    Io(#[from] std::io::Error),

    #[error("queue json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ViewerResult<T> = Result<T, ViewerError>;
