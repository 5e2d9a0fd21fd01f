//! Error types for the document model, transforms and the locator.

use thiserror::Error;

/// Errors raised while building or loading a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("word identifier {identifier:?} is used more than once")]
    DuplicateIdentifier { identifier: String },

    #[error("word identifier {identifier:?} was retired and cannot be reused")]
    RetiredIdentifier { identifier: String },

    #[error("invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A position that does not address the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("position {pos} is outside the document (size {size})")]
    OutOfRange { pos: usize, size: usize },
}

/// Errors raised while applying a [`Step`](crate::Step).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error(transparent)]
    Position(#[from] PositionError),

    #[error("range {from}..{to} is inverted")]
    InvertedRange { from: usize, to: usize },

    #[error("range {from}..{to} does not lie within a single parent node")]
    CrossesParent { from: usize, to: usize },

    #[error("position {pos} is between blocks; text cannot be placed there")]
    OutsideBlock { pos: usize },

    #[error("no word starts at position {pos}")]
    NotAWord { pos: usize },

    #[error("no block starts at position {pos}")]
    NotABlock { pos: usize },

    #[error("block {index} does not exist (document has {count} blocks)")]
    BlockOutOfRange { index: usize, count: usize },

    #[error("transaction was built against version {expected} but the document is at {found}")]
    VersionMismatch { expected: u64, found: u64 },
}

/// Errors raised by [`locate`](crate::locate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    #[error("scope range {from}..{to} is invalid for a document of size {size}")]
    InvalidRange { from: usize, to: usize, size: usize },

    #[error("block {index} does not exist (document has {count} blocks)")]
    UnknownBlock { index: usize, count: usize },
}
