#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Diff-based correction suggestions for transcript documents.
//!
//! A correction is located in the document, diffed against its replacement
//! and written as pending suggestion marks. Reviewers later accept or
//! reject each suggestion, which collapses it back into committed text.
//!
//! ## Modules
//!
//! - [`diff`] - Myers diff and semantic cleanup of edit scripts
//! - [`annotate`] - Writing an edit script as pending suggestions
//! - [`resolution`] - Accept/reject state machine and batch resolution
//! - [`session`] - Single-writer session with events, undo and match rebasing
//! - [`correction`] - Correction requests and in-flight request tracking
//! - [`records`] - Applying persisted correction records
//! - [`errors`] - Error types for the review engine

pub mod annotate;
pub mod correction;
pub mod diff;
pub mod errors;
pub mod records;
pub mod resolution;
pub mod session;

#[cfg(test)]
mod tests {
    mod properties;
    mod session;
}

pub use annotate::{build_annotation, Annotation, SuggestionIds, SuggestionMetadata};
pub use correction::{Applied, CorrectionRequest, RequestTicket, RequestTracker, DEFAULT_CONFIDENCE};
pub use diff::{cleanup, cleanup_with, diff, diff_semantic, CleanupConfig, EditKind, EditOp, EditScript};
pub use errors::{AnnotateError, CorrectionError, DiffError, ResolveError};
pub use records::{ChangeSummary, CorrectionRecord, RecordStatus};
pub use resolution::{
    build_batch_resolution, build_resolution, find_suggestion, pending_suggestions, Decision,
    Resolution, SuggestionLedger, SuggestionSpan, SuggestionState,
};
pub use session::{DocumentEvent, EventKind, Observer, Session, SessionConfig};
