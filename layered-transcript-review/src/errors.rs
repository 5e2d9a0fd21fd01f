//! Error types for the review engine.

use crate::resolution::SuggestionState;
use layered_transcript::{LocateError, StepError, SuggestionId, TextMatch};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    #[error("edit script does not reproduce the {side} text: expected {expected:?}, found {found:?}")]
    MalformedEditScript {
        side: &'static str,
        expected: String,
        found: String,
    },
}

/// Errors raised while turning an edit script into suggestion marks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotateError {
    /// The match was computed against another version, or its range no
    /// longer holds the same text.
    #[error("match {match_text:?} at version {match_version} is stale (document is at {document_version})")]
    StaleMatch {
        match_text: String,
        match_version: u64,
        document_version: u64,
    },

    #[error(transparent)]
    MalformedEditScript(#[from] DiffError),

    #[error("text in the match already carries pending suggestion {id}")]
    OverlapsPendingSuggestion { id: SuggestionId },

    #[error("match {from}..{to} contains no text")]
    EmptyMatch { from: usize, to: usize },

    #[error(transparent)]
    Step(#[from] StepError),
}

/// Errors raised while accepting or rejecting suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unknown suggestion {id}")]
    UnknownSuggestion { id: SuggestionId },

    #[error("suggestion {id} was already {state}")]
    AlreadyResolved { id: SuggestionId, state: SuggestionState },

    #[error(transparent)]
    Step(#[from] StepError),
}

/// Errors surfaced by the correction pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CorrectionError {
    #[error("no occurrence of {search:?} found")]
    NoMatch { search: String },

    #[error("{} occurrences found; a scope or occurrence index is needed", candidates.len())]
    AmbiguousMatch { candidates: Vec<TextMatch> },

    #[error("occurrence {occurrence} requested but only {count} found")]
    OccurrenceOutOfRange { occurrence: usize, count: usize },

    #[error("original and corrected text are identical")]
    NothingToChange,

    #[error("request {generation} was superseded or cancelled")]
    Superseded { generation: u64 },

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Annotate(#[from] AnnotateError),
}

impl CorrectionError {
    /// Short machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            CorrectionError::NoMatch { .. } => "no_match",
            CorrectionError::AmbiguousMatch { .. } => "ambiguous_match",
            CorrectionError::OccurrenceOutOfRange { .. } => "occurrence_out_of_range",
            CorrectionError::NothingToChange => "nothing_to_change",
            CorrectionError::Superseded { .. } => "superseded",
            CorrectionError::Locate(_) => "invalid_scope",
            CorrectionError::Annotate(AnnotateError::StaleMatch { .. }) => "stale_match",
            CorrectionError::Annotate(AnnotateError::OverlapsPendingSuggestion { .. }) => {
                "overlaps_pending_suggestion"
            }
            CorrectionError::Annotate(AnnotateError::MalformedEditScript(_)) => "malformed_edit_script",
            CorrectionError::Annotate(_) => "annotate_failed",
        }
    }
}

impl ResolveError {
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::UnknownSuggestion { .. } => "unknown_suggestion",
            ResolveError::AlreadyResolved { .. } => "already_resolved",
            ResolveError::Step(_) => "step_failed",
        }
    }
}
