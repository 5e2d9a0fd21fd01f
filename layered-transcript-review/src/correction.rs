//! Correction requests from the analysis backend.
//!
//! A request names the text to correct and its replacement. The session
//! locates it, diffs it and applies the suggestions in one version, or
//! reports why it could not: no match, several matches, or a superseded
//! request.

use crate::annotate::SuggestionMetadata;
use crate::diff::EditScript;
use crate::errors::{AnnotateError, CorrectionError};
use crate::session::Session;
use layered_transcript::{Scope, SuggestionId, TextMatch};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

/// A proposed correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionRequest {
    pub original_text: String,
    pub corrected_text: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    /// Index of the occurrence to correct when several match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence: Option<usize>,
}

impl CorrectionRequest {
    pub fn new(original_text: impl Into<String>, corrected_text: impl Into<String>) -> Self {
        Self {
            original_text: original_text.into(),
            corrected_text: corrected_text.into(),
            reason: String::new(),
            confidence: DEFAULT_CONFIDENCE,
            scope: None,
            occurrence: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_occurrence(mut self, occurrence: usize) -> Self {
        self.occurrence = Some(occurrence);
        self
    }

    pub fn metadata(&self) -> SuggestionMetadata {
        SuggestionMetadata::new(self.reason.clone(), self.confidence)
    }

    /// Requests with the same key target the same span and supersede each other.
    pub fn scope_key(&self) -> String {
        let scope = match &self.scope {
            None => "document".to_string(),
            Some(Scope::Range { from, to }) => format!("range:{}-{}", from, to),
            Some(Scope::Block(index)) => format!("block:{}", index),
            Some(Scope::Speaker(speaker)) => format!("speaker:{}", speaker),
        };
        format!("{}|{}", scope, self.original_text)
    }
}

/// Outcome of an applied correction.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub suggestions: Vec<SuggestionId>,
    /// The match the suggestions were written at.
    pub located: TextMatch,
    pub script: EditScript,
    pub version: u64,
    /// Stale-match retries it took.
    pub retries: usize,
}

impl Session {
    /// Locate, diff and annotate `request` as one version.
    pub fn propose(&mut self, request: &CorrectionRequest) -> Result<Applied, CorrectionError> {
        if request.original_text == request.corrected_text {
            return Err(CorrectionError::NothingToChange);
        }
        let m = self.select_match(request)?;
        self.propose_at(request, m)
    }

    /// Annotate `request` at a match located earlier, possibly against an
    /// older version. A stale match is rebased or re-located up to
    /// `stale_retries` times before the error surfaces.
    pub fn propose_at(&mut self, request: &CorrectionRequest, m: TextMatch) -> Result<Applied, CorrectionError> {
        let metadata = request.metadata();
        let mut current = m;
        let mut retries = 0;
        loop {
            let script = self.diff(&current.text, &request.corrected_text);
            if script.is_identity() {
                return Err(CorrectionError::NothingToChange);
            }
            match self.apply(&current, &script, &metadata) {
                Ok(suggestions) => {
                    return Ok(Applied {
                        suggestions,
                        located: current,
                        script,
                        version: self.version(),
                        retries,
                    })
                }
                Err(AnnotateError::StaleMatch { .. }) if retries < self.config().stale_retries => {
                    retries += 1;
                    tracing::warn!(search = %request.original_text, retries, "stale match, locating again");
                    current = match self.rebase_match(&current) {
                        Some(rebased) => rebased,
                        None => self.select_match(request)?,
                    };
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Apply the response to a tracked request, unless it was cancelled or
    /// superseded while in flight.
    pub fn propose_response(
        &mut self,
        tracker: &mut RequestTracker,
        ticket: &RequestTicket,
        request: &CorrectionRequest,
    ) -> Result<Applied, CorrectionError> {
        if !tracker.admit(ticket) {
            tracing::debug!(generation = ticket.generation, "discarding late response");
            return Err(CorrectionError::Superseded {
                generation: ticket.generation,
            });
        }
        tracker.complete(ticket);
        self.propose(request)
    }

    fn select_match(&self, request: &CorrectionRequest) -> Result<TextMatch, CorrectionError> {
        let mut options = self.config().locate.clone();
        if let Some(scope) = &request.scope {
            options.scope = Some(scope.clone());
        }
        let mut candidates = self.locate(&request.original_text, &options)?;
        match (candidates.len(), request.occurrence) {
            (0, _) => Err(CorrectionError::NoMatch {
                search: request.original_text.clone(),
            }),
            (count, Some(occurrence)) if occurrence >= count => {
                Err(CorrectionError::OccurrenceOutOfRange { occurrence, count })
            }
            (_, Some(occurrence)) => Ok(candidates.swap_remove(occurrence)),
            (1, None) => Ok(candidates.remove(0)),
            (_, None) => Err(CorrectionError::AmbiguousMatch { candidates }),
        }
    }
}

/// Handle for one in-flight analysis request.
///
/// Cheap to clone and safe to move into the task awaiting the response.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    pub generation: u64,
    pub key: String,
    live: Arc<AtomicBool>,
}

impl RequestTicket {
    pub fn cancel(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// Generation ids for in-flight requests.
///
/// Starting a request for a key supersedes the older request for that key.
/// Responses are applied in arrival order; a superseded or cancelled
/// response is discarded when it arrives.
#[derive(Debug, Default)]
pub struct RequestTracker {
    next_generation: u64,
    in_flight: HashMap<String, RequestTicket>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, key: impl Into<String>) -> RequestTicket {
        let key = key.into();
        let ticket = RequestTicket {
            generation: self.next_generation,
            key: key.clone(),
            live: Arc::new(AtomicBool::new(true)),
        };
        self.next_generation += 1;
        if let Some(older) = self.in_flight.insert(key, ticket.clone()) {
            older.cancel();
        }
        ticket
    }

    pub fn cancel(&mut self, ticket: &RequestTicket) {
        ticket.cancel();
        self.forget(ticket);
    }

    /// Whether a response for `ticket` may still be applied.
    pub fn admit(&self, ticket: &RequestTicket) -> bool {
        ticket.is_live()
            && self
                .in_flight
                .get(&ticket.key)
                .map_or(false, |current| current.generation == ticket.generation)
    }

    /// Stop tracking a request whose response was handled.
    pub fn complete(&mut self, ticket: &RequestTicket) {
        self.forget(ticket);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn forget(&mut self, ticket: &RequestTicket) {
        let current = self.in_flight.get(&ticket.key).map(|t| t.generation);
        if current == Some(ticket.generation) {
            self.in_flight.remove(&ticket.key);
        }
    }
}
