//! The single-writer review session.
//!
//! A [`Session`] owns the live document and is the only thing that commits
//! transactions to it. Locating and diffing are pure and may be computed
//! anywhere; their results are checked against the document version when
//! they come back to [`Session::apply`].

use crate::annotate::{build_annotation, SuggestionIds, SuggestionMetadata};
use crate::diff::{cleanup_with, diff, CleanupConfig, EditScript};
use crate::errors::{AnnotateError, ResolveError};
use crate::resolution::{
    build_batch_resolution, build_resolution, pending_suggestions, Decision, Resolution,
    SuggestionLedger, SuggestionSpan, SuggestionState,
};
use layered_transcript::{
    locate, Assoc, Document, LocateError, LocateOptions, Mapping, Step, StepError, SuggestionId,
    TextMatch, Transaction,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Committed versions kept for undo and match rebasing.
const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Options used by [`Session::propose`] when a request has no scope.
    pub locate: LocateOptions,
    pub cleanup: CleanupConfig,
    /// How many times a stale match is silently re-located.
    pub stale_retries: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            locate: LocateOptions::default(),
            cleanup: CleanupConfig::default(),
            stale_retries: 1,
        }
    }
}

/// What a commit did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Annotated {
        suggestions: Vec<SuggestionId>,
    },
    Resolved {
        resolved: Vec<(SuggestionId, SuggestionState)>,
    },
    SpeakerRenamed {
        block: usize,
        speaker_name: String,
        speaker_id: String,
    },
    Undone {
        undone_version: u64,
        restored_version: u64,
    },
}

/// Emitted once per committed version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentEvent {
    /// The version the commit produced.
    pub version: u64,
    pub kind: EventKind,
}

pub type Observer = Box<dyn FnMut(&DocumentEvent) + Send>;

struct HistoryEntry {
    document: Document,
    ledger: SuggestionLedger,
}

pub struct Session {
    doc: Document,
    config: SessionConfig,
    ledger: SuggestionLedger,
    ids: SuggestionIds,
    history: Vec<HistoryEntry>,
    /// Mapping from each version to the next; `None` where no mapping exists.
    maps: BTreeMap<u64, Option<Mapping>>,
    observers: Vec<Observer>,
}

impl Session {
    pub fn new(doc: Document) -> Self {
        Self::with_config(doc, SessionConfig::default())
    }

    pub fn with_config(doc: Document, config: SessionConfig) -> Self {
        let ids = SuggestionIds::for_document(&doc);
        Self {
            doc,
            config,
            ledger: SuggestionLedger::new(),
            ids,
            history: Vec::new(),
            maps: BTreeMap::new(),
            observers: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn version(&self) -> u64 {
        self.doc.version()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn ledger(&self) -> &SuggestionLedger {
        &self.ledger
    }

    /// Register an observer called after every commit.
    pub fn subscribe(&mut self, observer: impl FnMut(&DocumentEvent) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn locate(&self, search: &str, options: &LocateOptions) -> Result<Vec<TextMatch>, LocateError> {
        locate(&self.doc, search, options)
    }

    /// Cleaned-up edit script using the session's cleanup settings.
    pub fn diff(&self, original: &str, corrected: &str) -> EditScript {
        cleanup_with(&diff(original, corrected), &self.config.cleanup)
    }

    /// Annotate `m` with `script` as one committed version.
    pub fn apply(
        &mut self,
        m: &TextMatch,
        script: &EditScript,
        metadata: &SuggestionMetadata,
    ) -> Result<Vec<SuggestionId>, AnnotateError> {
        let mut ids = self.ids.clone();
        let annotation = build_annotation(&self.doc, m, script, metadata, &mut ids)?;
        self.commit(&annotation.transaction)?;
        self.ids = ids;
        for id in &annotation.suggestions {
            self.ledger.track(id.clone());
        }
        tracing::info!(
            version = self.doc.version(),
            suggestions = annotation.suggestions.len(),
            "annotated"
        );
        self.emit(EventKind::Annotated {
            suggestions: annotation.suggestions.clone(),
        });
        Ok(annotation.suggestions)
    }

    pub fn accept(&mut self, id: &SuggestionId) -> Result<SuggestionState, ResolveError> {
        self.resolve(id, Decision::Accept)
    }

    pub fn reject(&mut self, id: &SuggestionId) -> Result<SuggestionState, ResolveError> {
        self.resolve(id, Decision::Reject)
    }

    pub fn resolve(&mut self, id: &SuggestionId, decision: Decision) -> Result<SuggestionState, ResolveError> {
        let resolution = build_resolution(&self.doc, &self.ledger, id, decision)?;
        self.finish(resolution, decision)?;
        Ok(decision.outcome())
    }

    /// Accept every pending suggestion in one version.
    pub fn accept_all(&mut self) -> Result<Vec<SuggestionId>, ResolveError> {
        self.resolve_all(Decision::Accept)
    }

    /// Reject every pending suggestion in one version.
    pub fn reject_all(&mut self) -> Result<Vec<SuggestionId>, ResolveError> {
        self.resolve_all(Decision::Reject)
    }

    /// Resolve every pending suggestion; nothing is committed when none are
    /// pending.
    pub fn resolve_all(&mut self, decision: Decision) -> Result<Vec<SuggestionId>, ResolveError> {
        let ids: Vec<SuggestionId> = pending_suggestions(&self.doc)
            .into_iter()
            .map(|span| span.id)
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let resolution = build_batch_resolution(&self.doc, &self.ledger, &ids, decision)?;
        let resolved = self.finish(resolution, decision)?;
        Ok(resolved.into_iter().map(|(id, _)| id).collect())
    }

    fn finish(
        &mut self,
        resolution: Resolution,
        decision: Decision,
    ) -> Result<Vec<(SuggestionId, SuggestionState)>, ResolveError> {
        self.commit(&resolution.transaction)?;
        for (id, _) in &resolution.resolved {
            self.ledger.resolve(id, decision)?;
        }
        tracing::info!(
            version = self.doc.version(),
            resolved = resolution.resolved.len(),
            ?decision,
            "resolved"
        );
        self.emit(EventKind::Resolved {
            resolved: resolution.resolved.clone(),
        });
        Ok(resolution.resolved)
    }

    /// Every pending suggestion in document order.
    pub fn pending(&self) -> Vec<SuggestionSpan> {
        pending_suggestions(&self.doc)
    }

    /// Current state of a suggestion; untracked ones still in the document
    /// are pending.
    pub fn suggestion_state(&self, id: &SuggestionId) -> Option<SuggestionState> {
        self.ledger.state(id).or_else(|| {
            self.pending()
                .iter()
                .any(|span| &span.id == id)
                .then_some(SuggestionState::Pending)
        })
    }

    /// Rename the speaker of one block. Word timecodes are untouched.
    pub fn rename_speaker(
        &mut self,
        block: usize,
        speaker_name: impl Into<String>,
        speaker_id: impl Into<String>,
    ) -> Result<u64, StepError> {
        let (pos, mut attrs) = match (self.doc.block_start(block), self.doc.block(block)) {
            (Some(pos), Some(existing)) => (pos, existing.attrs.clone()),
            _ => {
                return Err(StepError::BlockOutOfRange {
                    index: block,
                    count: self.doc.blocks().len(),
                })
            }
        };
        attrs.speaker_name = speaker_name.into();
        attrs.speaker_id = speaker_id.into();
        let mut tr = Transaction::new(&self.doc);
        tr.step(Step::SetBlockAttrs {
            pos,
            attrs: attrs.clone(),
        })?;
        self.commit(&tr)?;
        self.emit(EventKind::SpeakerRenamed {
            block,
            speaker_name: attrs.speaker_name,
            speaker_id: attrs.speaker_id,
        });
        Ok(self.doc.version())
    }

    /// Restore the version before the last commit as a new version.
    ///
    /// Returns the new version, or `None` when there is nothing to undo.
    /// Suggestion IDs allocated by the undone commit are not handed out again.
    pub fn undo(&mut self) -> Option<u64> {
        let entry = self.history.pop()?;
        let undone_version = self.doc.version();
        let restored = self.doc.restored(&entry.document);
        self.maps.insert(undone_version, None);
        self.doc = restored;
        self.ledger = entry.ledger;
        tracing::info!(version = self.doc.version(), undone_version, "undone");
        self.emit(EventKind::Undone {
            undone_version,
            restored_version: entry.document.version(),
        });
        Some(self.doc.version())
    }

    /// Carry a match from an older version to the current one.
    ///
    /// Succeeds only when every commit since the match kept its range intact
    /// and the range still holds the same text.
    pub fn rebase_match(&self, m: &TextMatch) -> Option<TextMatch> {
        if m.version > self.doc.version() {
            return None;
        }
        let mut mapping = Mapping::new();
        for version in m.version..self.doc.version() {
            mapping.append(self.maps.get(&version)?.as_ref()?);
        }
        let from = mapping.map_result(m.from, Assoc::After);
        let to = mapping.map_result(m.to, Assoc::Before);
        if from.deleted || to.deleted || from.pos > to.pos {
            return None;
        }
        let rebased = TextMatch {
            from: from.pos,
            to: to.pos,
            text: self.doc.text_between(from.pos, to.pos, ""),
            version: self.doc.version(),
        };
        (rebased.text == m.text).then_some(rebased)
    }

    fn commit(&mut self, tr: &Transaction) -> Result<(), StepError> {
        let next = tr.apply(&self.doc)?;
        let previous = std::mem::replace(&mut self.doc, next);
        self.maps.insert(previous.version(), Some(tr.mapping().clone()));
        if self.maps.len() > HISTORY_LIMIT {
            if let Some(&oldest) = self.maps.keys().next() {
                self.maps.remove(&oldest);
            }
        }
        self.history.push(HistoryEntry {
            document: previous,
            ledger: self.ledger.clone(),
        });
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
        tracing::debug!(version = self.doc.version(), steps = tr.steps().len(), "committed");
        Ok(())
    }

    fn emit(&mut self, kind: EventKind) {
        let event = DocumentEvent {
            version: self.doc.version(),
            kind,
        };
        for observer in &mut self.observers {
            observer(&event);
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("version", &self.doc.version())
            .field("config", &self.config)
            .field("ledger", &self.ledger)
            .field("history", &self.history.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}
