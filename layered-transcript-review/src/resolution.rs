//! Accepting and rejecting pending suggestions.
//!
//! Every suggestion moves `Pending -> Accepted` or `Pending -> Rejected` and
//! never leaves a terminal state. Resolution collapses the annotation back
//! into committed text:
//!
//! | kind      | accept            | reject            |
//! |-----------|-------------------|-------------------|
//! | insertion | keep text, unmark | drop text         |
//! | deletion  | drop text         | keep text, unmark |

use crate::errors::ResolveError;
use layered_transcript::{
    Assoc, Document, Mark, Step, SuggestionId, SuggestionKind, SuggestionMark, Transaction,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn outcome(self) -> SuggestionState {
        match self {
            Decision::Accept => SuggestionState::Accepted,
            Decision::Reject => SuggestionState::Rejected,
        }
    }

    /// Whether resolving a suggestion of `kind` this way keeps its text.
    pub fn keeps_text(self, kind: SuggestionKind) -> bool {
        matches!(
            (kind, self),
            (SuggestionKind::Insertion, Decision::Accept) | (SuggestionKind::Deletion, Decision::Reject)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionState {
    Pending,
    Accepted,
    Rejected,
}

impl SuggestionState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SuggestionState::Pending)
    }
}

impl fmt::Display for SuggestionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SuggestionState::Pending => "pending",
            SuggestionState::Accepted => "accepted",
            SuggestionState::Rejected => "rejected",
        })
    }
}

/// State of every suggestion a session has seen.
///
/// Suggestions found in a loaded document but never tracked count as pending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionLedger {
    states: BTreeMap<SuggestionId, SuggestionState>,
}

impl SuggestionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: &SuggestionId) -> Option<SuggestionState> {
        self.states.get(id).copied()
    }

    /// Start tracking a freshly created suggestion.
    pub fn track(&mut self, id: SuggestionId) {
        self.states.entry(id).or_insert(SuggestionState::Pending);
    }

    /// Fails with `AlreadyResolved` when `id` reached a terminal state.
    pub fn check(&self, id: &SuggestionId) -> Result<(), ResolveError> {
        match self.state(id) {
            Some(state) if state.is_terminal() => Err(ResolveError::AlreadyResolved {
                id: id.clone(),
                state,
            }),
            _ => Ok(()),
        }
    }

    /// Move `id` into the state `decision` leads to.
    pub fn resolve(&mut self, id: &SuggestionId, decision: Decision) -> Result<SuggestionState, ResolveError> {
        self.check(id)?;
        let state = decision.outcome();
        self.states.insert(id.clone(), state);
        Ok(state)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SuggestionId, SuggestionState)> {
        self.states.iter().map(|(id, state)| (id, *state))
    }

    pub fn count(&self, state: SuggestionState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }
}

/// Where a pending suggestion lives in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionSpan {
    pub id: SuggestionId,
    pub kind: SuggestionKind,
    pub reason: String,
    pub confidence: f64,
    /// Runs of consecutive positions carrying the suggestion, ascending.
    pub segments: Vec<(usize, usize)>,
    /// The suggested text.
    pub text: String,
}

impl SuggestionSpan {
    fn new(mark: &SuggestionMark) -> Self {
        Self {
            id: mark.id.clone(),
            kind: mark.kind,
            reason: mark.reason.clone(),
            confidence: mark.confidence,
            segments: Vec::new(),
            text: String::new(),
        }
    }

    pub fn from(&self) -> usize {
        self.segments.first().map_or(0, |seg| seg.0)
    }

    pub fn to(&self) -> usize {
        self.segments.last().map_or(0, |seg| seg.1)
    }

    fn mark(&self) -> Mark {
        Mark::Suggestion(SuggestionMark::new(
            self.id.clone(),
            self.kind,
            self.reason.clone(),
            self.confidence,
        ))
    }
}

/// Every pending suggestion, ordered by first position.
pub fn pending_suggestions(doc: &Document) -> Vec<SuggestionSpan> {
    let mut spans: Vec<SuggestionSpan> = Vec::new();
    let mut index: HashMap<SuggestionId, usize> = HashMap::new();
    for unit in doc.text_units() {
        if let Some(mark) = unit.marks.suggestion() {
            let i = *index.entry(mark.id.clone()).or_insert_with(|| {
                spans.push(SuggestionSpan::new(mark));
                spans.len() - 1
            });
            let span = &mut spans[i];
            span.text.push(unit.ch);
            match span.segments.last_mut() {
                // consecutive positions always share a parent
                Some(seg) if seg.1 == unit.pos => seg.1 += 1,
                _ => span.segments.push((unit.pos, unit.pos + 1)),
            }
        }
    }
    spans
}

pub fn find_suggestion(doc: &Document, id: &SuggestionId) -> Option<SuggestionSpan> {
    pending_suggestions(doc).into_iter().find(|span| &span.id == id)
}

/// A built, not yet committed, resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub transaction: Transaction,
    /// Resolved suggestions with their new state, in processing order.
    pub resolved: Vec<(SuggestionId, SuggestionState)>,
}

/// Build the transaction resolving a single suggestion.
pub fn build_resolution(
    doc: &Document,
    ledger: &SuggestionLedger,
    id: &SuggestionId,
    decision: Decision,
) -> Result<Resolution, ResolveError> {
    build_batch_resolution(doc, ledger, std::slice::from_ref(id), decision)
}

/// Build one transaction resolving every suggestion in `ids` the same way.
///
/// Suggestions are processed in reverse document order, so removing text
/// never moves a suggestion that is still to be processed.
pub fn build_batch_resolution(
    doc: &Document,
    ledger: &SuggestionLedger,
    ids: &[SuggestionId],
    decision: Decision,
) -> Result<Resolution, ResolveError> {
    let pending = pending_suggestions(doc);
    let mut spans = Vec::new();
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            continue;
        }
        ledger.check(id)?;
        let span = pending
            .iter()
            .find(|span| &span.id == id)
            .ok_or_else(|| ResolveError::UnknownSuggestion { id: id.clone() })?;
        spans.push(span);
    }
    spans.sort_by(|a, b| b.from().cmp(&a.from()));

    let mut tr = Transaction::new(doc);
    let mut dropped = BTreeSet::new();
    for span in &spans {
        if decision.keeps_text(span.kind) {
            tr.step(Step::RemoveMark {
                from: span.from(),
                to: span.to(),
                mark: span.mark(),
            })?;
        } else {
            for &(from, to) in &span.segments {
                dropped.extend(from..to);
            }
        }
    }
    for edit in removals(doc, &dropped) {
        match edit {
            Removal::Word { pos } => {
                tr.step(Step::RemoveInline {
                    pos: tr.map(pos, Assoc::After),
                })?;
            }
            Removal::Text { from, to } => {
                tr.step(Step::Replace {
                    from: tr.map(from, Assoc::After),
                    to: tr.map(to, Assoc::Before),
                    slice: Vec::new(),
                })?;
            }
        }
    }

    let resolved: Vec<_> = spans
        .iter()
        .map(|span| (span.id.clone(), decision.outcome()))
        .collect();
    tracing::debug!(count = resolved.len(), ?decision, "resolution built");
    Ok(Resolution {
        transaction: tr,
        resolved,
    })
}

enum Removal {
    /// A word whose whole text is dropped.
    Word { pos: usize },
    Text { from: usize, to: usize },
}

impl Removal {
    fn start(&self) -> usize {
        match *self {
            Removal::Word { pos } => pos,
            Removal::Text { from, .. } => from,
        }
    }
}

/// Removals for the dropped positions, last first.
fn removals(doc: &Document, dropped: &BTreeSet<usize>) -> Vec<Removal> {
    let mut edits = Vec::new();
    let mut emptied = Vec::new();
    for word in doc.words() {
        let (from, to) = word.content_range();
        if from < to && (from..to).all(|pos| dropped.contains(&pos)) {
            edits.push(Removal::Word { pos: word.pos });
            emptied.push((from, to));
        }
    }

    let mut run: Option<(usize, usize)> = None;
    for &pos in dropped {
        if emptied.iter().any(|&(from, to)| pos >= from && pos < to) {
            continue;
        }
        run = match run {
            Some((from, to)) if to == pos => Some((from, to + 1)),
            Some((from, to)) => {
                edits.push(Removal::Text { from, to });
                Some((pos, pos + 1))
            }
            None => Some((pos, pos + 1)),
        };
    }
    if let Some((from, to)) = run {
        edits.push(Removal::Text { from, to });
    }

    edits.sort_by(|a, b| b.start().cmp(&a.start()));
    edits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::{build_annotation, SuggestionIds, SuggestionMetadata};
    use crate::diff::diff_semantic;
    use layered_transcript::{locate, Block, BlockAttrs, DocumentDisplay, LocateOptions, Word};

    fn sample() -> Document {
        Document::new(vec![Block::with_words(
            BlockAttrs::new("Mari", "spk-1"),
            vec![
                Word::new("w1", 0.0, "See"),
                Word::new("w2", 0.4, "on"),
                Word::new("w42", 12.5, "testt"),
                Word::new("w4", 13.1, "lause"),
            ],
        )])
        .unwrap()
    }

    fn annotate(doc: &Document, search: &str, corrected: &str) -> Document {
        let m = locate(doc, search, &LocateOptions::default()).unwrap().remove(0);
        let mut ids = SuggestionIds::for_document(doc);
        build_annotation(
            doc,
            &m,
            &diff_semantic(&m.text, corrected),
            &SuggestionMetadata::new("asr", 0.8),
            &mut ids,
        )
        .unwrap()
        .transaction
        .apply(doc)
        .unwrap()
    }

    fn resolve(doc: &Document, index: u64, decision: Decision) -> Document {
        build_resolution(doc, &SuggestionLedger::new(), &SuggestionId::new(index), decision)
            .unwrap()
            .transaction
            .apply(doc)
            .unwrap()
    }

    fn identifiers(doc: &Document) -> Vec<&str> {
        doc.words().into_iter().map(|w| w.word.identifier()).collect()
    }

    #[test]
    fn test_accept_deletion() {
        let doc = annotate(&sample(), "testt", "test");
        let accepted = resolve(&doc, 0, Decision::Accept);
        assert_eq!(accepted.plain_text(), "See on test lause");
        assert_eq!(identifiers(&accepted), vec!["w1", "w2", "w42", "w4"]);
        assert_eq!(accepted.words()[2].word.attrs.timecode_start, 12.5);
        assert!(pending_suggestions(&accepted).is_empty());
    }

    #[test]
    fn test_reject_deletion() {
        let doc = annotate(&sample(), "testt", "test");
        let rejected = resolve(&doc, 0, Decision::Reject);
        assert_eq!(
            DocumentDisplay::new(&rejected).to_string(),
            "[Mari] See on testt lause"
        );
        // runs merge back together once unmarked
        assert_eq!(rejected.words()[2].word.content.len(), 1);
    }

    #[test]
    fn test_insertion_decisions() {
        let doc = annotate(&sample(), "lause", "lauset");
        assert_eq!(resolve(&doc, 0, Decision::Accept).plain_text(), "See on testt lauset");
        assert_eq!(resolve(&doc, 0, Decision::Reject).plain_text(), "See on testt lause");
    }

    #[test]
    fn test_replacement_pair() {
        let doc = annotate(&sample(), "on", "oli");
        let both = build_batch_resolution(
            &doc,
            &SuggestionLedger::new(),
            &[SuggestionId::new(0), SuggestionId::new(1)],
            Decision::Accept,
        )
        .unwrap();
        assert_eq!(
            both.resolved,
            vec![
                (SuggestionId::new(1), SuggestionState::Accepted),
                (SuggestionId::new(0), SuggestionState::Accepted),
            ]
        );
        let accepted = both.transaction.apply(&doc).unwrap();
        assert_eq!(accepted.plain_text(), "See oli testt lause");
        assert_eq!(identifiers(&accepted), vec!["w1", "w2", "w42", "w4"]);
    }

    #[test]
    fn test_accepting_whole_word_deletion_removes_word() {
        let doc = annotate(&sample(), "on testt", "testt");
        let span = find_suggestion(&doc, &SuggestionId::new(0)).unwrap();
        assert_eq!(span.text, "on ");
        assert_eq!(span.segments, vec![(8, 10), (11, 12)]);

        let accepted = resolve(&doc, 0, Decision::Accept);
        assert_eq!(accepted.plain_text(), "See testt lause");
        assert_eq!(identifiers(&accepted), vec!["w1", "w42", "w4"]);
        assert!(accepted.retired_identifiers().contains("w2"));
    }

    #[test]
    fn test_batch_across_blocks() {
        let doc = Document::new(vec![
            Block::with_words(
                BlockAttrs::new("Mari", "spk-1"),
                vec![Word::new("w1", 0.0, "kalla"), Word::new("w2", 0.5, "jah")],
            ),
            Block::with_words(BlockAttrs::new("Jaan", "spk-2"), vec![Word::new("w3", 1.0, "tere")]),
        ])
        .unwrap();
        let doc = annotate(&doc, "kalla", "kala");
        let doc = annotate(&doc, "tere", "tere!");
        let pending: Vec<SuggestionId> = pending_suggestions(&doc).into_iter().map(|s| s.id).collect();
        assert_eq!(pending, vec![SuggestionId::new(0), SuggestionId::new(1)]);

        let rejected = build_batch_resolution(&doc, &SuggestionLedger::new(), &pending, Decision::Reject)
            .unwrap()
            .transaction
            .apply(&doc)
            .unwrap();
        assert_eq!(rejected.plain_text(), "kalla jah\ntere");

        let accepted = build_batch_resolution(&doc, &SuggestionLedger::new(), &pending, Decision::Accept)
            .unwrap()
            .transaction
            .apply(&doc)
            .unwrap();
        assert_eq!(accepted.plain_text(), "kala jah\ntere!");
    }

    #[test]
    fn test_ledger_state_machine() {
        let doc = annotate(&sample(), "testt", "test");
        let id = SuggestionId::new(0);
        let mut ledger = SuggestionLedger::new();
        ledger.track(id.clone());
        assert_eq!(ledger.state(&id), Some(SuggestionState::Pending));

        let resolution = build_resolution(&doc, &ledger, &id, Decision::Accept).unwrap();
        assert_eq!(ledger.resolve(&id, Decision::Accept), Ok(SuggestionState::Accepted));
        let accepted = resolution.transaction.apply(&doc).unwrap();

        assert_eq!(
            build_resolution(&accepted, &ledger, &id, Decision::Accept).unwrap_err(),
            ResolveError::AlreadyResolved {
                id: id.clone(),
                state: SuggestionState::Accepted
            }
        );
        assert_eq!(
            ledger.resolve(&id, Decision::Reject),
            Err(ResolveError::AlreadyResolved {
                id: id.clone(),
                state: SuggestionState::Accepted
            })
        );
        assert_eq!(ledger.count(SuggestionState::Accepted), 1);
    }

    #[test]
    fn test_unknown_suggestion() {
        let doc = sample();
        assert_eq!(
            build_resolution(&doc, &SuggestionLedger::new(), &SuggestionId::new(3), Decision::Reject)
                .unwrap_err(),
            ResolveError::UnknownSuggestion {
                id: SuggestionId::new(3)
            }
        );
    }
}
