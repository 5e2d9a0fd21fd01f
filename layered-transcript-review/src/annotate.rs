//! Turning an edit script into pending suggestion marks.
//!
//! Annotation never changes committed text. DELETE operations mark existing
//! characters as pending deletions; INSERT operations add new text that is
//! marked as a pending insertion. Word nodes, their identifiers and
//! timecodes, and unrelated marks all survive untouched, so the transcript
//! stays aligned with its audio until a reviewer accepts a change.

use crate::diff::{EditKind, EditScript};
use crate::errors::AnnotateError;
use layered_transcript::{
    Assoc, Document, Mark, Step, SuggestionId, SuggestionKind, SuggestionMark, TextMatch, TextRun,
    TextUnit, Transaction,
};

/// Reason and confidence shared by every suggestion of one correction.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionMetadata {
    pub reason: String,
    /// Confidence from 0.0 to 1.0
    pub confidence: f64,
}

impl SuggestionMetadata {
    pub fn new(reason: impl Into<String>, confidence: f64) -> Self {
        Self {
            reason: reason.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Allocates suggestion IDs (`sg-0`, `sg-1`, ...). An allocator never hands
/// out the same ID twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionIds {
    next: u64,
}

impl SuggestionIds {
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// An allocator that continues after every suggestion already in `doc`.
    pub fn for_document(doc: &Document) -> Self {
        let mut ids = Self::default();
        for unit in doc.text_units() {
            if let Some(suggestion) = unit.marks.suggestion() {
                ids.reserve(&suggestion.id);
            }
        }
        ids
    }

    /// Make sure `id` is never allocated.
    pub fn reserve(&mut self, id: &SuggestionId) {
        if let Some(index) = id.index() {
            self.next = self.next.max(index + 1);
        }
    }

    pub fn next_id(&mut self) -> SuggestionId {
        let id = SuggestionId::new(self.next);
        self.next += 1;
        id
    }
}

/// A built, not yet committed, annotation.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub transaction: Transaction,
    /// Created suggestions, one per non-empty INSERT or DELETE, in script order.
    pub suggestions: Vec<SuggestionId>,
}

/// Build the transaction that annotates `m` with `script`.
///
/// `m` must have been located in `doc` at its current version, and the
/// script's original text must equal `m.text`. Text that already carries a
/// pending suggestion is never annotated again.
pub fn build_annotation(
    doc: &Document,
    m: &TextMatch,
    script: &EditScript,
    metadata: &SuggestionMetadata,
    ids: &mut SuggestionIds,
) -> Result<Annotation, AnnotateError> {
    let stale = || AnnotateError::StaleMatch {
        match_text: m.text.clone(),
        match_version: m.version,
        document_version: doc.version(),
    };
    if m.version != doc.version() {
        return Err(stale());
    }
    let units: Vec<TextUnit<'_>> = doc
        .text_units()
        .into_iter()
        .filter(|unit| unit.pos >= m.from && unit.pos < m.to)
        .collect();
    if units.iter().map(|unit| unit.ch).collect::<String>() != m.text {
        return Err(stale());
    }
    script.validate(&m.text, &script.target_text())?;
    if units.is_empty() {
        return Err(AnnotateError::EmptyMatch { from: m.from, to: m.to });
    }
    if let Some(existing) = units.iter().find_map(|unit| unit.marks.suggestion()) {
        return Err(AnnotateError::OverlapsPendingSuggestion {
            id: existing.id.clone(),
        });
    }

    let mut tr = Transaction::new(doc);
    let mut created = Vec::new();
    let mut cursor = 0;
    for op in script.ops() {
        let len = op.char_len();
        if len == 0 {
            continue;
        }
        match op.kind {
            EditKind::Equal => cursor += len,
            EditKind::Delete => {
                let from = tr.map(units[cursor].pos, Assoc::After);
                let to = tr.map(units[cursor + len - 1].pos + 1, Assoc::Before);
                let id = ids.next_id();
                tr.step(Step::AddMark {
                    from,
                    to,
                    mark: suggestion_mark(&id, SuggestionKind::Deletion, metadata),
                })?;
                created.push(id);
                cursor += len;
            }
            EditKind::Insert => {
                // after the previous original char, or before the first one
                let (anchor, neighbour) = match cursor.checked_sub(1) {
                    Some(prev) => (units[prev].pos + 1, units[prev].marks),
                    None => (units[0].pos, units[0].marks),
                };
                let pos = tr.map(anchor, Assoc::After);
                let id = ids.next_id();
                let marks = neighbour
                    .without_suggestions()
                    .with(suggestion_mark(&id, SuggestionKind::Insertion, metadata));
                tr.step(Step::Replace {
                    from: pos,
                    to: pos,
                    slice: vec![TextRun::with_marks(op.text.clone(), marks)],
                })?;
                created.push(id);
            }
        }
    }

    tracing::debug!(
        from = m.from,
        to = m.to,
        suggestions = created.len(),
        "annotation built"
    );
    Ok(Annotation {
        transaction: tr,
        suggestions: created,
    })
}

fn suggestion_mark(id: &SuggestionId, kind: SuggestionKind, metadata: &SuggestionMetadata) -> Mark {
    Mark::Suggestion(SuggestionMark::new(
        id.clone(),
        kind,
        metadata.reason.clone(),
        metadata.confidence,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{diff_semantic, EditOp};
    use layered_transcript::{
        locate, AnnotationMark, Block, BlockAttrs, DocumentDisplay, LocateOptions, Word,
    };

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

    fn find(doc: &Document, search: &str) -> TextMatch {
        locate(doc, search, &LocateOptions::default()).unwrap().remove(0)
    }

    fn annotate(doc: &Document, search: &str, corrected: &str) -> (Document, Vec<SuggestionId>) {
        let m = find(doc, search);
        let script = diff_semantic(&m.text, corrected);
        let mut ids = SuggestionIds::for_document(doc);
        let annotation = build_annotation(
            doc,
            &m,
            &script,
            &SuggestionMetadata::new("spelling", 0.9),
            &mut ids,
        )
        .unwrap();
        (annotation.transaction.apply(doc).unwrap(), annotation.suggestions)
    }

    #[test]
    fn test_single_deletion() {
        let doc = sample();
        let (next, suggestions) = annotate(&doc, "testt", "test");
        assert_eq!(suggestions, vec![SuggestionId::new(0)]);
        assert_eq!(
            DocumentDisplay::new(&next).to_string(),
            "[Mari] See on tes[-t-]t lause"
        );
        // committed text is unchanged until review
        assert_eq!(next.plain_text(), "See on testt lause");
        assert_eq!(next.version(), 1);
        let word = next.words()[2].word;
        assert_eq!(word.identifier(), "w42");
        assert_eq!(word.attrs.timecode_start, 12.5);
    }

    #[test]
    fn test_replacement_is_two_suggestions() {
        let doc = sample();
        let (next, suggestions) = annotate(&doc, "lause", "lauset");
        assert_eq!(suggestions.len(), 1);
        assert_eq!(
            DocumentDisplay::new(&next).to_string(),
            "[Mari] See on testt lause{+t+}"
        );

        let (next, suggestions) = annotate(&next, "on", "oli");
        assert_eq!(suggestions, vec![SuggestionId::new(1), SuggestionId::new(2)]);
        assert_eq!(
            DocumentDisplay::new(&next).to_string(),
            "[Mari] See o[-n-]{+li+} testt lause{+t+}"
        );
        assert_eq!(next.words().len(), 4);
    }

    #[test]
    fn test_insert_at_match_start() {
        let doc = sample();
        let (next, _) = annotate(&doc, "lause", "ülause");
        assert_eq!(
            DocumentDisplay::new(&next).to_string(),
            "[Mari] See on testt {+ü+}lause"
        );
        let word = next.words()[3].word;
        assert_eq!(word.identifier(), "w4");
        assert_eq!(word.text(), "ülause");
    }

    #[test]
    fn test_insertion_inherits_neighbour_marks() {
        let doc = sample();
        let label = Mark::Label(AnnotationMark::new("term"));
        let m = find(&doc, "lause");
        let mut tr = Transaction::new(&doc);
        tr.step(Step::AddMark {
            from: m.from,
            to: m.to,
            mark: label.clone(),
        })
        .unwrap();
        let labelled = tr.apply(&doc).unwrap();

        let (next, _) = annotate(&labelled, "lause", "lause!");
        let units = next.text_units();
        let bang = units.iter().find(|unit| unit.ch == '!').unwrap();
        assert!(bang.marks.contains(&label));
        assert_eq!(
            bang.marks.suggestion().map(|s| s.kind),
            Some(SuggestionKind::Insertion)
        );
        assert_eq!(bang.marks.suggestion().map(|s| s.reason.as_str()), Some("spelling"));
    }

    #[test]
    fn test_deletion_across_words() {
        let doc = sample();
        let (next, suggestions) = annotate(&doc, "See on", "See");
        assert_eq!(suggestions.len(), 1);
        assert_eq!(
            DocumentDisplay::new(&next).to_string(),
            "[Mari] See[- on-] testt lause"
        );
        assert_eq!(next.words().len(), 4);
    }

    #[test]
    fn test_stale_match() {
        let doc = sample();
        let m = find(&doc, "testt");
        let (next, _) = annotate(&doc, "lause", "lauset");
        let script = diff_semantic("testt", "test");
        let err = build_annotation(
            &next,
            &m,
            &script,
            &SuggestionMetadata::new("", 1.0),
            &mut SuggestionIds::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            AnnotateError::StaleMatch {
                match_text: "testt".into(),
                match_version: 0,
                document_version: 1,
            }
        );

        let wrong = TextMatch {
            text: "tesst".into(),
            ..m
        };
        assert!(matches!(
            build_annotation(
                &doc,
                &wrong,
                &script,
                &SuggestionMetadata::new("", 1.0),
                &mut SuggestionIds::default()
            ),
            Err(AnnotateError::StaleMatch { .. })
        ));
    }

    #[test]
    fn test_malformed_script() {
        let doc = sample();
        let m = find(&doc, "testt");
        let script = EditScript::new(vec![EditOp::equal("tes"), EditOp::insert("x")]);
        assert!(matches!(
            build_annotation(
                &doc,
                &m,
                &script,
                &SuggestionMetadata::new("", 1.0),
                &mut SuggestionIds::default()
            ),
            Err(AnnotateError::MalformedEditScript(_))
        ));
    }

    #[test]
    fn test_refuses_pending_text() {
        let doc = sample();
        let (next, _) = annotate(&doc, "testt", "test");
        let m = find(&next, "testt lause");
        let script = diff_semantic(&m.text, "test lause");
        let mut ids = SuggestionIds::for_document(&next);
        assert_eq!(
            build_annotation(&next, &m, &script, &SuggestionMetadata::new("", 1.0), &mut ids)
                .unwrap_err(),
            AnnotateError::OverlapsPendingSuggestion {
                id: SuggestionId::new(0)
            }
        );
        assert_eq!(ids.next_id(), SuggestionId::new(1));
    }

    #[test]
    fn test_ids_resume_after_loaded_suggestions() {
        let doc = sample();
        let (next, _) = annotate(&doc, "on", "oli");
        let mut ids = SuggestionIds::for_document(&next);
        assert_eq!(ids.next_id(), SuggestionId::new(2));
        ids.reserve(&SuggestionId::new(9));
        assert_eq!(ids.next_id(), SuggestionId::new(10));
    }
}
