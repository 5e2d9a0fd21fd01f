//! Low-level run and inline list surgery used by steps.
//!
//! Every helper leaves its output normalized: no empty runs, and no two
//! adjacent runs with identical mark sets.

use super::{Inline, MarkSet, TextRun, Word};

pub(crate) fn normalize_runs(runs: &mut Vec<TextRun>) {
    let mut merged: Vec<TextRun> = Vec::with_capacity(runs.len());
    for run in runs.drain(..) {
        if run.text.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.marks == run.marks => last.text.push_str(&run.text),
            _ => merged.push(run),
        }
    }
    *runs = merged;
}

pub(crate) fn normalize_inlines(content: &mut Vec<Inline>) {
    let mut merged: Vec<Inline> = Vec::with_capacity(content.len());
    for inline in content.drain(..) {
        match inline {
            Inline::Text(run) => {
                if run.text.is_empty() {
                    continue;
                }
                match merged.last_mut() {
                    Some(Inline::Text(last)) if last.marks == run.marks => {
                        last.text.push_str(&run.text)
                    }
                    _ => merged.push(Inline::Text(run)),
                }
            }
            Inline::Word(mut word) => {
                normalize_runs(&mut word.content);
                merged.push(Inline::Word(word));
            }
        }
    }
    *content = merged;
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// Split runs at a char offset.
fn split_runs(runs: &[TextRun], at: usize) -> (Vec<TextRun>, Vec<TextRun>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut offset = 0;
    for run in runs {
        let size = run.size();
        if offset + size <= at {
            before.push(run.clone());
        } else if offset >= at {
            after.push(run.clone());
        } else {
            let (head, tail) = run.text.split_at(byte_offset(&run.text, at - offset));
            before.push(TextRun::with_marks(head, run.marks.clone()));
            after.push(TextRun::with_marks(tail, run.marks.clone()));
        }
        offset += size;
    }
    (before, after)
}

/// Replace the chars `from..to` of a run list with `slice`.
pub(crate) fn replace_runs(runs: &mut Vec<TextRun>, from: usize, to: usize, slice: &[TextRun]) {
    let (mut head, rest) = split_runs(runs, from);
    let (_, tail) = split_runs(&rest, to - from);
    head.extend(slice.iter().cloned());
    head.extend(tail);
    normalize_runs(&mut head);
    *runs = head;
}

/// Split an inline list at a content offset, or `None` if the offset falls
/// strictly inside a word.
fn split_inlines(content: &[Inline], at: usize) -> Option<(Vec<Inline>, Vec<Inline>)> {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut offset = 0;
    for inline in content {
        let size = inline.size();
        if offset + size <= at {
            before.push(inline.clone());
        } else if offset >= at {
            after.push(inline.clone());
        } else {
            match inline {
                Inline::Text(run) => {
                    let (head, tail) = split_runs(std::slice::from_ref(run), at - offset);
                    before.extend(head.into_iter().map(Inline::Text));
                    after.extend(tail.into_iter().map(Inline::Text));
                }
                Inline::Word(_) => return None,
            }
        }
        offset += size;
    }
    Some((before, after))
}

/// Replace the block-level range `from..to` with plain text runs.
///
/// Words entirely inside the range are removed and returned so their
/// identifiers can be retired. Returns `None` without touching `content` when
/// either end falls inside a word.
pub(crate) fn replace_inlines(
    content: &mut Vec<Inline>,
    from: usize,
    to: usize,
    slice: &[TextRun],
) -> Option<Vec<Word>> {
    let (mut head, rest) = split_inlines(content, from)?;
    let (removed, tail) = split_inlines(&rest, to - from)?;
    head.extend(slice.iter().cloned().map(Inline::Text));
    head.extend(tail);
    normalize_inlines(&mut head);
    *content = head;
    Some(
        removed
            .into_iter()
            .filter_map(|inline| match inline {
                Inline::Word(word) => Some(word),
                Inline::Text(_) => None,
            })
            .collect(),
    )
}

/// Rewrite the mark sets of the chars of `runs` that fall in `from..to`.
///
/// `start` is the position of the first char of `runs`.
pub(crate) fn map_marks_in_runs(
    runs: &mut Vec<TextRun>,
    start: usize,
    from: usize,
    to: usize,
    f: &dyn Fn(&MarkSet) -> MarkSet,
) {
    let mut out = Vec::with_capacity(runs.len());
    let mut pos = start;
    for run in runs.drain(..) {
        let size = run.size();
        let lo = from.max(pos);
        let hi = to.min(pos + size);
        if lo >= hi {
            out.push(run);
        } else {
            let (head, rest) = split_runs(std::slice::from_ref(&run), lo - pos);
            let (middle, tail) = split_runs(&rest, hi - lo);
            out.extend(head);
            out.extend(
                middle
                    .into_iter()
                    .map(|piece| TextRun::with_marks(piece.text, f(&piece.marks))),
            );
            out.extend(tail);
        }
        pos += size;
    }
    normalize_runs(&mut out);
    *runs = out;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{AnnotationMark, Mark};

    fn label() -> MarkSet {
        MarkSet::new().with(Mark::Label(AnnotationMark::new("x")))
    }

    #[test]
    fn test_replace_runs_inside_multibyte_text() {
        let mut runs = vec![TextRun::new("šõõr")];
        replace_runs(&mut runs, 1, 3, &[TextRun::new("aa")]);
        assert_eq!(runs, vec![TextRun::new("šaar")]);
    }

    #[test]
    fn test_replace_runs_keeps_marked_neighbours() {
        let mut runs = vec![TextRun::new("ab"), TextRun::with_marks("cd", label())];
        replace_runs(&mut runs, 2, 2, &[TextRun::new("X")]);
        assert_eq!(
            runs,
            vec![TextRun::new("abX"), TextRun::with_marks("cd", label())]
        );
    }

    #[test]
    fn test_replace_inlines_refuses_word_interior() {
        let mut content = vec![
            Inline::Word(Word::new("w1", 0.0, "see")),
            Inline::Text(TextRun::new(" ")),
        ];
        let before = content.clone();
        assert!(replace_inlines(&mut content, 1, 5, &[]).is_none());
        assert_eq!(content, before);
    }

    #[test]
    fn test_replace_inlines_returns_removed_words() {
        let mut content = vec![
            Inline::Word(Word::new("w1", 0.0, "see")),
            Inline::Text(TextRun::new(" ")),
            Inline::Word(Word::new("w2", 0.3, "on")),
        ];
        let removed = replace_inlines(&mut content, 5, 10, &[]).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].identifier(), "w2");
        assert_eq!(content.len(), 1);
    }

    #[test]
    fn test_map_marks_splits_runs() {
        let mut runs = vec![TextRun::new("kala")];
        map_marks_in_runs(&mut runs, 10, 11, 13, &|marks| {
            marks.with(Mark::Label(AnnotationMark::new("x")))
        });
        assert_eq!(
            runs,
            vec![
                TextRun::new("k"),
                TextRun::with_marks("al", label()),
                TextRun::new("a"),
            ]
        );
    }
}
