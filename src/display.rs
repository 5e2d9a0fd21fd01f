use crate::document::{Document, SuggestionId, SuggestionKind};
use std::fmt::Write;
use unicode_width::UnicodeWidthStr;

/// Renders a document one block per line, with pending suggestions inline.
///
/// ```text
/// [Mari] See on tes[-t-]t lause{+!+}
///                    ╰Deletion(sg-0)
///                                ╰Insertion(sg-1)
/// ```
pub struct DocumentDisplay<'a> {
    doc: &'a Document,
    show_suggestions: bool,
    show_words: bool,
}

struct SuggestionSpan {
    start_col: usize,
    end_col: usize,
    label: String,
}

impl<'a> DocumentDisplay<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            show_suggestions: false,
            show_words: false,
        }
    }

    /// Underline every pending suggestion with its kind and id.
    pub fn with_suggestions(mut self) -> Self {
        self.show_suggestions = true;
        self
    }

    /// List each word's identifier and start time under its block.
    pub fn with_words(mut self) -> Self {
        self.show_words = true;
        self
    }
}

fn markers(kind: SuggestionKind) -> (&'static str, &'static str) {
    match kind {
        SuggestionKind::Insertion => ("{+", "+}"),
        SuggestionKind::Deletion => ("[-", "-]"),
    }
}

impl<'a> std::fmt::Display for DocumentDisplay<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let units = self.doc.text_units();
        for (block_index, block) in self.doc.blocks().iter().enumerate() {
            if block_index > 0 {
                f.write_char('\n')?;
            }

            let mut line = format!("[{}] ", block.attrs.speaker_name);
            let mut spans = Vec::new();
            let mut open: Option<(&SuggestionId, SuggestionKind, usize)> = None;
            for unit in units.iter().filter(|unit| unit.block == block_index) {
                let current = unit.marks.suggestion();
                if open.map(|(id, _, _)| id) != current.map(|s| &s.id) {
                    if let Some((id, kind, start_col)) = open.take() {
                        spans.push(SuggestionSpan {
                            start_col,
                            end_col: UnicodeWidthStr::width(line.as_str()),
                            label: format!("{}({})", kind, id),
                        });
                        line.push_str(markers(kind).1);
                    }
                    if let Some(suggestion) = current {
                        line.push_str(markers(suggestion.kind).0);
                        open = Some((
                            &suggestion.id,
                            suggestion.kind,
                            UnicodeWidthStr::width(line.as_str()),
                        ));
                    }
                }
                line.push(unit.ch);
            }
            if let Some((id, kind, start_col)) = open.take() {
                spans.push(SuggestionSpan {
                    start_col,
                    end_col: UnicodeWidthStr::width(line.as_str()),
                    label: format!("{}({})", kind, id),
                });
                line.push_str(markers(kind).1);
            }
            f.write_str(&line)?;

            if self.show_suggestions {
                for span in &spans {
                    f.write_char('\n')?;
                    for _ in 0..span.start_col {
                        f.write_char(' ')?;
                    }
                    f.write_char('╰')?;
                    let char_len = span.end_col - span.start_col;
                    for _ in (span.start_col + 1)..span.end_col.saturating_sub(1) {
                        f.write_char('─')?;
                    }
                    if char_len > 1 {
                        f.write_char('╯')?;
                    }
                    f.write_str(&span.label)?;
                }
            }

            if self.show_words {
                f.write_str("\n ")?;
                for word in block.words() {
                    write!(f, " {}@{:.2}", word.identifier(), word.attrs.timecode_start)?;
                }
            }
        }
        Ok(())
    }
}
