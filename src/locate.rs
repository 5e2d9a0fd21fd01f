//! Text location over the logical text of a document.
//!
//! Matching runs block by block over the concatenated text of each block, so
//! a match may span several words but never two blocks. Block edges count as
//! word boundaries.

use crate::document::{Document, TextUnit};
use crate::errors::LocateError;
use crate::text::{fold_char, grapheme_boundaries, is_word_char};
use serde::{Deserialize, Serialize};

/// Restricts where [`locate`] searches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Only chars with `from <= pos < to`.
    Range { from: usize, to: usize },
    /// Only the block at this index.
    Block(usize),
    /// Only blocks whose speaker name or speaker id equals this value.
    Speaker(String),
}

/// Search options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocateOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub scope: Option<Scope>,
}

impl LocateOptions {
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn whole_word(mut self) -> Self {
        self.whole_word = true;
        self
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }
}

/// A located range of document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMatch {
    pub from: usize,
    pub to: usize,
    /// The matched text as it appears in the document.
    pub text: String,
    /// Document version the range was computed against.
    pub version: u64,
}

impl TextMatch {
    /// Whether the match still addresses the same text in `doc`.
    pub fn is_current(&self, doc: &Document) -> bool {
        self.version == doc.version() && doc.text_between(self.from, self.to, "") == self.text
    }
}

/// Find every non-overlapping occurrence of `search`, left to right.
///
/// An empty `search` or an unknown speaker yields no matches. Only an invalid
/// scope range or block index is an error.
pub fn locate(doc: &Document, search: &str, options: &LocateOptions) -> Result<Vec<TextMatch>, LocateError> {
    let (from, to) = scope_bounds(doc, options.scope.as_ref())?;
    let fold = |ch: char| if options.case_sensitive { ch } else { fold_char(ch) };
    let needle: Vec<char> = search.chars().map(fold).collect();
    if needle.is_empty() {
        return Ok(Vec::new());
    }

    let units = doc.text_units();
    let mut matches = Vec::new();
    for group in blocks_of(&units) {
        let block = group[0].block;
        if !block_in_scope(doc, block, options.scope.as_ref()) {
            continue;
        }
        let chars: Vec<char> = group.iter().map(|unit| unit.ch).collect();
        let folded: Vec<char> = chars.iter().copied().map(fold).collect();
        let boundaries = grapheme_boundaries(&chars);
        let lo = group.iter().position(|unit| unit.pos >= from).unwrap_or(group.len());
        let hi = group.iter().rposition(|unit| unit.pos < to).map_or(0, |i| i + 1);

        let mut i = lo;
        while i + needle.len() <= hi {
            let j = i + needle.len();
            let accepted = folded[i..j] == needle[..]
                && boundaries[i]
                && boundaries[j]
                && (!options.whole_word || is_whole_word(&chars, i, j));
            if accepted {
                matches.push(TextMatch {
                    from: group[i].pos,
                    to: group[j - 1].pos + 1,
                    text: chars[i..j].iter().collect(),
                    version: doc.version(),
                });
                i = j;
            } else {
                i += 1;
            }
        }
    }
    tracing::trace!(search, found = matches.len(), "located");
    Ok(matches)
}

/// The occurrence of `search` closest to `near`, at most `radius` positions
/// away. Ties go to the earlier match.
pub fn locate_near(
    doc: &Document,
    search: &str,
    near: usize,
    radius: usize,
    options: &LocateOptions,
) -> Result<Option<TextMatch>, LocateError> {
    let distance = |m: &TextMatch| {
        if near < m.from {
            m.from - near
        } else if near > m.to {
            near - m.to
        } else {
            0
        }
    };
    Ok(locate(doc, search, options)?
        .into_iter()
        .filter(|m| distance(m) <= radius)
        .min_by_key(distance))
}

fn scope_bounds(doc: &Document, scope: Option<&Scope>) -> Result<(usize, usize), LocateError> {
    let size = doc.size();
    match scope {
        Some(&Scope::Range { from, to }) => {
            if from > to || to > size {
                return Err(LocateError::InvalidRange { from, to, size });
            }
            Ok((from, to))
        }
        Some(&Scope::Block(index)) => {
            let count = doc.blocks().len();
            if index >= count {
                return Err(LocateError::UnknownBlock { index, count });
            }
            Ok((0, size))
        }
        Some(Scope::Speaker(_)) | None => Ok((0, size)),
    }
}

fn block_in_scope(doc: &Document, block: usize, scope: Option<&Scope>) -> bool {
    match scope {
        Some(&Scope::Block(index)) => index == block,
        Some(Scope::Speaker(speaker)) => doc
            .block(block)
            .map(|b| &b.attrs.speaker_name == speaker || &b.attrs.speaker_id == speaker)
            .unwrap_or(false),
        Some(Scope::Range { .. }) | None => true,
    }
}

fn is_whole_word(chars: &[char], start: usize, end: usize) -> bool {
    let before = start.checked_sub(1).map(|i| chars[i]);
    let after = chars.get(end).copied();
    !before.map_or(false, is_word_char) && !after.map_or(false, is_word_char)
}

/// Split text units into per-block groups.
fn blocks_of<'u, 'd>(units: &'u [TextUnit<'d>]) -> Vec<&'u [TextUnit<'d>]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..=units.len() {
        if i == units.len() || units[i].block != units[start].block {
            if start < i {
                groups.push(&units[start..i]);
            }
            start = i;
        }
    }
    groups
}
