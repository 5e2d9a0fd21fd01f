//! Transcript document model.
//!
//! A [`Document`] is an ordered list of speaker [`Block`]s. Each block holds
//! [`Word`] nodes carrying a start timecode and a stable identifier, with
//! plain text runs (usually single spaces) between them.
//!
//! # Positions
//!
//! Positions are integer offsets in document order, one unit per `char`.
//! Entering or leaving a block or a word consumes one unit, so a block's size
//! is `2 + content size` and a word's size is `2 + text length`. Position 0
//! is before the first block.
//!
//! ```text
//!  0   1   2   3   4   5   6   7   8   9   10  11
//!  <b> <w> T   e   r   e   </w>' ' <w> . . .
//! ```

mod edit;
mod mark;
mod position;

pub(crate) use edit::{map_marks_in_runs, normalize_inlines, normalize_runs, replace_inlines, replace_runs};
pub use mark::{AnnotationMark, Mark, MarkSet, SuggestionId, SuggestionKind, SuggestionMark};
pub use position::{Parent, ResolvedPos, TextUnit, WordRef};

use crate::errors::DocumentError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// A run of text sharing one mark set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "MarkSet::is_empty")]
    pub marks: MarkSet,
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: MarkSet::new(),
        }
    }

    pub fn with_marks(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    /// Size in positions (one per `char`).
    pub fn size(&self) -> usize {
        self.text.chars().count()
    }
}

/// Attributes of a time-aligned word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordAttrs {
    /// Start time in seconds.
    pub timecode_start: f64,
    pub identifier: String,
}

/// A time-aligned word node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub attrs: WordAttrs,
    #[serde(default)]
    pub content: Vec<TextRun>,
}

impl Word {
    pub fn new(identifier: impl Into<String>, timecode_start: f64, text: impl Into<String>) -> Self {
        let text = text.into();
        let content = if text.is_empty() {
            Vec::new()
        } else {
            vec![TextRun::new(text)]
        };
        Self {
            attrs: WordAttrs {
                timecode_start,
                identifier: identifier.into(),
            },
            content,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.attrs.identifier
    }

    pub fn text(&self) -> String {
        self.content.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn content_size(&self) -> usize {
        self.content.iter().map(TextRun::size).sum()
    }

    pub fn size(&self) -> usize {
        2 + self.content_size()
    }
}

/// Child of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inline {
    Word(Word),
    Text(TextRun),
}

impl Inline {
    pub fn size(&self) -> usize {
        match self {
            Inline::Word(word) => word.size(),
            Inline::Text(run) => run.size(),
        }
    }

    pub fn as_word(&self) -> Option<&Word> {
        match self {
            Inline::Word(word) => Some(word),
            Inline::Text(_) => None,
        }
    }
}

/// Speaker attributes of a block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockAttrs {
    pub speaker_name: String,
    #[serde(default)]
    pub speaker_id: String,
    #[serde(default)]
    pub topic: String,
}

impl BlockAttrs {
    pub fn new(speaker_name: impl Into<String>, speaker_id: impl Into<String>) -> Self {
        Self {
            speaker_name: speaker_name.into(),
            speaker_id: speaker_id.into(),
            topic: String::new(),
        }
    }
}

/// One speaker turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub attrs: BlockAttrs,
    #[serde(default)]
    pub content: Vec<Inline>,
}

impl Block {
    pub fn new(attrs: BlockAttrs) -> Self {
        Self {
            attrs,
            content: Vec::new(),
        }
    }

    /// Build a block from words, separated by single spaces.
    pub fn with_words(attrs: BlockAttrs, words: impl IntoIterator<Item = Word>) -> Self {
        let mut block = Self::new(attrs);
        for word in words {
            block.push_word(word);
        }
        block
    }

    /// Append a word, inserting a separating space when the block is not empty.
    pub fn push_word(&mut self, word: Word) {
        if !self.content.is_empty() {
            self.content.push(Inline::Text(TextRun::new(" ")));
        }
        self.content.push(Inline::Word(word));
    }

    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.content.iter().filter_map(Inline::as_word)
    }

    pub fn content_size(&self) -> usize {
        self.content.iter().map(Inline::size).sum()
    }

    pub fn size(&self) -> usize {
        2 + self.content_size()
    }

    pub fn text(&self) -> String {
        let mut text = String::new();
        for inline in &self.content {
            match inline {
                Inline::Word(word) => {
                    for run in &word.content {
                        text.push_str(&run.text);
                    }
                }
                Inline::Text(run) => text.push_str(&run.text),
            }
        }
        text
    }
}

/// A versioned transcript document.
///
/// Every committed transaction increments `version` by exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    blocks: Vec<Block>,
    #[serde(default)]
    version: u64,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    retired_identifiers: BTreeSet<String>,
}

impl Document {
    /// Create a document at version 0.
    pub fn new(blocks: Vec<Block>) -> Result<Self, DocumentError> {
        let mut doc = Self {
            blocks,
            version: 0,
            retired_identifiers: BTreeSet::new(),
        };
        doc.normalize();
        doc.validate()?;
        Ok(doc)
    }

    /// Load the persisted JSON shape.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let mut doc: Document = serde_json::from_str(json)?;
        doc.normalize();
        doc.validate()?;
        Ok(doc)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check identifier uniqueness and that no retired identifier came back.
    pub fn validate(&self) -> Result<(), DocumentError> {
        let mut seen = HashSet::new();
        for word in self.blocks.iter().flat_map(Block::words) {
            let identifier = word.identifier();
            if self.retired_identifiers.contains(identifier) {
                return Err(DocumentError::RetiredIdentifier {
                    identifier: identifier.to_string(),
                });
            }
            if !seen.insert(identifier) {
                return Err(DocumentError::DuplicateIdentifier {
                    identifier: identifier.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn retired_identifiers(&self) -> &BTreeSet<String> {
        &self.retired_identifiers
    }

    pub fn size(&self) -> usize {
        self.blocks.iter().map(Block::size).sum()
    }

    /// Position just before the block at `index`.
    pub fn block_start(&self, index: usize) -> Option<usize> {
        if index >= self.blocks.len() {
            return None;
        }
        Some(self.blocks[..index].iter().map(Block::size).sum())
    }

    pub fn block_text(&self, index: usize) -> Option<String> {
        self.blocks.get(index).map(Block::text)
    }

    /// All block texts joined by newlines.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text of every unit in `from..to`, with `block_separator` between blocks.
    pub fn text_between(&self, from: usize, to: usize, block_separator: &str) -> String {
        let mut text = String::new();
        let mut last_block = None;
        for unit in self.text_units() {
            if unit.pos < from || unit.pos >= to {
                continue;
            }
            if matches!(last_block, Some(block) if block != unit.block) {
                text.push_str(block_separator);
            }
            last_block = Some(unit.block);
            text.push(unit.ch);
        }
        text
    }

    /// Whether any word currently uses `identifier`.
    pub fn has_identifier(&self, identifier: &str) -> bool {
        self.blocks
            .iter()
            .flat_map(Block::words)
            .any(|word| word.identifier() == identifier)
    }

    /// `snapshot` brought back as the version after this one.
    ///
    /// Identifiers retired since the snapshot stay retired unless the
    /// snapshot still holds their word.
    pub fn restored(&self, snapshot: &Document) -> Document {
        let mut doc = snapshot.clone();
        for identifier in &self.retired_identifiers {
            if !snapshot.has_identifier(identifier) {
                doc.retired_identifiers.insert(identifier.clone());
            }
        }
        doc.version = self.version + 1;
        doc
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    pub(crate) fn retire(&mut self, identifier: String) {
        self.retired_identifiers.insert(identifier);
    }

    fn normalize(&mut self) {
        for block in &mut self.blocks {
            normalize_inlines(&mut block.content);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::new(vec![
            Block::with_words(
                BlockAttrs::new("Mari", "spk-1"),
                vec![Word::new("w1", 0.0, "Tere"), Word::new("w2", 0.5, "maailm")],
            ),
            Block::with_words(BlockAttrs::new("Jaan", "spk-2"), vec![Word::new("w3", 1.2, "Tšau")]),
        ])
        .unwrap()
    }

    #[test]
    fn test_sizes() {
        let doc = sample();
        // block 0: 2 + (6 + 1 + 8) = 17, block 1: 2 + 6 = 8
        assert_eq!(doc.blocks()[0].size(), 17);
        assert_eq!(doc.blocks()[1].size(), 8);
        assert_eq!(doc.size(), 25);
        assert_eq!(doc.block_start(1), Some(17));
        assert_eq!(doc.block_start(2), None);
    }

    #[test]
    fn test_text_between() {
        let doc = sample();
        assert_eq!(doc.plain_text(), "Tere maailm\nTšau");
        assert_eq!(doc.text_between(0, doc.size(), " | "), "Tere maailm | Tšau");
        assert_eq!(doc.text_between(2, 6, ""), "Tere");
        assert_eq!(doc.text_between(6, 10, ""), " m");
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let result = Document::new(vec![Block::with_words(
            BlockAttrs::new("Mari", "spk-1"),
            vec![Word::new("w1", 0.0, "üks"), Word::new("w1", 0.4, "kaks")],
        )]);
        assert!(matches!(
            result,
            Err(DocumentError::DuplicateIdentifier { identifier }) if identifier == "w1"
        ));
    }

    #[test]
    fn test_json_shape() {
        let doc = Document::new(vec![Block::with_words(
            BlockAttrs::new("Mari", "spk-1"),
            vec![Word::new("w1", 0.25, "Tere")],
        )])
        .unwrap();
        let json = doc.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"blocks":[{"attrs":{"speakerName":"Mari","speakerId":"spk-1","topic":""},"content":[{"type":"word","attrs":{"timecodeStart":0.25,"identifier":"w1"},"content":[{"text":"Tere"}]}]}],"version":0}"#
        );
        assert_eq!(Document::from_json(&json).unwrap(), doc);
    }

    #[test]
    fn test_from_json_merges_runs() {
        let json = r#"{"blocks":[{"attrs":{"speakerName":"Mari"},"content":[
            {"type":"word","attrs":{"timecodeStart":0.0,"identifier":"w1"},"content":[{"text":"Te"},{"text":""},{"text":"re"}]},
            {"type":"text","text":" "},{"type":"text","text":" "}
        ]}]}"#;
        let doc = Document::from_json(json).unwrap();
        let block = &doc.blocks()[0];
        assert_eq!(block.content.len(), 2);
        assert_eq!(block.words().next().map(|w| w.content.len()), Some(1));
        assert_eq!(block.text(), "Tere  ");
        assert_eq!(block.attrs.speaker_id, "");
    }

    #[test]
    fn test_restored_snapshot() {
        let snapshot = sample();
        let mut current = snapshot.clone();
        current.retire("w2".to_string());
        current.retire("w9".to_string());
        current.set_version(4);

        let restored = current.restored(&snapshot);
        assert_eq!(restored.version(), 5);
        assert_eq!(restored.plain_text(), snapshot.plain_text());
        assert_eq!(
            restored.retired_identifiers().iter().collect::<Vec<_>>(),
            vec!["w9"]
        );
        assert!(restored.validate().is_ok());
    }
}
