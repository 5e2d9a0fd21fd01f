use super::{Block, Document, Inline, MarkSet, Word};
use crate::errors::PositionError;

/// The node whose content a position points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    /// Between blocks.
    Document,
    /// Inline level of a block, between words.
    Block { block: usize },
    /// Inside the text of a word.
    Word { block: usize, inline: usize },
}

impl Parent {
    pub fn block(&self) -> Option<usize> {
        match *self {
            Parent::Document => None,
            Parent::Block { block } | Parent::Word { block, .. } => Some(block),
        }
    }
}

/// A position resolved into its innermost parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPos {
    pub pos: usize,
    pub parent: Parent,
    /// Offset into the parent's content.
    pub offset: usize,
    /// Position of the first content unit of the parent.
    pub content_start: usize,
}

/// One character of document text with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct TextUnit<'a> {
    pub pos: usize,
    pub ch: char,
    pub marks: &'a MarkSet,
    pub block: usize,
    /// Inline index of the enclosing word, if the char is word text.
    pub word: Option<usize>,
}

/// A word node together with its position.
#[derive(Debug, Clone, Copy)]
pub struct WordRef<'a> {
    /// Position just before the word.
    pub pos: usize,
    pub block: usize,
    pub inline: usize,
    pub word: &'a Word,
}

impl<'a> WordRef<'a> {
    /// Position range covering the word's text.
    pub fn content_range(&self) -> (usize, usize) {
        let start = self.pos + 1;
        (start, start + self.word.content_size())
    }
}

impl Document {
    /// Resolve `pos` into its innermost parent node.
    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos, PositionError> {
        let size = self.size();
        if pos > size {
            return Err(PositionError::OutOfRange { pos, size });
        }
        let mut start = 0;
        for (block_index, block) in self.blocks().iter().enumerate() {
            let end = start + block.size();
            if pos > start && pos < end {
                return Ok(resolve_in_block(block, block_index, start + 1, pos));
            }
            start = end;
        }
        Ok(ResolvedPos {
            pos,
            parent: Parent::Document,
            offset: pos,
            content_start: 0,
        })
    }

    /// Every character of the document in order.
    pub fn text_units(&self) -> Vec<TextUnit<'_>> {
        let mut units = Vec::with_capacity(self.size());
        let mut pos = 0;
        for (block_index, block) in self.blocks().iter().enumerate() {
            pos += 1;
            for (inline_index, inline) in block.content.iter().enumerate() {
                let (runs, word) = match inline {
                    Inline::Text(run) => (std::slice::from_ref(run), None),
                    Inline::Word(word) => {
                        pos += 1;
                        (word.content.as_slice(), Some(inline_index))
                    }
                };
                for run in runs {
                    for ch in run.text.chars() {
                        units.push(TextUnit {
                            pos,
                            ch,
                            marks: &run.marks,
                            block: block_index,
                            word,
                        });
                        pos += 1;
                    }
                }
                if word.is_some() {
                    pos += 1;
                }
            }
            pos += 1;
        }
        units
    }

    /// Every word node with its position, in document order.
    pub fn words(&self) -> Vec<WordRef<'_>> {
        let mut words = Vec::new();
        let mut pos = 0;
        for (block_index, block) in self.blocks().iter().enumerate() {
            pos += 1;
            for (inline_index, inline) in block.content.iter().enumerate() {
                if let Inline::Word(word) = inline {
                    words.push(WordRef {
                        pos,
                        block: block_index,
                        inline: inline_index,
                        word,
                    });
                }
                pos += inline.size();
            }
            pos += 1;
        }
        words
    }

    /// The word starting exactly at `pos`.
    pub fn word_at(&self, pos: usize) -> Option<WordRef<'_>> {
        self.words().into_iter().find(|word| word.pos == pos)
    }
}

fn resolve_in_block(block: &Block, block_index: usize, content_start: usize, pos: usize) -> ResolvedPos {
    let offset = pos - content_start;
    let mut child_start = 0;
    for (inline_index, inline) in block.content.iter().enumerate() {
        let child_end = child_start + inline.size();
        if let Inline::Word(_) = inline {
            if offset > child_start && offset < child_end {
                let word_start = content_start + child_start + 1;
                return ResolvedPos {
                    pos,
                    parent: Parent::Word {
                        block: block_index,
                        inline: inline_index,
                    },
                    offset: pos - word_start,
                    content_start: word_start,
                };
            }
        }
        child_start = child_end;
    }
    ResolvedPos {
        pos,
        parent: Parent::Block { block: block_index },
        offset,
        content_start,
    }
}
