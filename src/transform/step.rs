use super::map::StepMap;
use crate::document::{
    map_marks_in_runs, normalize_inlines, replace_inlines, replace_runs, BlockAttrs, Document,
    Inline, Mark, MarkSet, Parent, TextRun,
};
use crate::errors::StepError;

/// A primitive document edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Replace the text in `from..to` with `slice`.
    ///
    /// Both ends must resolve into the same parent: the content of one word,
    /// or the inline level of one block. At the inline level, words lying
    /// entirely inside the range are removed and their identifiers retired.
    Replace {
        from: usize,
        to: usize,
        slice: Vec<TextRun>,
    },
    /// Remove the word node starting at `pos`.
    RemoveInline { pos: usize },
    AddMark { from: usize, to: usize, mark: Mark },
    RemoveMark { from: usize, to: usize, mark: Mark },
    /// Replace the attributes of the block starting at `pos`.
    SetBlockAttrs { pos: usize, attrs: BlockAttrs },
}

impl Step {
    /// Apply the step to `doc` in place.
    ///
    /// All checks run before any mutation, so on error `doc` is unchanged.
    pub fn apply(&self, doc: &mut Document) -> Result<StepMap, StepError> {
        match self {
            Step::Replace { from, to, slice } => replace(doc, *from, *to, slice),
            Step::RemoveInline { pos } => remove_inline(doc, *pos),
            Step::AddMark { from, to, mark } => {
                check_range(doc, *from, *to)?;
                let mark = mark.clone();
                update_marks(doc, *from, *to, &move |marks| marks.with(mark.clone()));
                Ok(StepMap::identity())
            }
            Step::RemoveMark { from, to, mark } => {
                check_range(doc, *from, *to)?;
                update_marks(doc, *from, *to, &|marks| marks.without(mark));
                Ok(StepMap::identity())
            }
            Step::SetBlockAttrs { pos, attrs } => {
                let index = block_index_at(doc, *pos).ok_or(StepError::NotABlock { pos: *pos })?;
                doc.blocks_mut()[index].attrs = attrs.clone();
                Ok(StepMap::identity())
            }
        }
    }

    /// Size of the text inserted by the step.
    pub fn inserted_size(&self) -> usize {
        match self {
            Step::Replace { slice, .. } => slice.iter().map(TextRun::size).sum(),
            _ => 0,
        }
    }
}

fn check_range(doc: &Document, from: usize, to: usize) -> Result<(), StepError> {
    if from > to {
        return Err(StepError::InvertedRange { from, to });
    }
    doc.resolve(to)?;
    Ok(())
}

fn replace(doc: &mut Document, from: usize, to: usize, slice: &[TextRun]) -> Result<StepMap, StepError> {
    check_range(doc, from, to)?;
    let start = doc.resolve(from)?;
    let end = doc.resolve(to)?;
    if start.parent != end.parent {
        return Err(StepError::CrossesParent { from, to });
    }
    let new_size = slice.iter().map(TextRun::size).sum();
    match start.parent {
        Parent::Document => Err(StepError::OutsideBlock { pos: from }),
        Parent::Word { block, inline } => {
            if let Some(Inline::Word(word)) = doc.blocks_mut()[block].content.get_mut(inline) {
                replace_runs(&mut word.content, start.offset, end.offset, slice);
            }
            Ok(StepMap::new(from, to - from, new_size))
        }
        Parent::Block { block } => {
            let content = &mut doc.blocks_mut()[block].content;
            let removed = replace_inlines(content, start.offset, end.offset, slice)
                .ok_or(StepError::CrossesParent { from, to })?;
            for word in removed {
                doc.retire(word.attrs.identifier);
            }
            Ok(StepMap::new(from, to - from, new_size))
        }
    }
}

fn remove_inline(doc: &mut Document, pos: usize) -> Result<StepMap, StepError> {
    let (block, inline, size) = {
        let word = doc.word_at(pos).ok_or(StepError::NotAWord { pos })?;
        (word.block, word.inline, word.word.size())
    };
    let content = &mut doc.blocks_mut()[block].content;
    let removed = content.remove(inline);
    normalize_inlines(content);
    if let Inline::Word(word) = removed {
        doc.retire(word.attrs.identifier);
    }
    Ok(StepMap::new(pos, size, 0))
}

fn block_index_at(doc: &Document, pos: usize) -> Option<usize> {
    let mut start = 0;
    for (index, block) in doc.blocks().iter().enumerate() {
        if start == pos {
            return Some(index);
        }
        start += block.size();
    }
    None
}

fn update_marks(doc: &mut Document, from: usize, to: usize, f: &dyn Fn(&MarkSet) -> MarkSet) {
    let mut pos = 0;
    for block in doc.blocks_mut() {
        let block_end = pos + block.size();
        if block_end <= from || pos >= to {
            pos = block_end;
            continue;
        }
        pos += 1;
        let mut content = Vec::with_capacity(block.content.len());
        for inline in block.content.drain(..) {
            match inline {
                Inline::Text(run) => {
                    let size = run.size();
                    let mut runs = vec![run];
                    map_marks_in_runs(&mut runs, pos, from, to, f);
                    content.extend(runs.into_iter().map(Inline::Text));
                    pos += size;
                }
                Inline::Word(mut word) => {
                    let size = word.content_size();
                    map_marks_in_runs(&mut word.content, pos + 1, from, to, f);
                    content.push(Inline::Word(word));
                    pos += size + 2;
                }
            }
        }
        normalize_inlines(&mut content);
        block.content = content;
        pos += 1;
    }
}
