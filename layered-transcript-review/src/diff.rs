//! Character-level diffing of an original and a corrected string.
//!
//! [`diff`] produces a minimal edit script with Myers' O(ND) algorithm.
//! [`cleanup`] turns a minimal script into one a reviewer can read: edits are
//! consolidated into clause-sized replacements and never split a grapheme
//! cluster.
//!
//! # Example
//!
//! ```
//! use layered_transcript_review::diff::{diff, EditOp};
//!
//! let script = diff("testt", "test");
//! assert_eq!(
//!     script.ops(),
//!     &[EditOp::equal("tes"), EditOp::delete("t"), EditOp::equal("t")]
//! );
//! ```

use crate::errors::DiffError;
use layered_transcript::grapheme_boundaries;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Equal,
    Insert,
    Delete,
}

/// One operation of an edit script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOp {
    pub kind: EditKind,
    pub text: String,
}

impl EditOp {
    pub fn new(kind: EditKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn equal(text: impl Into<String>) -> Self {
        Self::new(EditKind::Equal, text)
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Self::new(EditKind::Insert, text)
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self::new(EditKind::Delete, text)
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// An ordered edit script.
///
/// Concatenating the EQUAL and DELETE texts reproduces the original string;
/// concatenating the EQUAL and INSERT texts reproduces the corrected one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditScript(Vec<EditOp>);

impl EditScript {
    pub fn new(ops: Vec<EditOp>) -> Self {
        Self(ops)
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.0
    }

    pub fn into_ops(self) -> Vec<EditOp> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The text this script edits.
    pub fn source_text(&self) -> String {
        self.0
            .iter()
            .filter(|op| op.kind != EditKind::Insert)
            .map(|op| op.text.as_str())
            .collect()
    }

    /// The text this script produces.
    pub fn target_text(&self) -> String {
        self.0
            .iter()
            .filter(|op| op.kind != EditKind::Delete)
            .map(|op| op.text.as_str())
            .collect()
    }

    /// True when applying the script changes nothing.
    pub fn is_identity(&self) -> bool {
        self.0
            .iter()
            .all(|op| op.kind == EditKind::Equal || op.text.is_empty())
    }

    /// Number of INSERT and DELETE operations.
    pub fn change_count(&self) -> usize {
        self.0
            .iter()
            .filter(|op| op.kind != EditKind::Equal && !op.text.is_empty())
            .count()
    }

    /// Check that the script maps `original` to `corrected`.
    pub fn validate(&self, original: &str, corrected: &str) -> Result<(), DiffError> {
        let source = self.source_text();
        if source != original {
            return Err(DiffError::MalformedEditScript {
                side: "original",
                expected: original.to_string(),
                found: source,
            });
        }
        let target = self.target_text();
        if target != corrected {
            return Err(DiffError::MalformedEditScript {
                side: "corrected",
                expected: corrected.to_string(),
                found: target,
            });
        }
        Ok(())
    }
}

/// Cleanup tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// EQUAL runs of at most this many chars between two edits, and shorter
    /// than both, are folded into one replacement.
    pub equality_threshold: usize,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            equality_threshold: 2,
        }
    }
}

// =============================================================================
// Myers diff
// =============================================================================

/// Minimal edit script from `original` to `corrected`.
///
/// The common suffix is factored out before the common prefix, so removing
/// one of two doubled characters deletes the first of the pair. Within each
/// replacement the DELETE comes before the INSERT.
pub fn diff(original: &str, corrected: &str) -> EditScript {
    let a: Vec<char> = original.chars().collect();
    let b: Vec<char> = corrected.chars().collect();

    let suffix = common_suffix(&a, &b);
    let a_head = &a[..a.len() - suffix];
    let b_head = &b[..b.len() - suffix];
    let prefix = common_prefix(a_head, b_head);

    let mut segs = Vec::new();
    segs.push(Segment::Equal(a_head[..prefix].to_vec()));
    for (kind, ch) in myers(&a_head[prefix..], &b_head[prefix..]) {
        segs.push(match kind {
            EditKind::Equal => Segment::Equal(vec![ch]),
            EditKind::Delete => Segment::Change {
                del: vec![ch],
                ins: Vec::new(),
            },
            EditKind::Insert => Segment::Change {
                del: Vec::new(),
                ins: vec![ch],
            },
        });
    }
    segs.push(Segment::Equal(a[a.len() - suffix..].to_vec()));
    to_script(normalize(segs))
}

/// `cleanup(diff(original, corrected))` with the default configuration.
pub fn diff_semantic(original: &str, corrected: &str) -> EditScript {
    cleanup(&diff(original, corrected))
}

fn common_prefix(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[char], b: &[char]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

fn myers(a: &[char], b: &[char]) -> Vec<(EditKind, char)> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = n + m;
    if max == 0 {
        return Vec::new();
    }

    // v[k + max] = furthest x reached on diagonal k
    let mut v = vec![0isize; 2 * max as usize + 2];
    let mut trace = Vec::new();
    'search: for d in 0..=max {
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let idx = (k + max) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx] = x;
            if x >= n && y >= m {
                break 'search;
            }
            k += 2;
        }
    }

    let mut edits = Vec::with_capacity(a.len() + b.len());
    let (mut x, mut y) = (n, m);
    for (d, v) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let k = x - y;
        let prev_k = if k == -d || (k != d && v[(k - 1 + max) as usize] < v[(k + 1 + max) as usize]) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[(prev_k + max) as usize];
        let prev_y = prev_x - prev_k;
        while x > prev_x && y > prev_y {
            edits.push((EditKind::Equal, a[(x - 1) as usize]));
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            if x == prev_x {
                edits.push((EditKind::Insert, b[(y - 1) as usize]));
            } else {
                edits.push((EditKind::Delete, a[(x - 1) as usize]));
            }
        }
        x = prev_x;
        y = prev_y;
    }
    edits.reverse();
    edits
}

// =============================================================================
// Cleanup
// =============================================================================

/// Consolidate a script for human review with the default configuration.
pub fn cleanup(script: &EditScript) -> EditScript {
    cleanup_with(script, &CleanupConfig::default())
}

/// Consolidate a script for human review.
///
/// Adjacent operations of one kind are merged and empty ones dropped. Shared
/// prefixes and suffixes of a DELETE/INSERT pair become EQUAL text. Short
/// EQUAL islands between two edits are folded into a single replacement. No
/// edit boundary falls inside a grapheme cluster. The result is a fixpoint:
/// cleaning it again returns it unchanged.
pub fn cleanup_with(script: &EditScript, config: &CleanupConfig) -> EditScript {
    let source: Vec<char> = script.source_text().chars().collect();
    let target: Vec<char> = script.target_text().chars().collect();
    let bounds = Boundaries {
        source: grapheme_boundaries(&source),
        target: grapheme_boundaries(&target),
    };

    let mut segs = canonical(from_script(script), &bounds);
    while let Some(next) = absorb_equality(&segs, config, &bounds) {
        segs = next;
    }
    to_script(segs)
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Equal(Vec<char>),
    Change { del: Vec<char>, ins: Vec<char> },
}

impl Segment {
    fn source_len(&self) -> usize {
        match self {
            Segment::Equal(text) => text.len(),
            Segment::Change { del, .. } => del.len(),
        }
    }

    fn target_len(&self) -> usize {
        match self {
            Segment::Equal(text) => text.len(),
            Segment::Change { ins, .. } => ins.len(),
        }
    }

    fn is_empty(&self) -> bool {
        self.source_len() == 0 && self.target_len() == 0
    }
}

struct Boundaries {
    source: Vec<bool>,
    target: Vec<bool>,
}

impl Boundaries {
    fn at(&self, source: usize, target: usize) -> bool {
        self.source[source] && self.target[target]
    }
}

fn from_script(script: &EditScript) -> Vec<Segment> {
    let segs = script
        .ops()
        .iter()
        .map(|op| {
            let chars: Vec<char> = op.text.chars().collect();
            match op.kind {
                EditKind::Equal => Segment::Equal(chars),
                EditKind::Delete => Segment::Change {
                    del: chars,
                    ins: Vec::new(),
                },
                EditKind::Insert => Segment::Change {
                    del: Vec::new(),
                    ins: chars,
                },
            }
        })
        .collect();
    normalize(segs)
}

fn to_script(segs: Vec<Segment>) -> EditScript {
    let mut ops = Vec::with_capacity(segs.len());
    for seg in segs {
        match seg {
            Segment::Equal(text) => ops.push(EditOp::equal(text.into_iter().collect::<String>())),
            Segment::Change { del, ins } => {
                if !del.is_empty() {
                    ops.push(EditOp::delete(del.into_iter().collect::<String>()));
                }
                if !ins.is_empty() {
                    ops.push(EditOp::insert(ins.into_iter().collect::<String>()));
                }
            }
        }
    }
    EditScript(ops)
}

/// Drop empty segments and merge neighbours of the same variant.
fn normalize(segs: Vec<Segment>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::with_capacity(segs.len());
    for seg in segs {
        if seg.is_empty() {
            continue;
        }
        let merged = match (out.last_mut(), &seg) {
            (Some(Segment::Equal(last)), Segment::Equal(text)) => {
                last.extend_from_slice(text);
                true
            }
            (Some(Segment::Change { del: d, ins: i }), Segment::Change { del, ins }) => {
                d.extend_from_slice(del);
                i.extend_from_slice(ins);
                true
            }
            _ => false,
        };
        if !merged {
            out.push(seg);
        }
    }
    out
}

fn start_offsets(segs: &[Segment], index: usize) -> (usize, usize) {
    segs[..index].iter().fold((0, 0), |(source, target), seg| {
        (source + seg.source_len(), target + seg.target_len())
    })
}

/// Normalize, snap to graphemes and factor affixes until nothing moves.
fn canonical(mut segs: Vec<Segment>, bounds: &Boundaries) -> Vec<Segment> {
    let rounds = bounds.source.len() + bounds.target.len();
    for _ in 0..rounds {
        let snapped = snap_to_graphemes(&mut segs, bounds);
        segs = normalize(segs);
        let factored = factor_affixes(&mut segs, bounds);
        segs = normalize(segs);
        if !snapped && !factored {
            break;
        }
    }
    segs
}

/// Widen every change whose edges fall inside a grapheme cluster.
fn snap_to_graphemes(segs: &mut [Segment], bounds: &Boundaries) -> bool {
    let mut changed = false;
    for i in 0..segs.len() {
        if !matches!(segs[i], Segment::Change { .. }) {
            continue;
        }
        loop {
            let (source, target) = start_offsets(segs, i);
            if i == 0 || bounds.at(source, target) {
                break;
            }
            let ch = match &mut segs[i - 1] {
                Segment::Equal(prev) => prev.pop(),
                Segment::Change { .. } => None,
            };
            let Some(ch) = ch else { break };
            if let Segment::Change { del, ins } = &mut segs[i] {
                del.insert(0, ch);
                ins.insert(0, ch);
            }
            changed = true;
        }
        loop {
            let (source, target) = start_offsets(segs, i + 1);
            if i + 1 >= segs.len() || bounds.at(source, target) {
                break;
            }
            let ch = match &mut segs[i + 1] {
                Segment::Equal(next) if !next.is_empty() => Some(next.remove(0)),
                _ => None,
            };
            let Some(ch) = ch else { break };
            if let Segment::Change { del, ins } = &mut segs[i] {
                del.push(ch);
                ins.push(ch);
            }
            changed = true;
        }
    }
    changed
}

/// Move the grapheme-aligned common prefix and suffix of each change out into
/// the surrounding EQUAL text.
fn factor_affixes(segs: &mut Vec<Segment>, bounds: &Boundaries) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < segs.len() {
        let (source, target) = start_offsets(segs, i);
        let replacement = match &segs[i] {
            Segment::Change { del, ins } => {
                let mut prefix = common_prefix(del, ins);
                while prefix > 0 && !bounds.at(source + prefix, target + prefix) {
                    prefix -= 1;
                }
                let mut suffix = common_suffix(&del[prefix..], &ins[prefix..]);
                let (source_end, target_end) = (source + del.len(), target + ins.len());
                while suffix > 0 && !bounds.at(source_end - suffix, target_end - suffix) {
                    suffix -= 1;
                }
                if prefix == 0 && suffix == 0 {
                    None
                } else {
                    Some([
                        Segment::Equal(del[..prefix].to_vec()),
                        Segment::Change {
                            del: del[prefix..del.len() - suffix].to_vec(),
                            ins: ins[prefix..ins.len() - suffix].to_vec(),
                        },
                        Segment::Equal(del[del.len() - suffix..].to_vec()),
                    ])
                }
            }
            Segment::Equal(_) => None,
        };
        match replacement {
            Some(parts) => {
                segs.splice(i..=i, parts);
                changed = true;
                i += 3;
            }
            None => i += 1,
        }
    }
    changed
}

/// Fold the first qualifying EQUAL island into its neighbouring edits.
///
/// Only accepted when the canonical result has fewer segments, so repeated
/// application terminates.
fn absorb_equality(segs: &[Segment], config: &CleanupConfig, bounds: &Boundaries) -> Option<Vec<Segment>> {
    for i in 1..segs.len().saturating_sub(1) {
        let (
            Segment::Change { del: d1, ins: i1 },
            Segment::Equal(equal),
            Segment::Change { del: d2, ins: i2 },
        ) = (&segs[i - 1], &segs[i], &segs[i + 1])
        else {
            continue;
        };
        let len = equal.len();
        if len > config.equality_threshold
            || len >= d1.len().max(i1.len())
            || len >= d2.len().max(i2.len())
        {
            continue;
        }
        let mut candidate = segs[..i - 1].to_vec();
        candidate.push(Segment::Change {
            del: [d1.as_slice(), equal.as_slice(), d2.as_slice()].concat(),
            ins: [i1.as_slice(), equal.as_slice(), i2.as_slice()].concat(),
        });
        candidate.extend_from_slice(&segs[i + 2..]);
        let candidate = canonical(candidate, bounds);
        if candidate.len() < segs.len() {
            return Some(candidate);
        }
    }
    None
}
