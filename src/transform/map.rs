/// Which side a position sticks to when content is inserted at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

/// Result of mapping a position through a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    /// The position was strictly inside replaced content.
    pub deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MapRange {
    start: usize,
    old_size: usize,
    new_size: usize,
}

/// How one step moved positions.
///
/// Ranges are stored in the coordinates of the document before the step and
/// sorted by start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
    ranges: Vec<MapRange>,
}

impl StepMap {
    /// A step that moves nothing.
    pub fn identity() -> Self {
        Self::default()
    }

    /// A single replaced range.
    pub fn new(start: usize, old_size: usize, new_size: usize) -> Self {
        if old_size == 0 && new_size == 0 {
            return Self::identity();
        }
        Self {
            ranges: vec![MapRange {
                start,
                old_size,
                new_size,
            }],
        }
    }

    pub fn is_identity(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }

    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let mut diff: isize = 0;
        for range in &self.ranges {
            if range.start > pos {
                break;
            }
            let end = range.start + range.old_size;
            if pos <= end {
                let after = if range.old_size == 0 {
                    assoc == Assoc::After
                } else if pos == range.start {
                    false
                } else if pos == end {
                    true
                } else {
                    assoc == Assoc::After
                };
                let base = shift(range.start, diff);
                return MapResult {
                    pos: if after { base + range.new_size } else { base },
                    deleted: pos > range.start && pos < end,
                };
            }
            diff += range.new_size as isize - range.old_size as isize;
        }
        MapResult {
            pos: shift(pos, diff),
            deleted: false,
        }
    }
}

fn shift(pos: usize, diff: isize) -> usize {
    (pos as isize + diff).max(0) as usize
}

/// An ordered list of step maps, mapped through in sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    /// Append every map of `other`.
    pub fn append(&mut self, other: &Mapping) {
        self.maps.extend(other.maps.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// The mapping made of the maps from index `from` onward.
    pub fn slice(&self, from: usize) -> Mapping {
        Mapping {
            maps: self.maps.get(from..).map(<[StepMap]>::to_vec).unwrap_or_default(),
        }
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }

    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        self.maps.iter().fold(
            MapResult {
                pos,
                deleted: false,
            },
            |acc, map| {
                let next = map.map_result(acc.pos, assoc);
                MapResult {
                    pos: next.pos,
                    deleted: acc.deleted || next.deleted,
                }
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_assoc() {
        let map = StepMap::new(5, 0, 3);
        assert_eq!(map.map(4, Assoc::After), 4);
        assert_eq!(map.map(5, Assoc::Before), 5);
        assert_eq!(map.map(5, Assoc::After), 8);
        assert_eq!(map.map(6, Assoc::Before), 9);
    }

    #[test]
    fn test_deletion_flags_interior() {
        let map = StepMap::new(5, 4, 0);
        assert_eq!(
            map.map_result(5, Assoc::After),
            MapResult { pos: 5, deleted: false }
        );
        assert_eq!(
            map.map_result(7, Assoc::Before),
            MapResult { pos: 5, deleted: true }
        );
        assert_eq!(
            map.map_result(9, Assoc::Before),
            MapResult { pos: 5, deleted: false }
        );
        assert_eq!(map.map(12, Assoc::Before), 8);
    }

    #[test]
    fn test_mapping_composes_in_order() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::new(2, 0, 2));
        mapping.push(StepMap::identity());
        mapping.push(StepMap::new(10, 1, 0));
        assert_eq!(mapping.map(8, Assoc::Before), 10);
        assert_eq!(mapping.map(9, Assoc::Before), 10);
        assert_eq!(mapping.map_result(8, Assoc::After).deleted, false);
        assert_eq!(mapping.slice(1).map(11, Assoc::Before), 10);
        assert!(mapping.slice(7).is_empty());
    }
}
