use super::map::{Assoc, MapResult, Mapping};
use super::step::Step;
use crate::document::Document;
use crate::errors::StepError;

/// An ordered list of steps built against one document snapshot.
///
/// Steps are validated as they are added, against a working copy of the
/// snapshot. Positions used by later steps must be expressed in the
/// coordinates of the snapshot and mapped through [`Transaction::mapping`].
#[derive(Debug, Clone)]
pub struct Transaction {
    base_version: u64,
    working: Document,
    steps: Vec<Step>,
    mapping: Mapping,
}

impl Transaction {
    pub fn new(doc: &Document) -> Self {
        Self {
            base_version: doc.version(),
            working: doc.clone(),
            steps: Vec::new(),
            mapping: Mapping::new(),
        }
    }

    /// Add a step. On error the transaction is unchanged.
    pub fn step(&mut self, step: Step) -> Result<&mut Self, StepError> {
        let mut next = self.working.clone();
        let map = step.apply(&mut next)?;
        self.working = next;
        self.mapping.push(map);
        self.steps.push(step);
        Ok(self)
    }

    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.mapping.map(pos, assoc)
    }

    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        self.mapping.map_result(pos, assoc)
    }

    /// The document as it will look once the transaction is applied.
    pub fn preview(&self) -> &Document {
        &self.working
    }

    /// Replay every step onto a copy of `doc` and bump its version.
    ///
    /// `doc` must be at the version the transaction was built against. The
    /// input is never modified; a failing step discards the copy.
    pub fn apply(&self, doc: &Document) -> Result<Document, StepError> {
        if doc.version() != self.base_version {
            return Err(StepError::VersionMismatch {
                expected: self.base_version,
                found: doc.version(),
            });
        }
        let mut next = doc.clone();
        for step in &self.steps {
            step.apply(&mut next)?;
        }
        next.set_version(self.base_version + 1);
        Ok(next)
    }
}
