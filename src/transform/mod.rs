//! Primitive edits, position mapping and transactions.
//!
//! A [`Transaction`] is an ordered list of [`Step`]s. Each step yields a
//! [`StepMap`] describing how it moved positions, and the [`Mapping`] of a
//! transaction is the composition of those maps. Positions computed against
//! the snapshot a transaction was built from are carried forward through the
//! mapping instead of being re-read from a document that has already changed.

mod map;
mod step;
mod transaction;

pub use map::{Assoc, MapResult, Mapping, StepMap};
pub use step::Step;
pub use transaction::Transaction;
