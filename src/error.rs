use crate::NodeIdx;

use thiserror::Error;

/// Recoverable failures of tree mutations.
///
/// Violated preconditions (refining a non-leaf, coarsening a node whose children are not leaves, ...) are programming
/// errors and panic instead.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum TreeError {
    /// Every sibling group is in use. Trees never grow on their own, so callers must size the capacity up front.
    #[error("cannot refine node {node}: all {capacity} node slots are in use")]
    CapacityExhausted { node: NodeIdx, capacity: u32 },
}
