//! Constraint-based flow layout. Pure: no terminal or I/O dependencies.

pub mod split;
pub mod tree;

pub use split::split_evenly;
pub use tree::{Area, LayoutError, LayoutTree, NodeId, NodeKind};
