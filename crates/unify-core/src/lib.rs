//! Core types for unify.
//!
//! This crate provides the data model shared by the scanner, the merge
//! planner, and the executor: the arena-backed node graph, the content-hash
//! index, edit steps, and the recency order that decides duplicate winners.

mod error;
mod index;
mod node;
mod recency;
mod step;

pub use error::ScanError;
pub use index::{ContentHash, ContentIndex};
pub use node::{Arena, Mtime, Node, NodeId, NodeKind};
pub use recency::{compare_recency, most_recent};
pub use step::EditStep;
