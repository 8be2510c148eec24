//! Merge planning for unify.
//!
//! The planner consumes two scanned tree snapshots plus the shared content
//! index and computes, purely in memory, the merged result tree and the
//! dependency-ordered queue of edit steps that realizes it. Duplicate files
//! (by content or by path) collapse into one winning copy plus a hidden
//! `.{name}_hist` directory beside it.

mod merge;

pub use merge::{plan_merge, MergePlan};

// Re-export core types for convenience
pub use unify_core::{Arena, ContentIndex, EditStep, NodeId};
