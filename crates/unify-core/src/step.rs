//! Edit steps: the unit of planned filesystem mutation.

use serde::{Deserialize, Serialize};

use crate::node::{Arena, NodeId};

/// One planned filesystem mutation.
///
/// The *acting* node is the one whose `created` flag flips when the step
/// completes: the directory itself for `Mkdir`, the source file for `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditStep {
    /// Create the target node's path as a directory.
    Mkdir {
        /// Directory to create.
        target: NodeId,
    },
    /// Copy the source file into a destination directory, preserving the
    /// source name. An existing destination file is renamed to a numbered
    /// backup rather than overwritten.
    Copy {
        /// File to copy.
        source: NodeId,
        /// Directory the file lands in.
        dest_dir: NodeId,
    },
}

impl EditStep {
    /// Create a make-directory step.
    pub fn mkdir(target: NodeId) -> Self {
        Self::Mkdir { target }
    }

    /// Create a copy-file step.
    pub fn copy(source: NodeId, dest_dir: NodeId) -> Self {
        Self::Copy { source, dest_dir }
    }

    /// The node whose `created` flag this step flips on completion.
    pub fn acting(&self) -> NodeId {
        match *self {
            Self::Mkdir { target } => target,
            Self::Copy { source, .. } => source,
        }
    }

    /// The node that must be `created` before this step may run: the parent
    /// directory for `Mkdir`, the destination directory for `Copy`. `None`
    /// means the step has no prerequisite (the result root).
    pub fn prerequisite(&self, arena: &Arena) -> Option<NodeId> {
        match *self {
            Self::Mkdir { target } => arena[target].parent,
            Self::Copy { source, .. } => arena[source].dst_parent,
        }
    }
}
