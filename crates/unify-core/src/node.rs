//! Arena-backed file and directory node model.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Unique identifier for a node within the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Change timestamp with nanosecond precision.
///
/// Taken from ctime on unix platforms; seconds compare first, then
/// nanoseconds.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Mtime {
    /// Whole seconds since the epoch.
    pub sec: i64,
    /// Nanosecond remainder.
    pub nsec: u32,
}

impl Mtime {
    /// Create a timestamp from raw parts.
    pub fn new(sec: i64, nsec: u32) -> Self {
        Self { sec, nsec }
    }
}

impl From<SystemTime> for Mtime {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self::new(d.as_secs() as i64, d.subsec_nanos()),
            Err(_) => Self::default(),
        }
    }
}

/// Type of file system node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Directory.
    Dir,
    /// Regular file, tagged by its extension (or `other` when it has none).
    File {
        /// Derived type tag, e.g. `.txt`.
        tag: CompactString,
    },
    /// Symbolic link. Recorded, never followed.
    Symlink,
    /// Other file types (sockets, devices, etc.).
    Other,
}

impl NodeKind {
    /// Tag a file node by the extension of its name.
    pub fn file_from_name(name: &str) -> Self {
        let tag = match name.rfind('.') {
            Some(pos) => CompactString::new(&name[pos..]),
            None => CompactString::const_new("other"),
        };
        Self::File { tag }
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Dir)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File { .. })
    }
}

/// A single file or directory, as observed by the scanner or synthesized
/// by the planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Bare entry name (leaf component).
    pub name: CompactString,

    /// Full path; recomputed from the parent's path when reparented.
    pub path: PathBuf,

    /// Node type and derived tag.
    pub kind: NodeKind,

    /// Size in bytes.
    pub size: u64,

    /// Change timestamp.
    pub mtime: Mtime,

    /// Owning directory in this node's home tree. `None` for roots.
    pub parent: Option<NodeId>,

    /// Children by name. Name-unique; order is irrelevant.
    pub children: HashMap<CompactString, NodeId>,

    /// Count of non-directory children. Recency tie-breaker.
    pub num_files: usize,

    /// For files: the directory in the result tree this file will be
    /// copied into. May be reassigned to a history directory.
    pub dst_parent: Option<NodeId>,

    /// True once this node has been declared subordinate in a duplicate
    /// hierarchy.
    pub is_sub: bool,

    /// Nodes subordinated to this one.
    pub subordinates: Vec<NodeId>,

    /// Root of the subordination chain this node belongs to, when `is_sub`.
    pub top_sup: Option<NodeId>,

    /// Set by the executor once the filesystem mutation realizing this
    /// node has completed.
    pub created: bool,
}

impl Node {
    /// Create a node of the given kind. The path defaults to the name and
    /// is recomputed when the node is attached to a parent.
    pub fn new(name: impl Into<CompactString>, kind: NodeKind) -> Self {
        let name = name.into();
        let path = PathBuf::from(name.as_str());
        Self {
            name,
            path,
            kind,
            size: 0,
            mtime: Mtime::default(),
            parent: None,
            children: HashMap::new(),
            num_files: 0,
            dst_parent: None,
            is_sub: false,
            subordinates: Vec::new(),
            top_sup: None,
            created: false,
        }
    }

    /// Create a directory node.
    pub fn new_dir(name: impl Into<CompactString>) -> Self {
        Self::new(name, NodeKind::Dir)
    }
}

/// Append-only store of nodes. Scanned and synthesized nodes live here for
/// the duration of the program; `NodeId`s stay valid across appends.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a node and return its id.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Append a fresh directory node, parented under `parent` when given.
    pub fn alloc_dir(&mut self, name: impl Into<CompactString>, parent: Option<NodeId>) -> NodeId {
        let id = self.alloc(Node::new_dir(name));
        if parent.is_some() {
            self.set_parent(id, parent);
        }
        id
    }

    /// Assign a parent and recompute the path. A `None` parent leaves the
    /// path as the caller set it.
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self[id].parent = parent;
        if let Some(p) = parent {
            let path = self[p].path.join(self[id].name.as_str());
            self[id].path = path;
        }
    }

    /// Record the planned destination directory for a file. No-op on `None`.
    pub fn set_dst_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        if parent.is_some() {
            self[id].dst_parent = parent;
        }
    }

    /// Register `child` under `parent`: links the parent back-reference,
    /// recomputes the child's path, and bumps `num_files` for non-directory
    /// children.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.set_parent(child, Some(parent));
        if !self[child].kind.is_dir() {
            self[parent].num_files += 1;
        }
        let name = self[child].name.clone();
        self[parent].children.insert(name, child);
    }

    /// Declare `id` subordinate to `sup` in a duplicate hierarchy.
    ///
    /// The caller must ensure no cycle forms through `subordinates`.
    pub fn make_sub(&mut self, id: NodeId, sup: NodeId) {
        self[sup].subordinates.push(id);
        self[id].is_sub = true;
        self[id].top_sup = if self[sup].is_sub {
            self[sup].top_sup
        } else {
            Some(sup)
        };
    }

    /// Root of the subordination chain `id` belongs to; `id` itself when it
    /// is not subordinate.
    pub fn top_sup_of(&self, id: NodeId) -> NodeId {
        self[id].top_sup.filter(|_| self[id].is_sub).unwrap_or(id)
    }

    /// Indented multi-line rendering of the subtree at `id`. Children are
    /// listed after their parent, two spaces deeper, in name order.
    pub fn render(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_into(id, "", &mut out);
        out
    }

    fn render_into(&self, id: NodeId, prefix: &str, out: &mut String) {
        let node = &self[id];
        out.push_str(prefix);
        out.push_str(&node.name);
        out.push('\n');

        let mut kids: Vec<_> = node.children.iter().collect();
        kids.sort_by(|a, b| a.0.cmp(b.0));

        let child_prefix = format!("{prefix}  ");
        for (_, &child) in kids {
            self.render_into(child, &child_prefix, out);
        }
    }
}

impl std::ops::Index<NodeId> for Arena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl std::ops::IndexMut<NodeId> for Arena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}
