//! The merge planner.
//!
//! Takes two scanned trees plus the shared content index and produces the
//! result tree and a dependency-ordered queue of edit steps, in three
//! phases:
//!
//! 1. Content duplicates: every class of identical files is linked into a
//!    subordination hierarchy below its most recent member.
//! 2. Tree merge: the second tree's directories are folded into the first,
//!    recursively; same-path files become duplicates too.
//! 3. History layout: each duplicate hierarchy collapses into one winning
//!    copy at its natural destination plus a hidden `.{name}_hist`
//!    directory beside it holding the rest.
//!
//! The planner is single-threaded and purely in-memory; nothing touches the
//! filesystem until the executor runs the queue.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::Path;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use unify_core::{compare_recency, most_recent, Arena, ContentIndex, EditStep, Node, NodeId};

/// A computed merge: the synthesized result root and the step queue that
/// realizes it. Only the planner can produce one, so the executor never
/// sees a tree that was not the product of a two-tree merge.
#[derive(Debug, Serialize, Deserialize)]
pub struct MergePlan {
    /// Root of the synthesized result tree.
    pub root: NodeId,
    /// Edit steps in dependency order (parents before children).
    pub steps: VecDeque<EditStep>,
}

impl MergePlan {
    /// Number of planned steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Plan the merge of the trees rooted at `left` and `right` into a new tree
/// at `out_path`.
///
/// Mutates nodes of both input trees (destination links, subordination,
/// reparenting of directories) and appends synthesized nodes to the arena.
pub fn plan_merge(
    arena: &mut Arena,
    left: NodeId,
    right: NodeId,
    out_path: &Path,
    index: &ContentIndex,
) -> MergePlan {
    Planner {
        arena,
        steps: VecDeque::new(),
    }
    .run(left, right, out_path, index)
}

struct Planner<'a> {
    arena: &'a mut Arena,
    steps: VecDeque<EditStep>,
}

impl Planner<'_> {
    fn run(
        mut self,
        left: NodeId,
        right: NodeId,
        out_path: &Path,
        index: &ContentIndex,
    ) -> MergePlan {
        self.link_content_duplicates(index);

        // The result root starts as a shallow copy of the left root: same
        // children, name and path overridden to the output path.
        let mut root_node = Node::new_dir(CompactString::new(out_path.to_string_lossy()));
        root_node.path = out_path.to_path_buf();
        root_node.children = self.arena[left].children.clone();
        root_node.num_files = self.arena[left].num_files;
        let root = self.arena.alloc(root_node);
        self.steps.push_back(EditStep::mkdir(root));

        // Superiors of every duplicate hierarchy met during the merge.
        let mut sups = BTreeSet::new();
        self.merge_dirs(root, right, &mut sups);

        for sup in sups {
            self.build_history(sup);
        }

        MergePlan {
            root,
            steps: self.steps,
        }
    }

    /// Phase 1: subordinate every member of a same-content class to the
    /// class's most recent file.
    fn link_content_duplicates(&mut self, index: &ContentIndex) {
        for class in index.duplicate_classes() {
            let Some(best) = most_recent(self.arena, class) else {
                continue;
            };
            for &id in class {
                if id != best {
                    self.arena.make_sub(id, best);
                }
            }
        }
    }

    /// Phase 2: fold the children of `contrib` into `dest`, recursively.
    ///
    /// `dest` is the directory under construction in the result tree;
    /// `contrib` contributes entries. Afterwards `dest.children` holds the
    /// merged view, minus duplicate files (those surface in phase 3).
    fn merge_dirs(&mut self, dest: NodeId, contrib: NodeId, sups: &mut BTreeSet<NodeId>) {
        let mut step_children: HashMap<CompactString, NodeId> = HashMap::new();
        let mut visited: HashSet<CompactString> = HashSet::new();

        for (name, c1) in sorted_children(self.arena, dest) {
            let c2 = self.arena[contrib].children.get(&name).copied();
            if c2.is_some() {
                visited.insert(name.clone());
            }

            if self.arena[c1].kind.is_dir() {
                // Same-named directories merge in place; a directory present
                // on this side only gets a fresh container as destination
                // and contributes its own contents to it.
                let (sub_dest, sub_contrib) = match c2 {
                    Some(c2) => (c1, c2),
                    None => (self.arena.alloc_dir(name.clone(), Some(dest)), c1),
                };
                self.arena.set_parent(sub_dest, Some(dest));
                self.arena.set_parent(sub_contrib, Some(dest));
                self.steps.push_back(EditStep::mkdir(sub_dest));
                step_children.insert(name, sub_dest);
                self.merge_dirs(sub_dest, sub_contrib, sups);
            } else {
                self.arena.set_dst_parent(c1, Some(dest));
                if let Some(c2) = c2 {
                    // Path collision: both files land in `dest`; tie their
                    // duplicate hierarchies together without forming a loop.
                    self.arena.set_dst_parent(c2, Some(dest));
                    if !self.arena[c1].is_sub && !self.arena[c2].is_sub {
                        self.arena.make_sub(c1, c2);
                    }
                    let (sub, other) = if self.arena[c1].is_sub {
                        (c1, c2)
                    } else {
                        (c2, c1)
                    };
                    let top = self.arena.top_sup_of(sub);
                    sups.insert(top);
                    if top != other {
                        self.arena.make_sub(other, sub);
                    }
                } else if !self.arena[c1].is_sub && self.arena[c1].subordinates.is_empty() {
                    // Singleton: copies straight to its natural spot.
                    self.steps.push_back(EditStep::copy(c1, dest));
                    step_children.insert(name, c1);
                } else if self.arena[c1].is_sub {
                    sups.insert(self.arena.top_sup_of(c1));
                }
                // A superior with subordinates is emitted in phase 3.
            }
        }

        for (name, c2) in sorted_children(self.arena, contrib) {
            if visited.contains(&name) {
                continue;
            }
            if self.arena[c2].kind.is_dir() {
                self.arena.set_parent(c2, Some(dest));
                let sub_dest = self.arena.alloc_dir(name.clone(), Some(dest));
                self.steps.push_back(EditStep::mkdir(sub_dest));
                step_children.insert(name, sub_dest);
                self.merge_dirs(sub_dest, c2, sups);
            } else {
                self.arena.set_dst_parent(c2, Some(dest));
                if !self.arena[c2].is_sub && self.arena[c2].subordinates.is_empty() {
                    self.steps.push_back(EditStep::copy(c2, dest));
                    step_children.insert(name, c2);
                } else if self.arena[c2].is_sub {
                    sups.insert(self.arena.top_sup_of(c2));
                }
            }
        }

        self.arena[dest].children = step_children;
    }

    /// Phase 3: collapse the duplicate hierarchy rooted at `top` into its
    /// most recent member plus a hidden history directory beside it.
    fn build_history(&mut self, top: NodeId) {
        let mut members = Vec::new();
        let mut seen = HashSet::new();
        self.gather_hierarchy(top, &mut members, &mut seen);

        // Most recent first.
        members.sort_by(|&x, &y| compare_recency(self.arena, y, x));
        let winner = members[0];
        let Some(dst) = self.arena[winner].dst_parent else {
            return; // Every merged file has a committed destination.
        };

        let hist_name = format!(".{}_hist", self.arena[winner].name);
        let hist = self.arena.alloc_dir(hist_name, Some(dst));
        self.steps.push_back(EditStep::mkdir(hist));
        let hist_key = self.arena[hist].name.clone();
        self.arena[dst].children.insert(hist_key, hist);

        for &dup in &members[1..] {
            let name = self.arena[dup].name.clone();
            if let Some(prev) = self.arena[dup].dst_parent {
                self.arena[prev].children.remove(&name);
            }
            self.arena.set_dst_parent(dup, Some(hist));
            self.steps.push_back(EditStep::copy(dup, hist));
            self.arena[hist].children.insert(name, dup);
        }

        let winner_key = self.arena[winner].name.clone();
        self.steps.push_back(EditStep::copy(winner, dst));
        self.arena[dst].children.insert(winner_key, winner);
        self.arena[winner].is_sub = false;
    }

    /// Collect `id` and the transitive closure of its subordinates, each
    /// node once even when reachable through several subordination edges.
    fn gather_hierarchy(&self, id: NodeId, out: &mut Vec<NodeId>, seen: &mut HashSet<NodeId>) {
        if !seen.insert(id) {
            return;
        }
        out.push(id);
        for &sub in &self.arena[id].subordinates {
            self.gather_hierarchy(sub, out, seen);
        }
    }
}

/// Children of `dir` in name order, snapshotted so the arena can be
/// mutated while iterating.
fn sorted_children(arena: &Arena, dir: NodeId) -> Vec<(CompactString, NodeId)> {
    let mut children: Vec<_> = arena[dir]
        .children
        .iter()
        .map(|(name, &id)| (name.clone(), id))
        .collect();
    children.sort_by(|a, b| a.0.cmp(&b.0));
    children
}
