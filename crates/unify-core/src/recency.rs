//! Recency order over nodes.
//!
//! This order alone decides which copy of a duplicate set keeps its natural
//! destination, in both content-duplicate detection and history layout.

use std::cmp::Ordering;

use crate::node::{Arena, NodeId};

/// Compare two nodes by recency: `Less` means `a` is older than `b`.
///
/// Timestamps compare first (seconds, then nanoseconds). On a timestamp tie
/// the node whose parent holds more files loses, and as a final tie-breaker
/// an already-subordinate node loses.
pub fn compare_recency(arena: &Arena, a: NodeId, b: NodeId) -> Ordering {
    let (na, nb) = (&arena[a], &arena[b]);

    match na.mtime.cmp(&nb.mtime) {
        Ordering::Equal => {}
        unequal => return unequal,
    }

    let crowd = |id: Option<NodeId>| id.map_or(0, |p| arena[p].num_files);
    // More-crowded parent loses, so the comparison is inverted.
    match crowd(nb.parent).cmp(&crowd(na.parent)) {
        Ordering::Equal => {}
        unequal => return unequal,
    }

    match (na.is_sub, nb.is_sub) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// The most recent node of a non-empty set.
pub fn most_recent(arena: &Arena, ids: &[NodeId]) -> Option<NodeId> {
    let mut best = *ids.first()?;
    for &id in &ids[1..] {
        if compare_recency(arena, best, id) == Ordering::Less {
            best = id;
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Mtime, Node, NodeKind};

    fn file(arena: &mut Arena, parent: NodeId, name: &str, mtime: Mtime) -> NodeId {
        let mut node = Node::new(name, NodeKind::file_from_name(name));
        node.mtime = mtime;
        let id = arena.alloc(node);
        arena.add_child(parent, id);
        id
    }

    #[test]
    fn test_newer_seconds_win() {
        let mut arena = Arena::new();
        let root = arena.alloc(Node::new_dir("/r"));
        let old = file(&mut arena, root, "a", Mtime::new(1, 0));
        let new = file(&mut arena, root, "b", Mtime::new(2, 0));

        assert_eq!(compare_recency(&arena, old, new), Ordering::Less);
        assert_eq!(compare_recency(&arena, new, old), Ordering::Greater);
        assert_eq!(most_recent(&arena, &[old, new]), Some(new));
    }

    #[test]
    fn test_nanoseconds_break_second_ties() {
        let mut arena = Arena::new();
        let root = arena.alloc(Node::new_dir("/r"));
        let old = file(&mut arena, root, "a", Mtime::new(7, 100));
        let new = file(&mut arena, root, "b", Mtime::new(7, 200));

        assert_eq!(compare_recency(&arena, old, new), Ordering::Less);
    }

    #[test]
    fn test_crowded_parent_loses_timestamp_tie() {
        let mut arena = Arena::new();
        let crowded = arena.alloc(Node::new_dir("/crowded"));
        let sparse = arena.alloc(Node::new_dir("/sparse"));

        let t = Mtime::new(9, 9);
        let in_crowded = file(&mut arena, crowded, "a", t);
        file(&mut arena, crowded, "filler1", Mtime::new(1, 0));
        file(&mut arena, crowded, "filler2", Mtime::new(1, 0));
        let in_sparse = file(&mut arena, sparse, "b", t);

        assert_eq!(compare_recency(&arena, in_crowded, in_sparse), Ordering::Less);
        assert_eq!(most_recent(&arena, &[in_crowded, in_sparse]), Some(in_sparse));
    }

    #[test]
    fn test_subordinate_loses_final_tie() {
        let mut arena = Arena::new();
        let r1 = arena.alloc(Node::new_dir("/r1"));
        let r2 = arena.alloc(Node::new_dir("/r2"));

        let t = Mtime::new(3, 3);
        let a = file(&mut arena, r1, "a", t);
        let b = file(&mut arena, r2, "b", t);
        arena.make_sub(a, b);

        assert_eq!(compare_recency(&arena, a, b), Ordering::Less);
        assert_eq!(compare_recency(&arena, b, a), Ordering::Greater);
    }
}
