use std::cmp::Ordering;
use std::path::PathBuf;

use unify_core::{
    compare_recency, most_recent, Arena, ContentHash, ContentIndex, EditStep, Mtime, Node, NodeId,
    NodeKind,
};

fn file_node(name: &str, sec: i64) -> Node {
    let mut node = Node::new(name, NodeKind::file_from_name(name));
    node.mtime = Mtime::new(sec, 0);
    node
}

#[test]
fn test_paths_compose_through_the_tree() {
    let mut arena = Arena::new();
    let mut root = Node::new_dir("in");
    root.path = PathBuf::from("/data/in");
    let root = arena.alloc(root);

    let docs = arena.alloc_dir("docs", Some(root));
    let note = arena.alloc(file_node("note.md", 1));
    arena.add_child(docs, note);

    assert_eq!(arena[docs].path, PathBuf::from("/data/in/docs"));
    assert_eq!(arena[note].path, PathBuf::from("/data/in/docs/note.md"));
    assert_eq!(arena[note].parent, Some(docs));
}

#[test]
fn test_children_are_name_unique() {
    let mut arena = Arena::new();
    let root = arena.alloc(Node::new_dir("/r"));
    let first = arena.alloc(file_node("f", 1));
    let second = arena.alloc(file_node("f", 2));

    arena.add_child(root, first);
    arena.add_child(root, second);

    // Later registration replaces the earlier entry; the name maps to
    // exactly one child.
    assert_eq!(arena[root].children.len(), 1);
    assert_eq!(arena[root].children["f"], second);
}

#[test]
fn test_subordination_forms_a_forest() {
    let mut arena = Arena::new();
    let r = arena.alloc(Node::new_dir("/r"));
    let ids: Vec<NodeId> = (0..4i64)
        .map(|i| {
            let id = arena.alloc(file_node(&format!("f{i}"), i));
            arena.add_child(r, id);
            id
        })
        .collect();

    arena.make_sub(ids[0], ids[3]);
    arena.make_sub(ids[1], ids[3]);
    arena.make_sub(ids[2], ids[1]);

    // Every subordinate resolves to the same non-subordinate top.
    for &id in &ids[..3] {
        assert!(arena[id].is_sub);
        assert_eq!(arena.top_sup_of(id), ids[3]);
    }
    assert!(!arena[ids[3]].is_sub);
    assert_eq!(arena[ids[3]].subordinates, vec![ids[0], ids[1]]);
    assert_eq!(arena[ids[1]].subordinates, vec![ids[2]]);
}

#[test]
fn test_recency_chain_is_total() {
    let mut arena = Arena::new();
    let r = arena.alloc(Node::new_dir("/r"));
    let older = arena.alloc(file_node("a", 10));
    let newer = arena.alloc(file_node("b", 20));
    arena.add_child(r, older);
    arena.add_child(r, newer);

    assert_eq!(compare_recency(&arena, older, newer), Ordering::Less);
    assert_eq!(compare_recency(&arena, newer, older), Ordering::Greater);
    assert_eq!(compare_recency(&arena, older, older), Ordering::Equal);
    assert_eq!(most_recent(&arena, &[older, newer]), Some(newer));
    assert_eq!(most_recent(&arena, &[]), None);
}

#[test]
fn test_edit_step_dependency_keys() {
    let mut arena = Arena::new();
    let mut root = Node::new_dir("out");
    root.path = PathBuf::from("/out");
    let root = arena.alloc(root);
    let sub = arena.alloc_dir("sub", Some(root));
    let file = arena.alloc(file_node("f", 1));
    arena.set_dst_parent(file, Some(sub));

    let mkdir_root = EditStep::mkdir(root);
    let mkdir_sub = EditStep::mkdir(sub);
    let copy = EditStep::copy(file, sub);

    assert_eq!(mkdir_root.prerequisite(&arena), None);
    assert_eq!(mkdir_sub.prerequisite(&arena), Some(root));
    assert_eq!(copy.prerequisite(&arena), Some(sub));
    assert_eq!(copy.acting(), file);
}

#[test]
fn test_set_dst_parent_ignores_none() {
    let mut arena = Arena::new();
    let dir = arena.alloc(Node::new_dir("/d"));
    let file = arena.alloc(file_node("f", 1));

    arena.set_dst_parent(file, Some(dir));
    arena.set_dst_parent(file, None);
    assert_eq!(arena[file].dst_parent, Some(dir));
}

#[test]
fn test_content_index_round() {
    let mut arena = Arena::new();
    let r = arena.alloc(Node::new_dir("/r"));
    let a = arena.alloc(file_node("a", 1));
    let b = arena.alloc(file_node("b", 1));
    let c = arena.alloc(file_node("c", 1));
    for id in [a, b, c] {
        arena.add_child(r, id);
    }

    let mut index = ContentIndex::new();
    let shared = ContentHash::new([9; 32]);
    index.insert(shared, a);
    index.insert(shared, c);
    index.insert(ContentHash::new([1; 32]), b);

    let dups: Vec<_> = index.duplicate_classes().collect();
    assert_eq!(dups, vec![&[a, c][..]]);
}
