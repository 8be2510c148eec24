//! Content-hash index shared across scanned trees.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// BLAKE3 content hash for duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Multimap from content hash to the file nodes carrying that content.
///
/// Populated by the scanner for both input trees, read-only afterwards.
/// Hash collisions define the "same content" equivalence classes the
/// planner unifies.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ContentIndex {
    map: HashMap<ContentHash, Vec<NodeId>>,
}

impl ContentIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file node under its content hash.
    pub fn insert(&mut self, hash: ContentHash, id: NodeId) {
        self.map.entry(hash).or_default().push(id);
    }

    /// Nodes recorded under `hash`.
    pub fn class(&self, hash: &ContentHash) -> &[NodeId] {
        self.map.get(hash).map_or(&[], Vec::as_slice)
    }

    /// Equivalence classes holding more than one file.
    pub fn duplicate_classes(&self) -> impl Iterator<Item = &[NodeId]> {
        self.map
            .values()
            .filter(|ids| ids.len() > 1)
            .map(Vec::as_slice)
    }

    /// Number of distinct hashes recorded.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_hex() {
        let hash = ContentHash::new([0xab; 32]);
        assert_eq!(hash.to_hex().len(), 64);
        assert!(hash.to_hex().starts_with("abab"));
    }

    #[test]
    fn test_duplicate_classes() {
        let mut index = ContentIndex::new();
        let h1 = ContentHash::new([1; 32]);
        let h2 = ContentHash::new([2; 32]);

        index.insert(h1, NodeId(0));
        index.insert(h1, NodeId(1));
        index.insert(h2, NodeId(2));

        assert_eq!(index.len(), 2);
        let classes: Vec<_> = index.duplicate_classes().collect();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0], &[NodeId(0), NodeId(1)]);
        assert_eq!(index.class(&h2), &[NodeId(2)]);
    }
}
