//! File system scanning for unify.
//!
//! Builds an arena-backed snapshot of one directory tree and appends every
//! regular file to the shared content index, keyed by its BLAKE3 hash.
//! Traversal is parallel (jwalk); tree construction is sequential.

mod config;
mod scanner;

pub use config::{ScanConfig, ScanConfigBuilder, ScanStats};
pub use scanner::{hash_file, TreeScanner, TreeSnapshot};

// Re-export core types for convenience
pub use unify_core::{Arena, ContentHash, ContentIndex, NodeId, NodeKind, ScanError};
