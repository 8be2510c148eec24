//! Scan configuration and summary statistics.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for scanning one input tree.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Number of threads for traversal (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Follow symbolic links during traversal. Off by default; links are
    /// recorded as leaves instead.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            threads: 0,
            follow_symlinks: false,
        }
    }
}

/// Summary statistics for one scanned tree.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// Total size of regular files in bytes.
    pub total_size: u64,
    /// Number of regular files.
    pub total_files: u64,
    /// Number of directories, the root included.
    pub total_dirs: u64,
    /// Number of symbolic links.
    pub total_symlinks: u64,
    /// Entries of any other kind.
    pub total_other: u64,
}

impl ScanStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a regular file.
    pub fn record_file(&mut self, size: u64) {
        self.total_files += 1;
        self.total_size += size;
    }

    /// Record a directory.
    pub fn record_dir(&mut self) {
        self.total_dirs += 1;
    }

    /// Record a symlink.
    pub fn record_symlink(&mut self) {
        self.total_symlinks += 1;
    }

    /// Record an entry of another kind.
    pub fn record_other(&mut self) {
        self.total_other += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .root("/home/user")
            .threads(4usize)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert_eq!(config.threads, 4);
        assert!(!config.follow_symlinks);
    }

    #[test]
    fn test_stats_recording() {
        let mut stats = ScanStats::new();
        stats.record_file(100);
        stats.record_file(28);
        stats.record_dir();
        stats.record_symlink();

        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_size, 128);
        assert_eq!(stats.total_dirs, 1);
        assert_eq!(stats.total_symlinks, 1);
    }
}
