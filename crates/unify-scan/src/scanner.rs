//! Parallel directory traversal feeding a sequential arena build.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use compact_str::CompactString;
use jwalk::{Parallelism, WalkDir};

use unify_core::{Arena, ContentHash, ContentIndex, Mtime, Node, NodeId, NodeKind, ScanError};

use crate::config::{ScanConfig, ScanStats};

/// Files above this size are hashed through a memory map.
const MMAP_THRESHOLD: u64 = 128 * 1024;

/// One scanned input tree: the arena id of its root plus summary counts.
#[derive(Debug)]
pub struct TreeSnapshot {
    /// Root node of the tree.
    pub root: NodeId,
    /// Canonicalized root path that was scanned.
    pub root_path: PathBuf,
    /// Summary statistics.
    pub stats: ScanStats,
}

/// Scanner building node trees and the shared content index.
///
/// Traversal runs in parallel via jwalk; the arena build and hashing run
/// sequentially so parent links and `num_files` counts stay simple.
#[derive(Debug, Default)]
pub struct TreeScanner;

impl TreeScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self
    }

    /// Scan the configured root into `arena`, appending one content-index
    /// entry per regular file. Any stat, open, or read failure is fatal.
    pub fn scan(
        &self,
        config: &ScanConfig,
        arena: &mut Arena,
        index: &mut ContentIndex,
    ) -> Result<TreeSnapshot, ScanError> {
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;

        let root_meta =
            std::fs::metadata(&root_path).map_err(|e| ScanError::io(&root_path, e))?;
        if !root_meta.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let mut entries = self.collect_entries(config, &root_path)?;
        let mut stats = ScanStats::new();

        // Root keeps its full path as its name, like any merge output would
        // name its own root.
        let mut root_node = Node::new_dir(CompactString::new(root_path.to_string_lossy()));
        root_node.path = root_path.clone();
        root_node.mtime = change_time(&root_meta);
        let root = arena.alloc(root_node);
        stats.record_dir();

        self.build_children(arena, index, &mut entries, root, &root_path, &mut stats)?;

        Ok(TreeSnapshot {
            root,
            root_path,
            stats,
        })
    }

    /// Walk the tree, grouping entries under their parent directory.
    fn collect_entries(
        &self,
        config: &ScanConfig,
        root_path: &Path,
    ) -> Result<HashMap<PathBuf, Vec<EntryInfo>>, ScanError> {
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: std::time::Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let walker = WalkDir::new(root_path)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(config.follow_symlinks);

        let mut entries_by_parent: HashMap<PathBuf, Vec<EntryInfo>> = HashMap::new();

        for entry_result in walker {
            let entry = entry_result.map_err(walk_error)?;
            if entry.depth() == 0 {
                continue; // The root node is built by the caller.
            }

            let path = entry.path();
            let metadata = entry.metadata().map_err(walk_error)?;
            let name = CompactString::new(entry.file_name().to_string_lossy());

            let file_type = entry.file_type();
            let kind = if file_type.is_dir() {
                NodeKind::Dir
            } else if file_type.is_file() {
                NodeKind::file_from_name(&name)
            } else if file_type.is_symlink() {
                NodeKind::Symlink
            } else {
                NodeKind::Other
            };

            let info = EntryInfo {
                name,
                size: if kind.is_file() { metadata.len() } else { 0 },
                mtime: change_time(&metadata),
                kind,
                path: path.clone(),
            };

            let parent = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root_path.to_path_buf());
            entries_by_parent.entry(parent).or_default().push(info);
        }

        Ok(entries_by_parent)
    }

    /// Attach the collected entries below `dir`, recursing into
    /// subdirectories and hashing every regular file.
    fn build_children(
        &self,
        arena: &mut Arena,
        index: &mut ContentIndex,
        entries: &mut HashMap<PathBuf, Vec<EntryInfo>>,
        dir: NodeId,
        dir_path: &Path,
        stats: &mut ScanStats,
    ) -> Result<(), ScanError> {
        let children = entries.remove(dir_path).unwrap_or_default();

        for entry in children {
            let mut node = Node::new(entry.name, entry.kind.clone());
            node.size = entry.size;
            node.mtime = entry.mtime;
            let id = arena.alloc(node);
            arena.add_child(dir, id);

            match entry.kind {
                NodeKind::Dir => {
                    stats.record_dir();
                    self.build_children(arena, index, entries, id, &entry.path, stats)?;
                }
                NodeKind::File { .. } => {
                    let hash = hash_file(&entry.path)?;
                    index.insert(hash, id);
                    stats.record_file(entry.size);
                }
                NodeKind::Symlink => stats.record_symlink(),
                NodeKind::Other => stats.record_other(),
            }
        }

        Ok(())
    }
}

/// Temporary struct for collected entry information.
#[derive(Debug)]
struct EntryInfo {
    name: CompactString,
    path: PathBuf,
    size: u64,
    mtime: Mtime,
    kind: NodeKind,
}

fn walk_error(err: jwalk::Error) -> ScanError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    match err.into_io_error() {
        Some(io) => ScanError::io(path, io),
        None => ScanError::Other {
            message: format!("walk failed at {}", path.display()),
        },
    }
}

/// Compute the BLAKE3 hash of a file's contents.
///
/// Memory-maps files above [`MMAP_THRESHOLD`], buffers smaller ones.
pub fn hash_file(path: &Path) -> Result<ContentHash, ScanError> {
    let mut file = File::open(path).map_err(|e| ScanError::io(path, e))?;
    let metadata = file.metadata().map_err(|e| ScanError::io(path, e))?;

    if metadata.len() > MMAP_THRESHOLD {
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| ScanError::io(path, e))?;
        Ok(ContentHash::new(*blake3::hash(&mmap).as_bytes()))
    } else {
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let n = file.read(&mut buffer).map_err(|e| ScanError::io(path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
        Ok(ContentHash::new(*hasher.finalize().as_bytes()))
    }
}

/// Change timestamp of a metadata record.
#[cfg(unix)]
fn change_time(metadata: &std::fs::Metadata) -> Mtime {
    Mtime::new(metadata.ctime(), metadata.ctime_nsec() as u32)
}

#[cfg(not(unix))]
fn change_time(metadata: &std::fs::Metadata) -> Mtime {
    metadata
        .modified()
        .map(Mtime::from)
        .unwrap_or_default()
}
