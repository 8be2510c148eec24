//! The two filesystem mutations an edit plan is made of.

use std::fs;
use std::path::{Path, PathBuf};

/// A resolved filesystem mutation, carrying plain paths so workers never
/// touch the node graph.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Create a directory.
    Mkdir {
        /// Directory to create.
        path: PathBuf,
    },
    /// Copy a file into a directory, keeping the source name.
    Copy {
        /// File to copy.
        source: PathBuf,
        /// Directory the file lands in.
        dest_dir: PathBuf,
    },
}

impl Mutation {
    /// Apply the mutation, returning the number of bytes copied.
    pub fn apply(&self) -> Result<u64, String> {
        match self {
            Self::Mkdir { path } => {
                fs::create_dir_all(path)
                    .map_err(|e| format!("Failed to create directory: {e}"))?;
                Ok(0)
            }
            Self::Copy { source, dest_dir } => copy_with_backup(source, dest_dir),
        }
    }

    /// The path this mutation acts on, for error reporting.
    pub fn target(&self) -> &Path {
        match self {
            Self::Mkdir { path } => path,
            Self::Copy { source, .. } => source,
        }
    }
}

/// Copy `source` into `dest_dir` under the source's name.
///
/// An existing destination file is renamed to a numbered backup first, so
/// the copy never loses data.
pub fn copy_with_backup(source: &Path, dest_dir: &Path) -> Result<u64, String> {
    let name = source
        .file_name()
        .ok_or_else(|| format!("Source has no file name: {}", source.display()))?;
    let dest = dest_dir.join(name);

    if dest.exists() {
        let backup = numbered_backup_path(&dest);
        fs::rename(&dest, &backup).map_err(|e| format!("Failed to back up existing file: {e}"))?;
    }

    fs::copy(source, &dest).map_err(|e| format!("Failed to copy: {e}"))
}

/// First free `name.~N~` path beside `path`, for the smallest N >= 1.
pub fn numbered_backup_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let parent = path.parent().unwrap_or(Path::new(""));

    let mut n: u32 = 1;
    loop {
        let candidate = parent.join(format!("{name}.~{n}~"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_plain_copy() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.txt");
        let dst_dir = temp.path().join("dst");
        fs::write(&src, "payload").unwrap();
        fs::create_dir(&dst_dir).unwrap();

        let bytes = copy_with_backup(&src, &dst_dir).unwrap();
        assert_eq!(bytes, 7);
        assert_eq!(fs::read_to_string(dst_dir.join("src.txt")).unwrap(), "payload");
    }

    #[test]
    fn test_collision_makes_numbered_backup() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("f");
        let dst_dir = temp.path().join("dst");
        fs::create_dir(&dst_dir).unwrap();
        fs::write(&src, "new").unwrap();
        fs::write(dst_dir.join("f"), "old").unwrap();

        copy_with_backup(&src, &dst_dir).unwrap();
        assert_eq!(fs::read_to_string(dst_dir.join("f")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dst_dir.join("f.~1~")).unwrap(), "old");
    }

    #[test]
    fn test_backup_numbers_increment() {
        let temp = TempDir::new().unwrap();
        let dst_dir = temp.path();
        fs::write(dst_dir.join("f"), "a").unwrap();
        fs::write(dst_dir.join("f.~1~"), "b").unwrap();

        let backup = numbered_backup_path(&dst_dir.join("f"));
        assert_eq!(backup, dst_dir.join("f.~2~"));
    }

    #[test]
    fn test_mkdir_mutation_creates_nested() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a/b");

        let mutation = Mutation::Mkdir { path: path.clone() };
        mutation.apply().unwrap();
        assert!(path.is_dir());
    }
}
