//! Shared filesystem utilities for simple-docs crates.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tempfile::Builder;
use tracing::debug;

/// Map `func` over `items` in parallel, preserving input order in the output.
pub fn parallel_map<T, U, F>(items: Vec<T>, func: F) -> Vec<U>
where
    T: Send,
    U: Send,
    F: Fn(T) -> U + Send + Sync,
{
    items.into_par_iter().map(func).collect()
}

/// Atomically write the provided string to `path`, ensuring readers never observe
/// partial content. The write is performed via a temporary file in the same
/// directory followed by an atomic rename.
pub fn atomic_write(path: &Path, contents: &str) -> io::Result<()> {
    let parent = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Path::new(".").to_path_buf());
    fs::create_dir_all(&parent)?;

    let mut tmp = Builder::new().prefix(".simple-docs").tempfile_in(&parent)?;

    tmp.as_file_mut().write_all(contents.as_bytes())?;
    tmp.as_file_mut().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(path) {
            let perm = metadata.permissions().mode();
            let _ = fs::set_permissions(tmp.path(), fs::Permissions::from_mode(perm));
        }
    }

    tmp.persist(path).map(|_| ()).map_err(|err| err.error)
}

/// Exclusive advisory lock held on a file for as long as the value lives.
#[derive(Debug)]
pub struct FileLock {
    _file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until an exclusive lock on `path` is acquired, creating the file
    /// when needed.
    pub fn acquire(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)?;

        debug!(path = %path.display(), "Waiting for file lock");
        FileExt::lock_exclusive(&file)?;
        debug!(path = %path.display(), "File lock acquired");

        Ok(FileLock {
            _file: file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // The OS releases the lock when the handle closes; the file itself stays
        // so that waiting processes keep locking the same inode.
        debug!(path = %self.path.display(), "File lock released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, "old").unwrap();

        atomic_write(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".simple-docs"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn parallel_map_preserves_order() {
        let output = parallel_map((0..100).collect(), |n: i32| n * 2);
        assert_eq!(output, (0..100).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn lock_can_be_reacquired_after_release() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".lock");

        let first = FileLock::acquire(&path).unwrap();
        assert_eq!(first.path(), path.as_path());
        drop(first);

        let second = FileLock::acquire(&path);
        assert!(second.is_ok());
    }
}
