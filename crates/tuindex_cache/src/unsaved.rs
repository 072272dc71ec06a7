//! Editor buffers that override on-disk file contents.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// One editor buffer whose contents differ from the file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsavedFile {
    /// Path of the file the buffer shadows.
    pub path: PathBuf,
    /// The in-memory contents.
    pub contents: Arc<str>,
}

/// Supplies the current set of unsaved editor buffers.
///
/// The cache re-queries the overlay on every parse and reparse and never
/// keeps a copy between calls, since buffers change while the user types.
pub trait UnsavedFilesOverlay: Send + Sync {
    /// Returns a snapshot of every unsaved buffer.
    fn current_overlay(&self) -> Vec<UnsavedFile>;
}

/// A thread-safe in-memory [`UnsavedFilesOverlay`].
///
/// The editor side calls [`update`](Self::update) and [`remove`](Self::remove)
/// as buffers change and are saved; the index side only reads snapshots.
#[derive(Debug, Default)]
pub struct UnsavedFiles {
    files: RwLock<BTreeMap<PathBuf, Arc<str>>>,
}

impl UnsavedFiles {
    /// Creates an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the current contents of an unsaved buffer, replacing any previous contents.
    pub fn update(&self, path: impl Into<PathBuf>, contents: impl Into<Arc<str>>) {
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        files.insert(path.into(), contents.into());
    }

    /// Forgets the buffer for `path`, typically because it was saved or closed.
    pub fn remove(&self, path: &Path) {
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        files.remove(path);
    }

    /// Forgets every buffer.
    pub fn remove_all(&self) {
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        files.clear();
    }

    /// Returns the contents of the buffer for `path`, if one is recorded.
    pub fn contents(&self, path: &Path) -> Option<Arc<str>> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files.get(path).cloned()
    }

    /// Returns the number of unsaved buffers.
    pub fn len(&self) -> usize {
        self.files.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if there are no unsaved buffers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UnsavedFilesOverlay for UnsavedFiles {
    fn current_overlay(&self) -> Vec<UnsavedFile> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files
            .iter()
            .map(|(path, contents)| UnsavedFile {
                path: path.clone(),
                contents: Arc::clone(contents),
            })
            .collect()
    }
}
