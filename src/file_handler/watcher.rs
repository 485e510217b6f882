//! File watcher for detecting external changes to open documents
//!
//! Editors commonly save by writing a temp file and renaming it over the
//! original, which drops an inotify watch on the file itself. The watcher
//! therefore watches each document's parent directory non-recursively and
//! forwards only events for registered files.

use super::io::FileStat;
use crate::error::WatcherError;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;

/// Events from the file watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A watched file was created or modified
    Changed(PathBuf),

    /// A watched file was removed or renamed away
    Removed(PathBuf),

    /// Watcher error occurred
    Error(String),
}

impl WatchEvent {
    pub fn path(&self) -> Option<&Path> {
        match self {
            WatchEvent::Changed(p) | WatchEvent::Removed(p) => Some(p),
            WatchEvent::Error(_) => None,
        }
    }
}

/// Watches open documents and forwards their events to a tokio channel
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    files: Arc<Mutex<HashSet<PathBuf>>>,
    /// Watched directory -> number of registered files inside it
    dirs: HashMap<PathBuf, usize>,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("dirs", &self.dirs)
            .finish_non_exhaustive()
    }
}

impl FileWatcher {
    pub fn new(events: UnboundedSender<WatchEvent>) -> Result<Self, WatcherError> {
        let files: Arc<Mutex<HashSet<PathBuf>>> = Arc::default();
        let filter = Arc::clone(&files);

        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let Ok(files) = filter.lock() else { return };
                    for watch_event in convert_event(event, &files) {
                        let _ = events.send(watch_event);
                    }
                }
                Err(e) => {
                    let _ = events.send(WatchEvent::Error(e.to_string()));
                }
            },
            Config::default(),
        )
        .map_err(|e| WatcherError::InitError(e.to_string()))?;

        Ok(Self {
            watcher,
            files,
            dirs: HashMap::new(),
        })
    }

    /// Start watching `path`; returns the path under which events arrive
    pub fn watch(&mut self, path: impl AsRef<Path>) -> Result<PathBuf, WatcherError> {
        let path = normalize(path.as_ref());
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        if !self.insert_file(&path) {
            return Ok(path);
        }

        let count = self.dirs.get(&dir).copied().unwrap_or(0);
        if count == 0 {
            if let Err(source) = self.watcher.watch(&dir, RecursiveMode::NonRecursive) {
                self.remove_file(&path);
                return Err(WatcherError::WatchError { path: dir, source });
            }
            log::debug!("Watching directory {}", dir.display());
        }
        self.dirs.insert(dir, count + 1);
        Ok(path)
    }

    /// Stop watching `path`
    pub fn unwatch(&mut self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        if !self.remove_file(&path) {
            return;
        }
        let Some(dir) = path.parent().map(Path::to_path_buf) else {
            return;
        };
        if let Some(count) = self.dirs.get_mut(&dir) {
            *count -= 1;
            if *count == 0 {
                self.dirs.remove(&dir);
                if let Err(e) = self.watcher.unwatch(&dir) {
                    log::warn!("Failed to unwatch {}: {}", dir.display(), e);
                }
            }
        }
    }

    pub fn is_watching(&self, path: impl AsRef<Path>) -> bool {
        let path = normalize(path.as_ref());
        self.files.lock().map(|f| f.contains(&path)).unwrap_or(false)
    }

    fn insert_file(&self, path: &Path) -> bool {
        self.files
            .lock()
            .map(|mut f| f.insert(path.to_path_buf()))
            .unwrap_or(false)
    }

    fn remove_file(&self, path: &Path) -> bool {
        self.files
            .lock()
            .map(|mut f| f.remove(path))
            .unwrap_or(false)
    }
}

/// Canonical form used for both registration and incoming events
pub fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn convert_event(event: Event, files: &HashSet<PathBuf>) -> Vec<WatchEvent> {
    let make: fn(PathBuf) -> WatchEvent = match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => WatchEvent::Changed,
        EventKind::Remove(_) => WatchEvent::Removed,
        _ => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .filter_map(|path| {
            if files.contains(&path) {
                return Some(path);
            }
            // Rename targets may arrive before canonicalization agrees
            let canonical = normalize(&path);
            files.contains(&canonical).then_some(canonical)
        })
        .map(|path| {
            // A rename over the file shows up as a modify of the target
            if path.exists() {
                WatchEvent::Changed(path)
            } else {
                make(path)
            }
        })
        .collect()
}

/// Type of external change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictType {
    /// File was modified externally
    Modified,

    /// File was deleted externally
    Deleted,
}

/// An external change to a document with unsaved local edits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConflict {
    pub path: PathBuf,
    pub change_type: ConflictType,
}

impl FileConflict {
    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            change_type: ConflictType::Modified,
        }
    }

    pub fn message(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string());
        match self.change_type {
            ConflictType::Modified => format!(
                "\"{}\" was changed on disk. Discard your local changes and reload it?",
                name
            ),
            ConflictType::Deleted => format!(
                "\"{}\" was deleted from disk. Your local changes are kept.",
                name
            ),
        }
    }
}

/// User's choice for a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Discard local changes and reload from disk
    ReloadFromDisk,

    /// Keep local changes
    KeepLocal,
}

/// What to do about an external change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Stat unchanged, or an event for our own save
    Ignore,

    /// No local edits; reload silently
    Reload,

    /// Local edits exist; ask the user
    Prompt(FileConflict),

    /// File is gone; keep the document as it is
    Removed,
}

/// Reconciliation policy for an external change
///
/// `current` is `None` when the file no longer exists.
pub fn reconcile(
    path: &Path,
    known: Option<FileStat>,
    current: Option<FileStat>,
    is_dirty: bool,
) -> Reconciliation {
    let Some(current) = current else {
        return Reconciliation::Removed;
    };
    if known == Some(current) {
        return Reconciliation::Ignore;
    }
    if is_dirty {
        Reconciliation::Prompt(FileConflict::modified(path))
    } else {
        Reconciliation::Reload
    }
}
