//! Root application state container
//!
//! Open documents, the tab bar and the process-wide presentation, owned by
//! the controller and passed by reference to whatever needs them.

use super::TabState;
use crate::config::UiConfig;
use crate::file_handler::FileStat;
use crate::markdown::TocEntry;
use crate::presentation::PresentationState;
use crate::render::{ImageWidths, RenderRequest};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use uuid::Uuid;

/// Unique identifier for documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Create a new unique document ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single open document (one tab)
#[derive(Debug, Clone)]
pub struct Document {
    /// Unique identifier for this document
    pub id: DocumentId,

    /// File path (None for untitled documents)
    pub path: Option<PathBuf>,

    /// Document content as a rope
    pub content: ropey::Rope,

    /// Display name derived from the path basename
    pub display_name: String,

    /// Whether the document has local edits not yet saved
    pub modified: bool,

    /// Stat captured at load/save, compared against external changes
    pub last_known_stat: Option<FileStat>,

    /// Headings of the last committed render
    pub toc: Vec<TocEntry>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self {
            id: DocumentId::new(),
            path: None,
            content: ropey::Rope::new(),
            display_name: "Untitled".to_string(),
            modified: false,
            last_known_stat: None,
            toc: Vec::new(),
        }
    }

    /// Create a document from file content
    pub fn from_file(path: PathBuf, content: &str, stat: Option<FileStat>) -> Self {
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        Self {
            id: DocumentId::new(),
            path: Some(path),
            content: ropey::Rope::from_str(content),
            display_name,
            modified: false,
            last_known_stat: stat,
            toc: Vec::new(),
        }
    }

    /// Get the document title for display (with modification indicator)
    pub fn title(&self) -> String {
        if self.modified {
            format!("• {}", self.display_name)
        } else {
            self.display_name.clone()
        }
    }

    /// Get the full title with path for tooltip
    pub fn full_title(&self) -> String {
        match &self.path {
            Some(p) => p.to_string_lossy().to_string(),
            None => self.display_name.clone(),
        }
    }

    /// Check if document has a file on disk
    pub fn has_file(&self) -> bool {
        self.path.is_some()
    }

    /// Directory relative assets resolve against
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
    }

    pub fn last_known_modified(&self) -> Option<SystemTime> {
        self.last_known_stat.and_then(|s| s.modified)
    }

    /// Get content as string
    pub fn content_str(&self) -> String {
        self.content.to_string()
    }

    /// Replace the content with a local edit; false when nothing changed
    pub fn set_content(&mut self, text: &str) -> bool {
        if self.content == text {
            return false;
        }
        self.content = ropey::Rope::from_str(text);
        self.modified = true;
        true
    }

    /// Mark the document as saved with the stat of the written file
    pub fn mark_saved(&mut self, stat: FileStat) {
        self.modified = false;
        self.last_known_stat = Some(stat);
    }

    /// Replace the content with what is on disk, dropping local edits
    pub fn reload(&mut self, content: &str, stat: FileStat) {
        self.content = ropey::Rope::from_str(content);
        self.modified = false;
        self.last_known_stat = Some(stat);
    }

    /// Snapshot for one render cycle
    pub fn render_request(&self) -> RenderRequest {
        RenderRequest {
            source: self.content_str(),
            base_dir: self.base_dir(),
            title: self.display_name.clone(),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Root application state
#[derive(Debug)]
pub struct ApplicationState {
    /// All open documents indexed by ID
    pub documents: HashMap<DocumentId, Document>,

    /// Tab bar state; its active tab is the active document
    pub tabs: TabState,

    /// Theme, font scale and page geometry
    pub presentation: PresentationState,

    /// Paginated preview
    pub pagination_enabled: bool,

    /// TOC sidebar visibility
    pub toc_visible: bool,

    /// Persisted embed widths keyed by image source
    pub image_widths: ImageWidths,

    /// Status bar message
    pub status_message: Option<StatusMessage>,

    /// Whether a quit has been requested
    pub quit_requested: bool,
}

impl ApplicationState {
    pub fn new(ui: &UiConfig) -> Self {
        Self {
            documents: HashMap::new(),
            tabs: TabState::new(),
            presentation: PresentationState {
                theme: ui.default_theme,
                ..PresentationState::default()
            },
            pagination_enabled: ui.pagination_enabled,
            toc_visible: ui.toc_visible,
            image_widths: ImageWidths::default(),
            status_message: None,
            quit_requested: false,
        }
    }

    pub fn active_document_id(&self) -> Option<DocumentId> {
        self.tabs.active_tab()
    }

    /// Get the currently active document
    pub fn active_document(&self) -> Option<&Document> {
        self.active_document_id()
            .and_then(|id| self.documents.get(&id))
    }

    /// Get the currently active document mutably
    pub fn active_document_mut(&mut self) -> Option<&mut Document> {
        self.active_document_id()
            .and_then(|id| self.documents.get_mut(&id))
    }

    /// Add a document and make it active
    ///
    /// A document whose path is already open is not added again; the
    /// existing tab is selected instead.
    pub fn add_document(&mut self, document: Document) -> DocumentId {
        if let Some(existing) = document
            .path
            .as_deref()
            .and_then(|p| self.find_document_by_path(p))
        {
            self.tabs.set_active(existing);
            return existing;
        }
        let id = document.id;
        self.tabs.add_tab(id, document.title());
        self.documents.insert(id, document);
        id
    }

    /// Close a document by ID
    pub fn close_document(&mut self, id: DocumentId) -> Option<Document> {
        self.tabs.remove_tab(id);
        self.documents.remove(&id)
    }

    /// Close every document, in tab order
    pub fn close_all(&mut self) -> Vec<Document> {
        self.tabs
            .clear()
            .into_iter()
            .filter_map(|id| self.documents.remove(&id))
            .collect()
    }

    /// Close every document except the active one
    pub fn close_others(&mut self) -> Vec<Document> {
        let Some(keep) = self.active_document_id() else {
            return Vec::new();
        };
        self.tabs
            .close_others(keep)
            .into_iter()
            .filter_map(|id| self.documents.remove(&id))
            .collect()
    }

    pub fn get_document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(&id)
    }

    pub fn get_document_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.get_mut(&id)
    }

    /// Find document by file path
    pub fn find_document_by_path(&self, path: &Path) -> Option<DocumentId> {
        self.documents
            .values()
            .find(|doc| doc.path.as_deref() == Some(path))
            .map(|doc| doc.id)
    }

    /// Paths of file-backed documents in tab order
    pub fn open_paths(&self) -> Vec<PathBuf> {
        self.tabs
            .document_ids()
            .into_iter()
            .filter_map(|id| self.documents.get(&id))
            .filter_map(|doc| doc.path.clone())
            .collect()
    }

    /// Keep the tab title in sync with the document's modified flag
    pub fn refresh_title(&mut self, id: DocumentId) {
        if let Some(title) = self.documents.get(&id).map(Document::title) {
            self.tabs.update_title(id, title);
        }
    }

    /// Check if any document has unsaved changes
    pub fn has_unsaved_changes(&self) -> bool {
        self.documents.values().any(|doc| doc.modified)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Set a status message
    pub fn set_status(&mut self, message: impl Into<String>, level: StatusLevel) {
        let text = message.into();
        match level {
            StatusLevel::Info => log::info!("{}", text),
            StatusLevel::Warning => log::warn!("{}", text),
            StatusLevel::Error => log::error!("{}", text),
        }
        self.status_message = Some(StatusMessage {
            text,
            level,
            timestamp: chrono::Local::now(),
        });
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }
}

impl Default for ApplicationState {
    fn default() -> Self {
        Self::new(&UiConfig::default())
    }
}

/// Status message for the status bar
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

/// Status message level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stat(secs: u64) -> FileStat {
        FileStat {
            modified: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(secs)),
            size: 4,
        }
    }

    #[test]
    fn test_document_new() {
        let doc = Document::new();
        assert!(doc.path.is_none());
        assert!(!doc.modified);
        assert_eq!(doc.display_name, "Untitled");
        assert_eq!(doc.base_dir(), None);
    }

    #[test]
    fn test_document_from_file() {
        let path = PathBuf::from("/test/file.md");
        let doc = Document::from_file(path.clone(), "# Hello\n\nWorld", Some(stat(1)));

        assert_eq!(doc.path, Some(path));
        assert_eq!(doc.display_name, "file.md");
        assert_eq!(doc.base_dir(), Some(PathBuf::from("/test")));
        assert_eq!(doc.last_known_modified(), stat(1).modified);
        assert_eq!(doc.render_request().source, "# Hello\n\nWorld");
    }

    #[test]
    fn test_edit_save_reload_cycle() {
        let mut doc = Document::from_file(PathBuf::from("/a.md"), "one", Some(stat(1)));
        assert!(!doc.set_content("one"));
        assert!(!doc.modified);

        assert!(doc.set_content("two"));
        assert_eq!(doc.title(), "• a.md");

        doc.mark_saved(stat(2));
        assert_eq!(doc.title(), "a.md");
        assert_eq!(doc.last_known_modified(), stat(2).modified);

        doc.set_content("local");
        doc.reload("disk", stat(3));
        assert_eq!(doc.content_str(), "disk");
        assert!(!doc.modified);
    }

    #[test]
    fn test_reopening_a_path_selects_existing_tab() {
        let mut state = ApplicationState::default();
        let a = state.add_document(Document::from_file(PathBuf::from("/a.md"), "", None));
        let b = state.add_document(Document::from_file(PathBuf::from("/b.md"), "", None));
        assert_eq!(state.active_document_id(), Some(b));

        let again = state.add_document(Document::from_file(PathBuf::from("/a.md"), "", None));
        assert_eq!(again, a);
        assert_eq!(state.document_count(), 2);
        assert_eq!(state.active_document_id(), Some(a));
    }

    #[test]
    fn test_close_variants() {
        let mut state = ApplicationState::default();
        let ids: Vec<DocumentId> = ["/a.md", "/b.md", "/c.md"]
            .iter()
            .map(|p| state.add_document(Document::from_file(PathBuf::from(p), "", None)))
            .collect();

        state.tabs.set_active(ids[1]);
        assert!(state.close_document(ids[1]).is_some());
        assert_eq!(state.active_document_id(), Some(ids[2]));

        let closed = state.close_others();
        assert_eq!(closed.len(), 1);
        assert_eq!(state.open_paths(), vec![PathBuf::from("/c.md")]);

        assert_eq!(state.close_all().len(), 1);
        assert!(state.active_document().is_none());
    }

    #[test]
    fn test_unsaved_changes_and_titles() {
        let mut state = ApplicationState::default();
        let id = state.add_document(Document::new());
        assert!(!state.has_unsaved_changes());

        if let Some(doc) = state.get_document_mut(id) {
            doc.set_content("# Draft");
        }
        state.refresh_title(id);
        assert!(state.has_unsaved_changes());
        assert_eq!(state.tabs.tabs[0].title, "• Untitled");
    }
}
