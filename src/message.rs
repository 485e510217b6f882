//! Application message types
//!
//! Defines all messages that can be sent to the application's update function.
//! Messages are organized by category for clear handling and routing.

use crate::file_handler::WatchEvent;
use crate::presentation::{PageSettings, Theme};
use crate::render::{RenderToken, RenderedView};
use crate::state::DocumentId;
use std::path::PathBuf;

/// Main application message enum
#[derive(Debug, Clone)]
pub enum Message {
    /// File operations
    File(FileMessage),

    /// Tab operations
    Tab(TabMessage),

    /// Local edits of document content
    Editor(EditorMessage),

    /// Presentation and layout
    View(ViewMessage),

    /// Process-level events
    System(SystemMessage),

    /// Internal async operation results
    Internal(InternalMessage),

    /// No-op message
    None,
}

/// File-related messages
#[derive(Debug, Clone)]
pub enum FileMessage {
    /// Open files (shows file picker)
    Open,

    /// Open specific file paths
    OpenPaths(Vec<PathBuf>),

    /// Save the active document
    Save,

    /// Export the active document to PDF
    ExportPdf,

    /// Something happened to a watched file
    ExternalChange(WatchEvent),
}

/// Tab-related messages
#[derive(Debug, Clone)]
pub enum TabMessage {
    Select(DocumentId),
    Close(DocumentId),
    CloseCurrent,
    CloseAll,
    CloseOthers,
    Next,
    Previous,
}

/// Editor messages
#[derive(Debug, Clone)]
pub enum EditorMessage {
    /// The full text of a document after a local edit
    TextChanged {
        document_id: DocumentId,
        text: String,
    },

    /// Live resize of an embedded image, in percent
    ResizeImage { src: String, percent: f64 },

    /// Reset an embedded image to its natural width
    ResetImage { src: String },
}

/// Presentation messages
#[derive(Debug, Clone)]
pub enum ViewMessage {
    FontIncrease,
    FontDecrease,
    FontReset,
    ImageIncrease,
    ImageDecrease,
    ImageReset,
    SetTheme(Theme),
    SetPageSettings(PageSettings),
    ToggleToc,
    TogglePagePreview,
}

/// System-level messages
#[derive(Debug, Clone)]
pub enum SystemMessage {
    /// Persist the session and stop the run loop
    Quit,

    /// Report an error in the status bar
    Error(String),

    ClearStatus,
}

/// Internal messages for async operations
#[derive(Debug, Clone)]
pub enum InternalMessage {
    /// The debounce window after an edit elapsed
    EditSettled {
        document_id: DocumentId,
        generation: u64,
    },

    /// A render cycle finished; committed only if `token` is still current
    RenderFinished {
        token: RenderToken,
        rendered: Box<RenderedView>,
    },

    /// The settle delay after a presentation change elapsed
    RepaginateDue { generation: u64 },
}
