//! Dialog collaborator
//!
//! Save/open pickers, error reporting and conflict prompts are provided
//! by the host. Cancelling a picker is a normal outcome, not an error.

use crate::file_handler::{ConflictResolution, FileConflict};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait Dialogs: Send + Sync {
    /// Destination for a PDF export; `None` when the user cancels
    async fn pick_pdf_destination(&self, suggested: &Path) -> Option<PathBuf>;

    /// Markdown files to open; empty when the user cancels
    async fn pick_open_files(&self) -> Vec<PathBuf>;

    /// Blocking error report
    async fn show_error(&self, title: &str, message: &str);

    /// Choice between reloading and keeping local edits of a dirty document
    async fn resolve_conflict(&self, conflict: &FileConflict) -> ConflictResolution;
}

/// Non-interactive dialogs for the command line host
///
/// The PDF destination comes from the command line; conflicts keep the
/// local edits so nothing is lost without confirmation.
#[derive(Debug, Clone, Default)]
pub struct CliDialogs {
    pdf_destination: Option<PathBuf>,
}

impl CliDialogs {
    pub fn new(pdf_destination: Option<PathBuf>) -> Self {
        Self { pdf_destination }
    }
}

#[async_trait]
impl Dialogs for CliDialogs {
    async fn pick_pdf_destination(&self, suggested: &Path) -> Option<PathBuf> {
        log::debug!("Suggested PDF destination: {}", suggested.display());
        self.pdf_destination.clone()
    }

    async fn pick_open_files(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    async fn show_error(&self, title: &str, message: &str) {
        log::error!("{}: {}", title, message);
        eprintln!("{}: {}", title, message);
    }

    async fn resolve_conflict(&self, conflict: &FileConflict) -> ConflictResolution {
        log::warn!(
            "{} changed on disk while it has unsaved edits; keeping local changes",
            conflict.path.display()
        );
        ConflictResolution::KeepLocal
    }
}
