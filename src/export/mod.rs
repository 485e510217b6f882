//! PDF export
//!
//! The orchestrator captures the live view, not a re-render of the
//! source, so the PDF shows exactly what is on screen. Ordering:
//!
//! 1. Pick a destination (cancel returns `Ok(None)`)
//! 2. Inject the print override for the current theme
//! 3. Await the completion gate again
//! 4. Relax the scroll-view layout
//! 5. Print with explicit page geometry
//! 6. Undo 4 and 2 (guards, on every path)
//! 7. Write the bytes and verify the file is non-empty

pub mod browser;
pub mod guards;
pub mod html;

pub use browser::HeadlessBrowserPrinter;
pub use guards::{LayoutRelaxGuard, ThemeOverrideGuard};
pub use html::{suggest_output_path, write_html, ExportFormat};

use crate::dialogs::Dialogs;
use crate::error::{ExportError, ExportResult};
use crate::presentation::page::MarginsIn;
use crate::presentation::{PageSettings, PageSize, PresentationState};
use crate::render::{RenderContext, RenderingGate, ViewDom};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Page geometry handed to the print primitive
///
/// These options are the single source of page geometry: the primitive
/// must not also honour stylesheet `@page` rules.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfPageOptions {
    pub page_size: PageSize,
    pub landscape: bool,
    /// Page box in inches, orientation applied
    pub width_in: f64,
    pub height_in: f64,
    pub margins: MarginsIn,
    pub print_background: bool,
    pub prefer_css_page_size: bool,
}

impl PdfPageOptions {
    pub fn from_settings(settings: &PageSettings) -> ExportResult<Self> {
        settings.validate()?;
        let (width_in, height_in) = settings.page_box_in();
        Ok(Self {
            page_size: settings.size,
            landscape: settings.is_landscape(),
            width_in,
            height_in,
            margins: settings.margins_in()?,
            print_background: true,
            prefer_css_page_size: false,
        })
    }

    /// The options as a CSS `@page` rule
    pub fn page_rule(&self) -> String {
        format!(
            "@page {{ size: {}in {}in; margin: {}in {}in {}in {}in; }}",
            self.width_in,
            self.height_in,
            self.margins.top,
            self.margins.right,
            self.margins.bottom,
            self.margins.left
        )
    }
}

/// Host print-to-PDF primitive, consumed once per export
#[async_trait]
pub trait PrintToPdf: Send + Sync {
    async fn print_to_pdf(&self, html: &str, options: &PdfPageOptions) -> ExportResult<Vec<u8>>;
}

/// What is being exported
#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub path: Option<PathBuf>,
    pub display_name: String,
}

#[derive(Clone)]
pub struct PdfExportOrchestrator {
    gate: RenderingGate,
    printer: Arc<dyn PrintToPdf>,
    dialogs: Arc<dyn Dialogs>,
    engine_timeout: Duration,
}

impl PdfExportOrchestrator {
    pub fn new(
        gate: RenderingGate,
        printer: Arc<dyn PrintToPdf>,
        dialogs: Arc<dyn Dialogs>,
        engine_timeout: Duration,
    ) -> Self {
        Self {
            gate,
            printer,
            dialogs,
            engine_timeout,
        }
    }

    /// Export the live view; `Ok(None)` when the user cancels
    ///
    /// Failures are reported through the error dialog before being
    /// returned.
    pub async fn export_to_pdf(
        &self,
        view: &mut ViewDom,
        document: &ExportDocument,
        presentation: &PresentationState,
    ) -> ExportResult<Option<PathBuf>> {
        let suggested =
            suggest_output_path(document.path.as_deref(), &document.display_name, ExportFormat::Pdf);
        let Some(destination) = self.dialogs.pick_pdf_destination(&suggested).await else {
            log::info!("PDF export cancelled");
            return Ok(None);
        };

        match self.capture_and_write(view, presentation, &destination).await {
            Ok(()) => {
                log::info!("Exported {} to {}", document.display_name, destination.display());
                Ok(Some(destination))
            }
            Err(e) => {
                log::error!("PDF export failed: {}", e);
                self.dialogs
                    .show_error("PDF Export Failed", &e.user_message())
                    .await;
                Err(e)
            }
        }
    }

    async fn capture_and_write(
        &self,
        view: &mut ViewDom,
        presentation: &PresentationState,
        destination: &Path,
    ) -> ExportResult<()> {
        let options = PdfPageOptions::from_settings(&presentation.page)?;
        let ctx = RenderContext {
            diagram_theme: presentation.diagram_theme(),
            engine_timeout: self.engine_timeout,
        };

        let bytes = {
            let mut themed = ThemeOverrideGuard::inject(view, presentation.theme);
            let article = themed.article();
            let report = self
                .gate
                .await_rendering_settled(&mut themed, article, &ctx)
                .await;
            if report.failed() > 0 {
                log::warn!("Exporting with {} unrendered item(s)", report.failed());
            }

            let relaxed = LayoutRelaxGuard::relax(&mut themed);
            let snapshot = relaxed.to_output_html();
            self.printer.print_to_pdf(&snapshot, &options).await
        }?;

        if bytes.is_empty() {
            return Err(ExportError::EmptyOutput);
        }
        write_pdf(destination, &bytes).await
    }
}

async fn write_pdf(path: &Path, bytes: &[u8]) -> ExportResult<()> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| ExportError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;

    let written = tokio::fs::metadata(path)
        .await
        .map(|meta| meta.len())
        .unwrap_or(0);
    if written == 0 {
        return Err(ExportError::NotWritten {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
