//! Headless-browser print primitive
//!
//! The browser CLI has no page geometry flags, so the explicit
//! [`PdfPageOptions`] are written into the snapshot as its only `@page`
//! rule before printing.

use super::{PdfPageOptions, PrintToPdf};
use crate::config::ExportConfig;
use crate::error::{ExportError, ExportResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use uuid::Uuid;

pub const PAGE_GEOMETRY_ID: &str = "pd-page-geometry";

#[derive(Debug, Clone)]
pub struct HeadlessBrowserPrinter {
    command: String,
    args: Vec<String>,
    temp_dir: PathBuf,
}

impl HeadlessBrowserPrinter {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            temp_dir: std::env::temp_dir(),
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(config.browser_command.clone(), config.browser_args.clone())
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    async fn run(&self, html_path: &Path, pdf_path: &Path) -> ExportResult<Vec<u8>> {
        let output = Command::new(&self.command)
            .args(&self.args)
            .arg("--headless")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", pdf_path.display()))
            .arg(html_path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ExportError::PrintFailed(format!("{}: {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ExportError::PrintFailed(if stderr.is_empty() {
                format!("{} exited with {}", self.command, output.status)
            } else {
                stderr
            }));
        }

        tokio::fs::read(pdf_path)
            .await
            .map_err(|e| ExportError::PrintFailed(format!("no PDF produced: {}", e)))
    }
}

/// Insert the `@page` rule as the last stylesheet of the document head
pub fn with_page_rule(html: &str, options: &PdfPageOptions) -> String {
    let style = format!(
        "<style id=\"{}\">{}</style>",
        PAGE_GEOMETRY_ID,
        options.page_rule()
    );
    match html.find("</head>") {
        Some(index) => format!("{}{}{}", &html[..index], style, &html[index..]),
        None => format!("{}{}", style, html),
    }
}

#[async_trait]
impl PrintToPdf for HeadlessBrowserPrinter {
    async fn print_to_pdf(&self, html: &str, options: &PdfPageOptions) -> ExportResult<Vec<u8>> {
        let stem = format!("printdown-{}", Uuid::new_v4());
        let html_path = self.temp_dir.join(format!("{}.html", stem));
        let pdf_path = self.temp_dir.join(format!("{}.pdf", stem));

        tokio::fs::write(&html_path, with_page_rule(html, options))
            .await
            .map_err(|e| ExportError::PrintFailed(format!("could not write snapshot: {}", e)))?;

        log::debug!("Printing {} with {}", html_path.display(), self.command);
        let result = self.run(&html_path, &pdf_path).await;

        for path in [&html_path, &pdf_path] {
            if let Err(e) = tokio::fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Could not remove {}: {}", path.display(), e);
                }
            }
        }
        result
    }
}
