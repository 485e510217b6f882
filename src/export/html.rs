//! Standalone HTML output and export path suggestions

use crate::error::FileResult;
use crate::file_handler::write_file_atomic;
use crate::render::ViewDom;
use std::path::{Path, PathBuf};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Html,
    Pdf,
}

impl ExportFormat {
    /// Get the file extension for the format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// Get display name for the format
    pub fn display_name(&self) -> &'static str {
        match self {
            ExportFormat::Html => "HTML",
            ExportFormat::Pdf => "PDF",
        }
    }
}

/// Generate suggested output path from input path
///
/// Untitled documents get `<name>.<ext>` in the working directory.
pub fn suggest_output_path(input_path: Option<&Path>, display_name: &str, format: ExportFormat) -> PathBuf {
    let stem = input_path
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .or_else(|| Path::new(display_name).file_stem().and_then(|s| s.to_str()))
        .filter(|s| !s.is_empty())
        .unwrap_or("document");

    let mut output = input_path
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())
        .unwrap_or_default();

    output.push(format!("{}.{}", stem, format.extension()));
    output
}

/// Write the rendered view as a standalone HTML document
pub async fn write_html(view: &ViewDom, path: &Path) -> FileResult<()> {
    let html = view.to_output_html();
    write_file_atomic(path, &html).await?;
    log::info!("Wrote HTML to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_output_path() {
        let input = PathBuf::from("/home/user/notes/readme.md");
        assert_eq!(
            suggest_output_path(Some(&input), "readme.md", ExportFormat::Pdf),
            PathBuf::from("/home/user/notes/readme.pdf")
        );
        assert_eq!(
            suggest_output_path(None, "Untitled", ExportFormat::Html),
            PathBuf::from("Untitled.html")
        );
        assert_eq!(
            suggest_output_path(None, "", ExportFormat::Pdf),
            PathBuf::from("document.pdf")
        );
    }

    #[tokio::test]
    async fn test_write_html_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.html");
        let mut view = ViewDom::new();
        let article = view.article();
        view.set_inner_html(article, r#"<p>hello <img src="printdown:///docs/a.png"></p>"#);

        write_html(&view, &path).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
        assert!(written.contains(r#"<p>hello <img src="file:///docs/a.png"></p>"#));
    }
}
