//! Markdown module for Printdown
//!
//! Turns Markdown source into HTML for the view:
//! - Math placeholder protocol (math survives the Markdown parser intact)
//! - Diagram fence tagging
//! - Relative asset path rewriting
//! - Table of contents from rendered headings

pub mod assets;
pub mod math;
pub mod toc;
pub mod transform;

pub use assets::{is_absolute_src, resolve_asset, resource_file_url, rewrite_image_sources, ASSET_SCHEME};
pub use math::{extract_math, restore_math, MathDelimiter, MathExtraction, PendingMathSpan};
pub use toc::{collect_headings, render_toc, TocEntry};
pub use transform::{DiagramKind, MarkdownTransform, PendingDiagramBlock, TransformOutput};
