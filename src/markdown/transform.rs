//! Markdown to HTML

use super::assets::rewrite_image_sources;
use super::math::{extract_math, restore_math, PendingMathSpan};
use crate::dom::{escape_text, Dom};
use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag};
use std::path::Path;

/// Diagram engines a fenced block can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramKind {
    /// ```` ```mermaid ````
    Flow,
    /// ```` ```uml-sequence-diagram ````
    Sequence,
}

impl DiagramKind {
    pub fn from_language(language: &str) -> Option<Self> {
        match language {
            "mermaid" => Some(DiagramKind::Flow),
            "uml-sequence-diagram" => Some(DiagramKind::Sequence),
            _ => None,
        }
    }

    pub fn language(&self) -> &'static str {
        match self {
            DiagramKind::Flow => "mermaid",
            DiagramKind::Sequence => "uml-sequence-diagram",
        }
    }

    /// Value of the `data-diagram-kind` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramKind::Flow => "flow",
            DiagramKind::Sequence => "sequence",
        }
    }

    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "flow" => Some(DiagramKind::Flow),
            "sequence" => Some(DiagramKind::Sequence),
            _ => None,
        }
    }

    /// Class of the rendering target that replaces the code block
    pub fn target_class(&self) -> &'static str {
        match self {
            DiagramKind::Flow => "mermaid-diagram",
            DiagramKind::Sequence => "uml-sequence-diagram",
        }
    }
}

/// A fenced diagram block, emitted as a tagged `pre` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDiagramBlock {
    pub id: usize,
    pub kind: DiagramKind,
    pub source: String,
}

/// Result of one transform
#[derive(Debug, Clone, Default)]
pub struct TransformOutput {
    pub html: String,
    pub math: Vec<PendingMathSpan>,
    pub diagrams: Vec<PendingDiagramBlock>,
}

/// Markdown transform with the viewer's parser options
#[derive(Debug, Clone)]
pub struct MarkdownTransform {
    options: Options,
}

impl Default for MarkdownTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownTransform {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);

        Self { options }
    }

    /// Convert `source` to HTML
    ///
    /// When `base_dir` is given, relative image sources are rewritten to
    /// resource locators under it.
    pub fn transform(&self, source: &str, base_dir: Option<&Path>) -> TransformOutput {
        let extraction = extract_math(source);
        let mut diagrams = Vec::new();
        let events = map_events(Parser::new_ext(&extraction.text, self.options), &mut diagrams);

        let mut body = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut body, events.into_iter());
        let mut html = restore_math(&body, &extraction.spans);

        if let Some(base_dir) = base_dir {
            let mut dom = Dom::new();
            let root = dom.root();
            dom.append_html(root, &html);
            if rewrite_image_sources(&mut dom, root, base_dir) > 0 {
                html = dom.inner_html(root);
            }
        }

        log::debug!(
            "Transformed {} bytes: {} math spans, {} diagrams",
            source.len(),
            extraction.spans.len(),
            diagrams.len()
        );

        TransformOutput {
            html,
            math: extraction.spans,
            diagrams,
        }
    }
}

/// Soft breaks become hard breaks; diagram fences become tagged `pre` blocks
fn map_events<'a>(
    parser: Parser<'a, '_>,
    diagrams: &mut Vec<PendingDiagramBlock>,
) -> Vec<Event<'a>> {
    let mut events = Vec::new();
    let mut open_diagram: Option<(DiagramKind, String)> = None;

    for event in parser {
        if let Some(kind) = diagram_start(&event) {
            open_diagram = Some((kind, String::new()));
            continue;
        }
        match event {
            Event::Text(text) if open_diagram.is_some() => {
                if let Some((_, source)) = open_diagram.as_mut() {
                    source.push_str(&text);
                }
            }
            Event::End(Tag::CodeBlock(_)) if open_diagram.is_some() => {
                if let Some((kind, source)) = open_diagram.take() {
                    let id = diagrams.len();
                    events.push(Event::Html(diagram_block_html(id, kind, &source).into()));
                    diagrams.push(PendingDiagramBlock { id, kind, source });
                }
            }
            Event::SoftBreak => events.push(Event::HardBreak),
            other => events.push(other),
        }
    }
    events
}

fn diagram_start(event: &Event<'_>) -> Option<DiagramKind> {
    match event {
        Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
            DiagramKind::from_language(info.split_whitespace().next().unwrap_or(""))
        }
        _ => None,
    }
}

fn diagram_block_html(id: usize, kind: DiagramKind, source: &str) -> String {
    format!(
        "<pre data-diagram-id=\"{}\" data-diagram-kind=\"{}\"><code class=\"language-{}\">{}</code></pre>\n",
        id,
        kind.as_str(),
        kind.language(),
        escape_text(source)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform(source: &str) -> TransformOutput {
        MarkdownTransform::new().transform(source, None)
    }

    #[test]
    fn test_basic_round_trip() {
        let output = transform("# Title\n\nSome $x^2$ math.\n");
        assert!(output.html.contains("<h1>Title</h1>"));
        assert_eq!(output.math.len(), 1);
        assert_eq!(output.html.matches("data-math-id=").count(), 1);
        assert!(output
            .html
            .contains("<span class=\"math-inline\" data-math-id=\"0\">$x^2$</span>"));
    }

    #[test]
    fn test_math_after_inequality_is_rendered() {
        let output = transform("For x<y we know $z$.\n> note\n");
        assert_eq!(output.math.len(), 1);
        assert!(output.html.contains("x&lt;y"));
        assert!(output
            .html
            .contains("<span class=\"math-inline\" data-math-id=\"0\">$z$</span>"));
    }

    #[test]
    fn test_math_survives_emphasis_and_tables() {
        let output = transform("| a | b |\n|---|---|\n| $x|y$ | $a_1 * b_2 * c_3$ |\n");
        assert!(output.html.contains("<table>"));
        assert!(output.html.contains("$x|y$"));
        assert!(output.html.contains("$a_1 * b_2 * c_3$"));
        assert!(!output.html.contains("<em>"));
    }

    #[test]
    fn test_display_math_block() {
        let output = transform("Text\n\n$$\n\\int_0^1 f\n$$\n");
        assert_eq!(output.math.len(), 1);
        assert!(output.math[0].display);
        assert!(output.html.contains("class=\"math-display\""));
        assert!(output.html.contains("$$\n\\int_0^1 f\n$$"));
    }

    #[test]
    fn test_math_inside_code_is_literal() {
        let output = transform("Use `$PATH` here.\n\n    $indented$\n");
        assert!(output.math.iter().all(|span| span.tex != "PATH"));
        assert!(output.html.contains("<code>$PATH</code>"));
        assert!(output.html.contains("$indented$"));
        assert!(!output.html.contains("pd-math"));
    }

    #[test]
    fn test_diagram_blocks_are_tagged() {
        let source = "```mermaid\ngraph TD; A-->B\n```\n\n```uml-sequence-diagram\nA->B: hi\n```\n\n```rust\nfn main() {}\n```\n";
        let output = transform(source);
        assert_eq!(output.diagrams.len(), 2);
        assert_eq!(output.diagrams[0].kind, DiagramKind::Flow);
        assert_eq!(output.diagrams[0].source, "graph TD; A-->B\n");
        assert_eq!(output.diagrams[1].kind, DiagramKind::Sequence);
        assert!(output.html.contains(
            "<pre data-diagram-id=\"0\" data-diagram-kind=\"flow\"><code class=\"language-mermaid\">graph TD; A--&gt;B\n</code></pre>"
        ));
        assert!(output.html.contains("<code class=\"language-rust\">"));
    }

    #[test]
    fn test_placeholder_uniqueness_math_and_diagrams() {
        let source = "$a$ and $$b$$\n\n```mermaid\ngraph LR; X-->Y\n```\n\n\\[c\\]\n";
        let output = transform(source);
        assert_eq!(output.math.len(), 3);
        assert_eq!(output.diagrams.len(), 1);
        for span in &output.math {
            let marker = format!("data-math-id=\"{}\"", span.id);
            assert_eq!(output.html.matches(&marker).count(), 1);
        }
        assert_eq!(output.html.matches("data-diagram-id=\"0\"").count(), 1);
    }

    #[test]
    fn test_soft_breaks_are_hard() {
        let output = transform("line one\nline two\n");
        assert!(output.html.contains("line one<br />"));
    }

    #[test]
    fn test_relative_images_rewritten_with_base() {
        let output = MarkdownTransform::new().transform(
            "![alt](img/a.png)\n\n<img src=\"b.png\">\n",
            Some(Path::new("/docs")),
        );
        assert!(output.html.contains("src=\"printdown:///docs/img/a.png\""));
        assert!(output.html.contains("src=\"printdown:///docs/b.png\""));
    }

    #[test]
    fn test_untitled_documents_keep_relative_images() {
        let output = transform("![alt](a.png)\n");
        assert!(output.html.contains("src=\"a.png\""));
    }
}
