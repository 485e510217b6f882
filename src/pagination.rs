//! Paginated preview
//!
//! Splits the settled article into page boxes sized from the page
//! settings. Pages hold deep copies of the article's top-level blocks;
//! the article itself is only hidden, never moved, so continuous mode is
//! restored by dropping the pages and showing the article again.

use crate::dom::{Dom, NodeId};
use crate::error::ExportResult;
use crate::presentation::page::CSS_DPI;
use crate::presentation::PresentationState;
use crate::render::{RenderContext, RenderingGate, ViewDom};
use std::sync::Arc;

pub const PAGES_CLASS: &str = "pagedjs_pages";
pub const PAGE_CLASS: &str = "pagedjs_page";
pub const PAGE_CONTENT_CLASS: &str = "pagedjs_page_content";
pub const PAGE_NUMBER_ATTR: &str = "data-page-number";

/// Estimates the rendered height of a block
pub trait LayoutMeasurer: Send + Sync {
    /// Height in CSS pixels of `node` laid out at `width_px`
    fn block_height(&self, dom: &Dom, node: NodeId, width_px: f64, font_size_px: f64) -> f64;
}

/// Text-metrics estimate: average glyph width and line height per block type
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMeasurer;

const LINE_HEIGHT: f64 = 1.6;
const GLYPH_WIDTH: f64 = 0.5;
const BLOCK_MARGIN: f64 = 16.0;
const EMBED_HEIGHT: f64 = 320.0;

fn text_lines(text: &str, width_px: f64, font_px: f64) -> f64 {
    let per_line = (width_px / (font_px * GLYPH_WIDTH)).max(1.0);
    text.lines()
        .map(|line| (line.chars().count() as f64 / per_line).ceil().max(1.0))
        .sum::<f64>()
        .max(1.0)
}

fn heading_scale(tag: &str) -> Option<f64> {
    match tag {
        "h1" => Some(2.0),
        "h2" => Some(1.5),
        "h3" => Some(1.25),
        "h4" => Some(1.0),
        "h5" => Some(0.875),
        "h6" => Some(0.85),
        _ => None,
    }
}

impl LayoutMeasurer for HeuristicMeasurer {
    fn block_height(&self, dom: &Dom, node: NodeId, width_px: f64, font_px: f64) -> f64 {
        let Some(element) = dom.element(node) else {
            let text = dom.text_content(node);
            if text.trim().is_empty() {
                return 0.0;
            }
            return text_lines(&text, width_px, font_px) * font_px * LINE_HEIGHT;
        };

        let text = dom.text_content(node);
        let embeds = dom
            .select(node, |e| {
                e.is("img")
                    || e.is("svg")
                    || e.has_class("mermaid-diagram")
                    || e.has_class("uml-sequence-diagram")
            })
            .len() as f64
            + if element.is("img") { 1.0 } else { 0.0 };
        let embed_height = embeds * EMBED_HEIGHT;

        if let Some(scale) = heading_scale(&element.tag) {
            let size = font_px * scale;
            return text_lines(&text, width_px, size) * size * 1.25 + BLOCK_MARGIN * 1.5;
        }

        match element.tag.as_str() {
            "hr" => BLOCK_MARGIN * 3.0,
            "pre" => {
                let size = font_px * 0.85;
                let lines = text.lines().count().max(1) as f64;
                lines * size * 1.45 + BLOCK_MARGIN * 3.0
            }
            "table" => {
                let rows = dom.select(node, |e| e.is("tr")).len().max(1) as f64;
                rows * (font_px * LINE_HEIGHT + 13.0) + BLOCK_MARGIN * 2.0
            }
            "ul" | "ol" => {
                let items = dom.select(node, |e| e.is("li")).len() as f64;
                text_lines(&text, width_px * 0.9, font_px) * font_px * LINE_HEIGHT
                    + items * 4.0
                    + embed_height
                    + BLOCK_MARGIN * 2.0
            }
            _ => {
                let body = if text.trim().is_empty() {
                    0.0
                } else {
                    text_lines(&text, width_px, font_px) * font_px * LINE_HEIGHT
                };
                body + embed_height + BLOCK_MARGIN * 2.0
            }
        }
    }
}

#[derive(Clone)]
pub struct Paginator {
    measurer: Arc<dyn LayoutMeasurer>,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(Arc::new(HeuristicMeasurer))
    }
}

impl Paginator {
    pub fn new(measurer: Arc<dyn LayoutMeasurer>) -> Self {
        Self { measurer }
    }

    /// Lay the article out into pages; returns the page count
    ///
    /// Awaits the completion gate first. Running it again replaces the
    /// previous pages.
    pub async fn paginate(
        &self,
        view: &mut ViewDom,
        gate: &RenderingGate,
        ctx: &RenderContext,
        presentation: &PresentationState,
    ) -> ExportResult<usize> {
        let article = view.article();
        gate.await_rendering_settled(view, article, ctx).await;

        let (content_w, content_h) = presentation.page.content_box_px()?;
        let (page_w_in, page_h_in) = presentation.page.page_box_in();
        let font_px = presentation.font_size_px() as f64;

        remove_pages(view);

        let blocks: Vec<NodeId> = view
            .children(article)
            .iter()
            .copied()
            .filter(|node| view.element(*node).is_some() || !view.text_content(*node).trim().is_empty())
            .collect();

        let content = view.content();
        let pages = view.create_element_with("div", &[("class", PAGES_CLASS)]);
        view.insert_before(content, pages, article);

        let article_style = view.attr(article, "style").map(str::to_string);
        let page_style = format!(
            "width: {}px; height: {}px;",
            round_px(page_w_in * CSS_DPI),
            round_px(page_h_in * CSS_DPI)
        );
        let new_page = |view: &mut ViewDom, number: usize| -> NodeId {
            let number = number.to_string();
            let page = view.create_element_with(
                "div",
                &[
                    ("class", PAGE_CLASS),
                    (PAGE_NUMBER_ATTR, number.as_str()),
                    ("style", page_style.as_str()),
                ],
            );
            view.append_child(pages, page);
            let body = view.create_element_with("div", &[("class", PAGE_CONTENT_CLASS)]);
            if let Some(style) = article_style.as_deref() {
                view.set_attr(body, "style", style);
                view.remove_style_property(body, "display");
            }
            view.set_style_property(body, "width", &format!("{}px", round_px(content_w)));
            view.append_child(page, body);
            body
        };

        let mut count = 1;
        let mut current = new_page(view, count);
        let mut used = 0.0;

        for block in blocks {
            let height = self.measurer.block_height(view, block, content_w, font_px);
            if used > 0.0 && used + height > content_h {
                count += 1;
                current = new_page(view, count);
                used = 0.0;
            }
            let copy = view.deep_clone(block);
            view.append_child(current, copy);
            used += height;
        }

        view.set_style_property(article, "display", "none");
        log::debug!("Paginated into {} page(s) at {}", count, presentation.page);
        Ok(count)
    }

    /// Back to continuous mode
    pub fn unpaginate(&self, view: &mut ViewDom) {
        remove_pages(view);
        let article = view.article();
        view.remove_style_property(article, "display");
    }
}

fn round_px(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn remove_pages(view: &mut ViewDom) {
    let content = view.content();
    for pages in view.select(content, |e| e.has_class(PAGES_CLASS)) {
        view.remove(pages);
    }
}

pub fn is_paginated(view: &ViewDom) -> bool {
    view.select_first(view.content(), |e| e.has_class(PAGES_CLASS))
        .is_some()
}

pub fn page_count(view: &ViewDom) -> usize {
    view.select(view.content(), |e| e.has_class(PAGE_CLASS)).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{Orientation, PageSettings};
    use crate::render::Engines;
    use std::time::Duration;

    /// Every block is 100px tall
    struct FixedMeasurer;

    impl LayoutMeasurer for FixedMeasurer {
        fn block_height(&self, _dom: &Dom, _node: NodeId, _w: f64, _f: f64) -> f64 {
            100.0
        }
    }

    fn gate() -> RenderingGate {
        RenderingGate::new(&Engines::default(), Duration::from_millis(1))
    }

    fn view_with_paragraphs(count: usize) -> ViewDom {
        let mut view = ViewDom::new();
        let article = view.article();
        let html: String = (0..count).map(|i| format!("<p>para {}</p>", i)).collect();
        view.set_inner_html(article, &html);
        view.set_style_property(article, "color", "#123456");
        view
    }

    #[tokio::test]
    async fn test_paginate_splits_by_content_height() {
        // Letter portrait with 0.75in margins: 9.5in = 912px of content
        let mut view = view_with_paragraphs(20);
        let paginator = Paginator::new(Arc::new(FixedMeasurer));
        let presentation = PresentationState::default();
        let pages = paginator
            .paginate(&mut view, &gate(), &RenderContext::default(), &presentation)
            .await
            .unwrap();

        assert_eq!(pages, 3);
        assert_eq!(page_count(&view), 3);
        let article = view.article();
        assert_eq!(view.style_property(article, "display").as_deref(), Some("none"));
        assert_eq!(view.children(article).len(), 20);

        let first = view.select_first(view.content(), |e| e.has_class(PAGE_CONTENT_CLASS)).unwrap();
        assert_eq!(view.children(first).len(), 9);
        assert_eq!(view.style_property(first, "color").as_deref(), Some("#123456"));
    }

    #[tokio::test]
    async fn test_repaginate_replaces_pages() {
        let mut view = view_with_paragraphs(5);
        let paginator = Paginator::new(Arc::new(FixedMeasurer));
        let mut presentation = PresentationState::default();
        paginator
            .paginate(&mut view, &gate(), &RenderContext::default(), &presentation)
            .await
            .unwrap();

        presentation.page = PageSettings {
            orientation: Orientation::Landscape,
            ..PageSettings::default()
        };
        // Landscape: 7in = 672px of content, 6 blocks per page
        let pages = paginator
            .paginate(&mut view, &gate(), &RenderContext::default(), &presentation)
            .await
            .unwrap();
        assert_eq!(pages, 1);
        assert_eq!(view.select(view.content(), |e| e.has_class(PAGES_CLASS)).len(), 1);
    }

    #[tokio::test]
    async fn test_unpaginate_restores_article() {
        let mut view = view_with_paragraphs(3);
        let before = view.article_html();
        let paginator = Paginator::default();
        paginator
            .paginate(&mut view, &gate(), &RenderContext::default(), &PresentationState::default())
            .await
            .unwrap();
        assert!(is_paginated(&view));

        paginator.unpaginate(&mut view);
        assert!(!is_paginated(&view));
        let article = view.article();
        assert_eq!(view.style_property(article, "display"), None);
        assert_eq!(view.article_html(), before);
    }

    #[tokio::test]
    async fn test_empty_article_gets_one_page() {
        let mut view = ViewDom::new();
        let pages = Paginator::default()
            .paginate(&mut view, &gate(), &RenderContext::default(), &PresentationState::default())
            .await
            .unwrap();
        assert_eq!(pages, 1);
    }

    #[tokio::test]
    async fn test_bad_margins_fail_without_touching_view() {
        let mut view = view_with_paragraphs(2);
        let mut presentation = PresentationState::default();
        presentation.page.margins = crate::presentation::Margins::uniform("6in");
        let result = Paginator::default()
            .paginate(&mut view, &gate(), &RenderContext::default(), &presentation)
            .await;
        assert!(result.is_err());
        assert!(!is_paginated(&view));
    }

    #[test]
    fn test_heuristic_heights_grow_with_text() {
        let mut dom = Dom::new();
        let root = dom.root();
        dom.append_html(root, "<p>short</p>");
        dom.append_html(root, &format!("<p>{}</p>", "word ".repeat(400)));
        let blocks = dom.children(root).to_vec();
        let short = HeuristicMeasurer.block_height(&dom, blocks[0], 600.0, 16.0);
        let long = HeuristicMeasurer.block_height(&dom, blocks[1], 600.0, 16.0);
        assert!(long > short * 5.0);
    }
}
