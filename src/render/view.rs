//! The view document: application chrome around the rendered article

use crate::dom::{Dom, NodeId};
use crate::markdown::resource_file_url;
use crate::presentation::stylesheet::base_stylesheet;
use std::ops::{Deref, DerefMut};

pub const BASE_STYLE_ID: &str = "base-style";
pub const TOC_SIDEBAR_ID: &str = "toc-sidebar";
pub const TOC_CONTENT_ID: &str = "toc-content";
pub const CONTENT_ID: &str = "content";
pub const ARTICLE_ID: &str = "markdown-content";

/// Inline styles of the interactive scroll view
pub const BODY_STYLE: &str = "margin: 0; overflow: hidden; height: 100vh;";
pub const CONTENT_STYLE: &str = "height: 100vh; overflow-y: auto;";

/// A complete HTML document holding the TOC sidebar and the article
///
/// ```text
/// html
/// ├── head > meta, style#base-style
/// └── body
///     ├── aside#toc-sidebar > div#toc-content
///     └── main#content > article#markdown-content
/// ```
#[derive(Debug, Clone)]
pub struct ViewDom {
    dom: Dom,
    html: NodeId,
    head: NodeId,
    body: NodeId,
    sidebar: NodeId,
    toc_content: NodeId,
    content: NodeId,
    article: NodeId,
}

impl Default for ViewDom {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewDom {
    pub fn new() -> Self {
        let mut dom = Dom::new();
        let root = dom.root();

        let html = dom.create_element_with("html", &[("lang", "en")]);
        dom.append_child(root, html);

        let head = dom.create_element("head");
        dom.append_child(html, head);
        let charset = dom.create_element_with("meta", &[("charset", "UTF-8")]);
        dom.append_child(head, charset);
        let generator = dom.create_element_with("meta", &[("name", "generator"), ("content", "Printdown")]);
        dom.append_child(head, generator);
        let style = dom.create_element_with("style", &[("id", BASE_STYLE_ID)]);
        let css = dom.create_text(base_stylesheet());
        dom.append_child(style, css);
        dom.append_child(head, style);

        let body = dom.create_element_with("body", &[("style", BODY_STYLE)]);
        dom.append_child(html, body);

        let sidebar = dom.create_element_with("aside", &[("id", TOC_SIDEBAR_ID)]);
        dom.append_child(body, sidebar);
        let toc_content = dom.create_element_with("div", &[("id", TOC_CONTENT_ID)]);
        dom.append_child(sidebar, toc_content);

        let content = dom.create_element_with("main", &[("id", CONTENT_ID), ("style", CONTENT_STYLE)]);
        dom.append_child(body, content);
        let article = dom.create_element_with("article", &[("id", ARTICLE_ID)]);
        dom.append_child(content, article);

        Self {
            dom,
            html,
            head,
            body,
            sidebar,
            toc_content,
            content,
            article,
        }
    }

    pub fn html(&self) -> NodeId {
        self.html
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn sidebar(&self) -> NodeId {
        self.sidebar
    }

    pub fn toc_content(&self) -> NodeId {
        self.toc_content
    }

    pub fn content(&self) -> NodeId {
        self.content
    }

    /// The flow container holding the rendered Markdown
    pub fn article(&self) -> NodeId {
        self.article
    }

    pub fn set_title(&mut self, title: &str) {
        let existing = self.dom.select_first(self.head, |e| e.is("title"));
        let node = match existing {
            Some(node) => node,
            None => {
                let node = self.dom.create_element("title");
                self.dom.append_child(self.head, node);
                node
            }
        };
        self.dom.clear_children(node);
        let text = self.dom.create_text(title);
        self.dom.append_child(node, text);
    }

    pub fn set_toc_visible(&mut self, visible: bool) {
        if visible {
            self.dom.remove_style_property(self.sidebar, "display");
        } else {
            self.dom.set_style_property(self.sidebar, "display", "none");
        }
    }

    pub fn is_toc_visible(&self) -> bool {
        self.dom.style_property(self.sidebar, "display").as_deref() != Some("none")
    }

    /// Serialized article markup
    pub fn article_html(&self) -> String {
        self.dom.inner_html(self.article)
    }

    /// Full standalone document, as the viewer shows it
    pub fn to_document_html(&self) -> String {
        format!("<!DOCTYPE html>\n{}\n", self.dom.outer_html(self.html))
    }

    /// Standalone document for consumers outside the viewer
    ///
    /// Image resource locators are written as `file:` URLs; the tree
    /// itself is not modified.
    pub fn to_output_html(&self) -> String {
        let html = self.dom.outer_html_with(self.html, &|element, name, value| {
            if element.is("img") && name == "src" {
                resource_file_url(value)
            } else {
                None
            }
        });
        format!("<!DOCTYPE html>\n{}\n", html)
    }
}

impl Deref for ViewDom {
    type Target = Dom;

    fn deref(&self) -> &Dom {
        &self.dom
    }
}

impl DerefMut for ViewDom {
    fn deref_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrome_ids_resolve() {
        let view = ViewDom::new();
        assert_eq!(view.get_element_by_id(ARTICLE_ID), Some(view.article()));
        assert_eq!(view.get_element_by_id(CONTENT_ID), Some(view.content()));
        assert_eq!(view.get_element_by_id(TOC_CONTENT_ID), Some(view.toc_content()));
        assert_eq!(view.attr(view.body(), "style"), Some(BODY_STYLE));
    }

    #[test]
    fn test_document_html_is_standalone() {
        let mut view = ViewDom::new();
        let article = view.article();
        view.set_inner_html(article, "<p>Hi</p>");
        view.set_title("notes.md");
        let html = view.to_document_html();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>notes.md</title>"));
        assert!(html.contains(r#"<article id="markdown-content"><p>Hi</p></article>"#));
    }

    #[test]
    fn test_output_html_resolves_resource_locators() {
        let mut view = ViewDom::new();
        let article = view.article();
        view.set_inner_html(
            article,
            r#"<p><img src="printdown:///docs/img/fig.png"><img src="https://x/b.png"></p>"#,
        );
        let html = view.to_output_html();
        assert!(html.contains(r#"src="file:///docs/img/fig.png""#));
        assert!(html.contains(r#"src="https://x/b.png""#));
        assert!(view.to_document_html().contains("printdown:///docs/img/fig.png"));
    }

    #[test]
    fn test_toc_visibility_toggle() {
        let mut view = ViewDom::new();
        view.set_toc_visible(false);
        assert!(!view.is_toc_visible());
        view.set_toc_visible(true);
        assert!(view.is_toc_visible());
        assert_eq!(view.attr(view.sidebar(), "style"), None);
    }
}
