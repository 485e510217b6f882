//! Presentation controller
//!
//! Applies a [`PresentationState`] to a rendered view. Application is
//! idempotent: every property is set, never appended, so re-applying the
//! same state leaves the view unchanged.

use super::PresentationState;
use crate::dom::NodeId;
use crate::render::view::ViewDom;

#[derive(Debug, Default, Clone, Copy)]
pub struct PresentationController;

impl PresentationController {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(&self, view: &mut ViewDom, state: &PresentationState) {
        let palette = state.palette();
        let html = view.html();

        view.set_attr(html, "data-theme", state.theme.name());
        let vars = [
            ("--theme-body", palette.body),
            ("--theme-content", palette.content),
            ("--theme-text", palette.text),
            ("--theme-heading", palette.heading),
            ("--theme-link", palette.link),
            ("--theme-code-bg", palette.code_bg),
            ("--theme-code-text", palette.code_text),
            ("--theme-quote-bg", palette.quote_bg),
            ("--theme-quote-border", palette.quote_border),
            ("--theme-quote-text", palette.quote_text),
        ];
        for (name, value) in vars {
            view.set_style_property(html, name, value);
        }

        let image_scale = format_px(state.image_scale.value());
        view.set_style_property(html, "--image-scale", &image_scale);

        let page = &state.page;
        view.set_style_property(html, "--pd-page-size", &page.css_page_size());
        view.set_style_property(html, "--pd-margin-top", &page.margins.top);
        view.set_style_property(html, "--pd-margin-right", &page.margins.right);
        view.set_style_property(html, "--pd-margin-bottom", &page.margins.bottom);
        view.set_style_property(html, "--pd-margin-left", &page.margins.left);

        let content = view.content();
        view.set_style_property(content, "background-color", palette.content);

        let article = view.article();
        let font_size = format!("{}px", format_px(state.font_size_px()));
        view.set_style_property(article, "color", palette.text);
        view.set_style_property(article, "font-family", palette.font_family);
        view.set_style_property(article, "font-size", &font_size);
        view.set_style_property(article, "line-height", palette.line_height);

        self.style_elements(view, article, state);
        log::debug!(
            "Applied presentation: theme={} font={} images={} page={}",
            state.theme,
            font_size,
            image_scale,
            state.page
        );
    }

    /// Inline colours on themed elements inside `scope`
    pub fn style_elements(&self, view: &mut ViewDom, scope: NodeId, state: &PresentationState) {
        let palette = state.palette();

        let headings = view.select(scope, |e| {
            matches!(e.tag.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
        });
        for heading in headings {
            view.set_style_property(heading, "color", palette.heading);
        }

        for link in view.select(scope, |e| e.is("a")) {
            view.set_style_property(link, "color", palette.link);
        }

        for code in view.select(scope, |e| e.is("code")) {
            view.set_style_property(code, "font-family", palette.code_font_family);
            let in_pre = view.parent(code).and_then(|p| view.tag(p)) == Some("pre");
            if !in_pre {
                view.set_style_property(code, "background-color", palette.code_bg);
                view.set_style_property(code, "color", palette.code_text);
            }
        }

        for pre in view.select(scope, |e| e.is("pre")) {
            view.set_style_property(pre, "background-color", palette.code_bg);
            view.set_style_property(pre, "font-family", palette.code_font_family);
        }

        for quote in view.select(scope, |e| e.is("blockquote")) {
            view.set_style_property(quote, "background-color", palette.quote_bg);
            view.set_style_property(quote, "border-color", palette.quote_border);
            view.set_style_property(quote, "color", palette.quote_text);
        }
    }
}

fn format_px(px: f32) -> String {
    let rounded = (px * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}
