//! Scoped DOM mutations for the capture window
//!
//! Both guards undo their changes on drop, so the view is restored on
//! every exit path of an export, including errors and a dropped future.

use crate::dom::NodeId;
use crate::pagination::PAGES_CLASS;
use crate::presentation::stylesheet::{print_override_css, PDF_THEME_OVERRIDE_ID};
use crate::presentation::Theme;
use crate::render::ViewDom;
use std::ops::{Deref, DerefMut};

/// Print-specific colours of the live theme, injected as `style#pdf-theme-override`
pub struct ThemeOverrideGuard<'a> {
    view: &'a mut ViewDom,
    style: NodeId,
}

impl<'a> ThemeOverrideGuard<'a> {
    pub fn inject(view: &'a mut ViewDom, theme: Theme) -> Self {
        // A leftover from an interrupted export would shadow the new one
        if let Some(stale) = view.get_element_by_id(PDF_THEME_OVERRIDE_ID) {
            view.remove(stale);
        }

        let style = view.create_element_with("style", &[("id", PDF_THEME_OVERRIDE_ID)]);
        let css = view.create_text(print_override_css(theme));
        view.append_child(style, css);
        let head = view.head();
        view.append_child(head, style);
        log::debug!("Injected print override for theme {}", theme);

        Self { view, style }
    }
}

impl Deref for ThemeOverrideGuard<'_> {
    type Target = ViewDom;

    fn deref(&self) -> &ViewDom {
        self.view
    }
}

impl DerefMut for ThemeOverrideGuard<'_> {
    fn deref_mut(&mut self) -> &mut ViewDom {
        self.view
    }
}

impl Drop for ThemeOverrideGuard<'_> {
    fn drop(&mut self) {
        self.view.remove(self.style);
        log::debug!("Removed print override");
    }
}

/// Relaxed interactive-view constraints
///
/// Records the original `style` attribute of every touched element and
/// puts it back verbatim (or removes it if there was none).
pub struct LayoutRelaxGuard<'a> {
    view: &'a mut ViewDom,
    saved: Vec<(NodeId, Option<String>)>,
}

impl<'a> LayoutRelaxGuard<'a> {
    pub fn relax(view: &'a mut ViewDom) -> Self {
        let mut guard = Self {
            view,
            saved: Vec::new(),
        };

        let body = guard.view.body();
        guard.set(body, &[("height", "auto"), ("overflow", "visible")]);
        let content = guard.view.content();
        guard.set(
            content,
            &[("height", "auto"), ("overflow", "visible"), ("max-height", "none")],
        );
        let sidebar = guard.view.sidebar();
        guard.set(sidebar, &[("display", "none")]);

        // Capture always uses the continuous flow; the @page rule paginates
        let article = guard.view.article();
        guard.set(article, &[("display", "block")]);
        let pages = guard.view.select(content, |e| e.has_class(PAGES_CLASS));
        for node in pages {
            guard.set(node, &[("display", "none")]);
        }

        guard
    }

    fn set(&mut self, node: NodeId, properties: &[(&str, &str)]) {
        if !self.saved.iter().any(|(saved, _)| *saved == node) {
            let original = self.view.attr(node, "style").map(str::to_string);
            self.saved.push((node, original));
        }
        for (property, value) in properties {
            self.view.set_style_property(node, property, value);
        }
    }
}

impl Deref for LayoutRelaxGuard<'_> {
    type Target = ViewDom;

    fn deref(&self) -> &ViewDom {
        self.view
    }
}

impl Drop for LayoutRelaxGuard<'_> {
    fn drop(&mut self) {
        for (node, original) in self.saved.drain(..).rev() {
            match original {
                Some(style) => self.view.set_attr(node, "style", style),
                None => {
                    self.view.remove_attr(node, "style");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{PresentationController, PresentationState};

    fn styled_view() -> ViewDom {
        let mut view = ViewDom::new();
        let article = view.article();
        view.set_inner_html(article, "<h1>T</h1><p>x</p>");
        PresentationController::new().apply(&mut view, &PresentationState::default());
        view
    }

    #[test]
    fn test_theme_override_removed_on_drop() {
        let mut view = styled_view();
        let before = view.to_document_html();
        {
            let guard = ThemeOverrideGuard::inject(&mut view, Theme::Sepia);
            assert!(guard.get_element_by_id(PDF_THEME_OVERRIDE_ID).is_some());
            assert!(guard.to_document_html().contains("@media print"));
        }
        assert!(view.get_element_by_id(PDF_THEME_OVERRIDE_ID).is_none());
        assert_eq!(view.to_document_html(), before);
    }

    #[test]
    fn test_repeated_overrides_reuse_nodes() {
        let mut view = styled_view();
        drop(ThemeOverrideGuard::inject(&mut view, Theme::Dark));
        let capacity = view.capacity();
        for _ in 0..10 {
            let guard = ThemeOverrideGuard::inject(&mut view, Theme::Light);
            drop(guard);
        }
        assert_eq!(view.capacity(), capacity);
    }

    #[test]
    fn test_relax_restores_styles_byte_for_byte() {
        let mut view = styled_view();
        let before = view.to_document_html();
        {
            let relaxed = LayoutRelaxGuard::relax(&mut view);
            let body = relaxed.body();
            assert_eq!(relaxed.style_property(body, "overflow").as_deref(), Some("visible"));
            let sidebar = relaxed.sidebar();
            assert_eq!(relaxed.style_property(sidebar, "display").as_deref(), Some("none"));
        }
        assert_eq!(view.to_document_html(), before);
        let sidebar = view.sidebar();
        assert_eq!(view.attr(sidebar, "style"), None);
    }

    #[test]
    fn test_guards_nest() {
        let mut view = styled_view();
        let before = view.to_document_html();
        {
            let mut themed = ThemeOverrideGuard::inject(&mut view, Theme::Nord);
            let relaxed = LayoutRelaxGuard::relax(&mut themed);
            let snapshot = relaxed.to_document_html();
            assert!(snapshot.contains(PDF_THEME_OVERRIDE_ID));
        }
        assert_eq!(view.to_document_html(), before);
    }
}
