//! Resizable image embeds
//!
//! Every image in the article is wrapped in an inline-block
//! `span.resizable-image` with a drag handle. Widths are percentages of
//! the flow width, persisted per image source so they survive re-renders
//! and restarts.

use crate::dom::{Dom, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const WRAPPER_CLASS: &str = "resizable-image";
pub const HANDLE_CLASS: &str = "resize-handle";
pub const IMAGE_KEY_ATTR: &str = "data-image-key";

/// Bounds while dragging
pub const LIVE_MIN_PERCENT: f64 = 20.0;
pub const LIVE_MAX_PERCENT: f64 = 150.0;

/// Bounds of a persisted width
pub const STORED_MIN_PERCENT: f64 = 1.0;
pub const STORED_MAX_PERCENT: f64 = 500.0;

pub const DEFAULT_PERCENT: f64 = 100.0;

pub fn clamp_live(percent: f64) -> f64 {
    if percent.is_nan() {
        return DEFAULT_PERCENT;
    }
    percent.clamp(LIVE_MIN_PERCENT, LIVE_MAX_PERCENT)
}

fn clamp_stored(percent: f64) -> f64 {
    if percent.is_nan() {
        return DEFAULT_PERCENT;
    }
    percent.clamp(STORED_MIN_PERCENT, STORED_MAX_PERCENT)
}

fn format_percent(percent: f64) -> String {
    let rounded = (percent * 100.0).round() / 100.0;
    format!("{}%", rounded)
}

/// Persisted image widths keyed by image source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageWidths(BTreeMap<String, f64>);

impl ImageWidths {
    pub fn get(&self, src: &str) -> Option<f64> {
        self.0.get(src).copied()
    }

    /// Store a width, clamped to the persisted bounds; returns the stored value
    pub fn set(&mut self, src: &str, percent: f64) -> f64 {
        let stored = clamp_stored(percent);
        self.0.insert(src.to_string(), stored);
        stored
    }

    pub fn forget(&mut self, src: &str) {
        self.0.remove(src);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Wrap every unwrapped image under `container`; returns the number wrapped
pub fn wrap_images(dom: &mut Dom, container: NodeId, widths: &ImageWidths) -> usize {
    let mut wrapped = 0;
    for img in dom.select(container, |e| e.is("img")) {
        let already = dom
            .parent(img)
            .map(|parent| dom.has_class(parent, WRAPPER_CLASS))
            .unwrap_or(false);
        if already {
            continue;
        }
        let Some(parent) = dom.parent(img) else {
            continue;
        };

        let key = dom.attr(img, "src").unwrap_or_default().to_string();
        let percent = widths.get(&key).unwrap_or(DEFAULT_PERCENT);
        let wrapper = dom.create_element_with(
            "span",
            &[("class", WRAPPER_CLASS), (IMAGE_KEY_ATTR, key.as_str())],
        );
        dom.set_style_property(wrapper, "width", &format_percent(percent));

        dom.insert_before(parent, wrapper, img);
        dom.append_child(wrapper, img);
        let handle = dom.create_element_with("span", &[("class", HANDLE_CLASS)]);
        dom.append_child(wrapper, handle);
        wrapped += 1;
    }
    wrapped
}

fn wrappers_for(dom: &Dom, container: NodeId, src: &str) -> Vec<NodeId> {
    dom.select(container, |e| {
        e.has_class(WRAPPER_CLASS) && e.attr(IMAGE_KEY_ATTR) == Some(src)
    })
}

/// Apply a drag to `percent`; the live width is clamped and persisted
///
/// Returns the width applied to the view.
pub fn resize_image(
    dom: &mut Dom,
    container: NodeId,
    src: &str,
    percent: f64,
    widths: &mut ImageWidths,
) -> f64 {
    let live = clamp_live(percent);
    for wrapper in wrappers_for(dom, container, src) {
        dom.set_style_property(wrapper, "width", &format_percent(live));
    }
    widths.set(src, live);
    live
}

/// Back to full width; the stored width is removed
pub fn reset_image_width(dom: &mut Dom, container: NodeId, src: &str, widths: &mut ImageWidths) {
    for wrapper in wrappers_for(dom, container, src) {
        dom.set_style_property(wrapper, "width", &format_percent(DEFAULT_PERCENT));
    }
    widths.forget(src);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let root = dom.root();
        dom.append_html(root, r#"<p>before <img src="a.png" alt="A"> after</p><img src="b.png">"#);
        (dom, root)
    }

    #[test]
    fn test_wrap_is_idempotent() {
        let (mut dom, root) = fixture();
        let widths = ImageWidths::default();
        assert_eq!(wrap_images(&mut dom, root, &widths), 2);
        let html = dom.inner_html(root);
        assert_eq!(wrap_images(&mut dom, root, &widths), 0);
        assert_eq!(dom.inner_html(root), html);
        assert_eq!(
            html,
            concat!(
                r#"<p>before <span class="resizable-image" data-image-key="a.png" style="width: 100%;">"#,
                r#"<img src="a.png" alt="A"><span class="resize-handle"></span></span> after</p>"#,
                r#"<span class="resizable-image" data-image-key="b.png" style="width: 100%;">"#,
                r#"<img src="b.png"><span class="resize-handle"></span></span>"#,
            )
        );
    }

    #[test]
    fn test_stored_width_is_applied() {
        let (mut dom, root) = fixture();
        let mut widths = ImageWidths::default();
        widths.set("b.png", 42.5);
        wrap_images(&mut dom, root, &widths);
        let wrapper = wrappers_for(&dom, root, "b.png")[0];
        assert_eq!(dom.style_property(wrapper, "width").as_deref(), Some("42.5%"));
    }

    #[test]
    fn test_resize_clamps_and_persists() {
        let (mut dom, root) = fixture();
        let mut widths = ImageWidths::default();
        wrap_images(&mut dom, root, &widths);

        assert_eq!(resize_image(&mut dom, root, "a.png", 5.0, &mut widths), 20.0);
        assert_eq!(resize_image(&mut dom, root, "a.png", 400.0, &mut widths), 150.0);
        assert_eq!(widths.get("a.png"), Some(150.0));
        let wrapper = wrappers_for(&dom, root, "a.png")[0];
        assert_eq!(dom.style_property(wrapper, "width").as_deref(), Some("150%"));

        reset_image_width(&mut dom, root, "a.png", &mut widths);
        assert_eq!(widths.get("a.png"), None);
        assert_eq!(dom.style_property(wrapper, "width").as_deref(), Some("100%"));
    }

    #[test]
    fn test_persisted_bounds() {
        let mut widths = ImageWidths::default();
        assert_eq!(widths.set("x", 900.0), 500.0);
        assert_eq!(widths.set("x", 0.0), 1.0);
        let json = serde_json::to_string(&widths).unwrap();
        assert_eq!(json, r#"{"x":1.0}"#);
    }
}
