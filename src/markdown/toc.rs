//! Table of contents
//!
//! Built from the rendered headings after every render, never from the
//! source text, so headings produced by raw HTML are included too.

use crate::dom::{Dom, NodeId};
use serde::{Deserialize, Serialize};

pub const NO_HEADINGS: &str = "No headings found";
pub const NO_DOCUMENT: &str = "No document open";

/// One heading record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub id: String,
    pub text: String,
    pub level: u8,
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Give every heading under `scope` a `toc-heading-{i}` id and collect the entries
pub fn collect_headings(dom: &mut Dom, scope: NodeId) -> Vec<TocEntry> {
    let headings = dom.select(scope, |e| heading_level(&e.tag).is_some());
    let mut entries = Vec::with_capacity(headings.len());
    for (index, heading) in headings.into_iter().enumerate() {
        let level = dom.tag(heading).and_then(heading_level).unwrap_or(1);
        let text = dom.text_content(heading).trim().to_string();
        let text = if text.is_empty() {
            format!("Heading {}", index + 1)
        } else {
            text
        };
        let id = format!("toc-heading-{}", index);
        dom.set_attr(heading, "id", id.clone());
        entries.push(TocEntry { id, text, level });
    }
    entries
}

/// Fill the sidebar container with TOC items, or the matching empty state
pub fn render_toc(dom: &mut Dom, target: NodeId, entries: Option<&[TocEntry]>) {
    dom.clear_children(target);
    let empty = match entries {
        None => Some(NO_DOCUMENT),
        Some([]) => Some(NO_HEADINGS),
        Some(_) => None,
    };
    if let Some(message) = empty {
        let node = dom.create_element_with("div", &[("class", "toc-empty")]);
        let text = dom.create_text(message);
        dom.append_child(node, text);
        dom.append_child(target, node);
        return;
    }

    for entry in entries.unwrap_or_default() {
        let class = format!("toc-item level-{}", entry.level);
        let href = format!("#{}", entry.id);
        let item = dom.create_element_with(
            "a",
            &[
                ("class", class.as_str()),
                ("href", href.as_str()),
                ("title", entry.text.as_str()),
            ],
        );
        let text = dom.create_text(entry.text.as_str());
        dom.append_child(item, text);
        dom.append_child(target, item);
    }
}
