//! HTML serialization

use super::parse::{is_raw_text, is_void};
use super::{Dom, Element, NodeData, NodeId};

/// Replacement for an attribute value at serialization time; `None` keeps it
pub type AttrRewrite<'a> = &'a dyn Fn(&Element, &str, &str) -> Option<String>;

pub(super) fn write_node(dom: &Dom, id: NodeId, out: &mut String, rewrite: Option<AttrRewrite<'_>>) {
    match dom.data(id) {
        NodeData::Document => {
            for child in dom.children(id) {
                write_node(dom, *child, out, rewrite);
            }
        }
        NodeData::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attrs {
                let replaced = rewrite.and_then(|rewrite| rewrite(element, name, value));
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_attr(replaced.as_deref().unwrap_or(value)));
                out.push('"');
            }
            out.push('>');
            if is_void(&element.tag) {
                return;
            }
            let raw = is_raw_text(&element.tag);
            for child in dom.children(id) {
                match dom.data(*child) {
                    NodeData::Text(text) if raw => out.push_str(text),
                    _ => write_node(dom, *child, out, rewrite),
                }
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
        NodeData::Text(text) => out.push_str(&escape_text(text)),
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Raw(markup) => out.push_str(markup),
    }
}

/// Escape text content
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value for a double-quoted attribute
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
