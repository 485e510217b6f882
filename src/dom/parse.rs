//! Lenient HTML fragment parser
//!
//! Handles the HTML produced by the Markdown parser plus hand-written raw
//! HTML blocks. Unknown or unmatched close tags are ignored, unclosed
//! elements are closed at the end of input, and a `<` that does not start
//! markup is kept as text.

use super::{Dom, Element, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub(super) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub(super) fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

enum Markup {
    Open {
        tag: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    Close(String),
    Comment(String),
    Declaration,
}

struct TreeBuilder<'a> {
    dom: &'a mut Dom,
    top: Vec<NodeId>,
    stack: Vec<NodeId>,
}

impl TreeBuilder<'_> {
    fn attach(&mut self, node: NodeId) {
        match self.stack.last() {
            Some(parent) => self.dom.append_child(*parent, node),
            None => self.top.push(node),
        }
    }

    fn text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let node = self.dom.create_text(decode_entities(raw));
        self.attach(node);
    }

    fn open(&mut self, tag: String, attrs: Vec<(String, String)>, self_closing: bool) -> NodeId {
        let void = is_void(&tag);
        let element = Element { tag, attrs };
        let node = self.dom.push(NodeData::Element(element));
        self.attach(node);
        if !void && !self_closing {
            self.stack.push(node);
        }
        node
    }

    fn close(&mut self, tag: &str) {
        if let Some(index) = self
            .stack
            .iter()
            .rposition(|id| self.dom.tag(*id) == Some(tag))
        {
            self.stack.truncate(index);
        }
    }
}

/// Parse `html`, returning the detached top-level nodes
pub(super) fn parse_into(dom: &mut Dom, html: &str) -> Vec<NodeId> {
    let lower = html.to_ascii_lowercase();
    let bytes = html.as_bytes();
    let mut builder = TreeBuilder {
        dom,
        top: Vec::new(),
        stack: Vec::new(),
    };

    let mut pos = 0;
    let mut text_start = 0;
    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }
        let Some((markup, end)) = read_markup(html, pos) else {
            pos += 1;
            continue;
        };

        builder.text(&html[text_start..pos]);
        pos = end;
        match markup {
            Markup::Open {
                tag,
                attrs,
                self_closing,
            } => {
                let raw_text = is_raw_text(&tag) && !self_closing;
                let closing = format!("</{}", tag);
                let node = builder.open(tag, attrs, self_closing);
                if raw_text {
                    let content_end = lower[pos..]
                        .find(&closing)
                        .map(|offset| pos + offset)
                        .unwrap_or(html.len());
                    if content_end > pos {
                        let text = builder.dom.create_text(&html[pos..content_end]);
                        builder.dom.append_child(node, text);
                    }
                    builder.stack.pop();
                    pos = html[content_end..]
                        .find('>')
                        .map(|offset| content_end + offset + 1)
                        .unwrap_or(html.len());
                }
            }
            Markup::Close(tag) => builder.close(&tag),
            Markup::Comment(text) => {
                let node = builder.dom.create_comment(text);
                builder.attach(node);
            }
            Markup::Declaration => {}
        }
        text_start = pos;
    }
    builder.text(&html[text_start..]);
    builder.top
}

fn read_markup(html: &str, start: usize) -> Option<(Markup, usize)> {
    let rest = &html[start..];
    if let Some(body) = rest.strip_prefix("<!--") {
        return Some(match body.find("-->") {
            Some(end) => (Markup::Comment(body[..end].to_string()), start + 4 + end + 3),
            None => (Markup::Comment(body.to_string()), html.len()),
        });
    }
    if rest.starts_with("<!") || rest.starts_with("<?") {
        let end = rest.find('>')?;
        return Some((Markup::Declaration, start + end + 1));
    }
    if let Some(body) = rest.strip_prefix("</") {
        let name_len = tag_name_len(body);
        if name_len == 0 {
            return None;
        }
        let end = body.find('>')?;
        let tag = body[..name_len].to_ascii_lowercase();
        return Some((Markup::Close(tag), start + 2 + end + 1));
    }

    let body = &rest[1..];
    let name_len = tag_name_len(body);
    if name_len == 0 {
        return None;
    }
    let tag = body[..name_len].to_ascii_lowercase();
    let (attrs, self_closing, consumed) = read_attributes(&body[name_len..])?;
    Some((
        Markup::Open {
            tag,
            attrs,
            self_closing,
        },
        start + 1 + name_len + consumed,
    ))
}

fn tag_name_len(s: &str) -> usize {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() => {}
        _ => return 0,
    }
    s.char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '-' || *c == ':'))
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Parse attributes up to and including the closing `>`
fn read_attributes(s: &str) -> Option<(Vec<(String, String)>, bool, usize)> {
    let bytes = s.as_bytes();
    let mut attrs = Vec::new();
    let mut i = 0;
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }
        match bytes[i] {
            b'>' => return Some((attrs, false, i + 1)),
            b'/' if bytes.get(i + 1) == Some(&b'>') => return Some((attrs, true, i + 2)),
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let name = s[name_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let value = match bytes.get(i) {
                Some(&quote @ (b'"' | b'\'')) => {
                    let value_start = i + 1;
                    let len = s[value_start..].find(quote as char)?;
                    i = value_start + len + 1;
                    &s[value_start..value_start + len]
                }
                Some(_) => {
                    let value_start = i;
                    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    &s[value_start..i]
                }
                None => return None,
            };
            attrs.push((name, decode_entities(value)));
        } else if !name.is_empty() {
            attrs.push((name, String::new()));
        }
    }
}

/// Decode the character references the Markdown parser and common raw HTML emit
pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let decoded = candidate
            .find(';')
            .filter(|semi| *semi <= 10)
            .and_then(|semi| decode_reference(&candidate[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &candidate[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
