//! In-memory document tree for the rendered view
//!
//! Rendering, presentation, pagination and export all operate on this tree
//! structurally rather than on HTML text:
//! - `Dom`: arena of nodes addressed by `NodeId`
//! - `parse`: lenient HTML fragment parser (Markdown output, raw HTML blocks)
//! - `serialize`: HTML serializer used for snapshots and output files
//!
//! Detaching a node only unlinks it from its parent. Subtrees that are
//! discarded go through [`Dom::remove`] (or [`Dom::clear_children`]), which
//! returns their slots to a free list for reuse, so a long-lived view does
//! not grow with every repagination. A removed `NodeId` must not be used
//! again.

mod parse;
mod serialize;

pub use serialize::{escape_attr, escape_text, AttrRewrite};

/// Handle to a node inside a [`Dom`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An element: tag name plus ordered attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(n, _)| n == name)?;
        Some(self.attrs.remove(index).1)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }
}

/// Payload of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The tree root
    Document,
    Element(Element),
    Text(String),
    Comment(String),
    /// Pre-rendered markup from an engine, serialized verbatim
    Raw(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
    vacant: bool,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data,
            vacant: false,
        }
    }
}

/// Arena-backed document tree
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    free: Vec<usize>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Create an empty tree holding only the document root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
            free: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        if let Some(slot) = self.free.pop() {
            self.nodes[slot] = Node::new(data);
            return NodeId(slot);
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(data));
        id
    }

    /// Number of slots in the arena, live or free
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes currently allocated
    pub fn live_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Detach `id` and free it together with its subtree
    ///
    /// The root is never removed; removing a freed node is a no-op.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root() || self.nodes[id.0].vacant {
            return;
        }
        self.detach(id);
        self.release(id);
    }

    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let node = &mut self.nodes[next.0];
            stack.append(&mut node.children);
            node.parent = None;
            node.data = NodeData::Comment(String::new());
            node.vacant = true;
            self.free.push(next.0);
        }
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(Element::new(tag)))
    }

    /// Create an element with attributes in the given order
    pub fn create_element_with(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut element = Element::new(tag);
        for (name, value) in attrs {
            element.set_attr(name, *value);
        }
        self.push(NodeData::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    pub fn create_raw(&mut self, markup: impl Into<String>) -> NodeId {
        self.push(NodeData::Raw(markup.into()))
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Whether the node is reachable from the document root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root() {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Unlink a node from its parent; the node and its subtree stay intact
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` before `reference`; appends when `reference` is not a child of `parent`
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.detach(child);
        let position = self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == reference);
        self.nodes[child.0].parent = Some(parent);
        match position {
            Some(index) => self.nodes[parent.0].children.insert(index, child),
            None => self.nodes[parent.0].children.push(child),
        }
    }

    /// Put `replacement` where `old` is and detach `old`
    pub fn replace_with(&mut self, old: NodeId, replacement: NodeId) {
        match self.parent(old) {
            Some(parent) => {
                self.insert_before(parent, replacement, old);
                self.detach(old);
            }
            None => self.detach(replacement),
        }
    }

    /// Remove and free every child of `id`
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
            self.release(child);
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(element) = self.element_mut(id) {
            element.set_attr(name, value);
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id).and_then(|e| e.remove_attr(name))
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).map(|e| e.has_class(class)).unwrap_or(false)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let classes = match self.attr(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attr(id, "class", classes);
    }

    /// All descendants of `id` in document (pre-)order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Descendant elements of `scope` matching `predicate`, in document order
    pub fn select<F>(&self, scope: NodeId, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&Element) -> bool,
    {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.element(*id).map(&predicate).unwrap_or(false))
            .collect()
    }

    pub fn select_first<F>(&self, scope: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Element) -> bool,
    {
        self.select(scope, predicate).into_iter().next()
    }

    /// Attached element with the given `id` attribute
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.select_first(self.root(), |e| e.attr("id") == Some(id))
    }

    /// Concatenated text of all text descendants
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let NodeData::Text(text) = self.data(id) {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let NodeData::Text(text) = self.data(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Copy a subtree; the copy is detached
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let copy = self.push(self.nodes[id.0].data.clone());
        let children = self.nodes[id.0].children.clone();
        for child in children {
            let child_copy = self.deep_clone(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Parse `html` and return the detached top-level nodes
    pub fn parse_fragment(&mut self, html: &str) -> Vec<NodeId> {
        parse::parse_into(self, html)
    }

    /// Replace the children of `id` with the parsed `html`
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) {
        self.clear_children(id);
        self.append_html(id, html);
    }

    pub fn append_html(&mut self, id: NodeId, html: &str) {
        for node in self.parse_fragment(html) {
            self.append_child(id, node);
        }
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            serialize::write_node(self, *child, &mut out, None);
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        serialize::write_node(self, id, &mut out, None);
        out
    }

    /// Serialize with attribute values passed through `rewrite`
    pub fn outer_html_with(&self, id: NodeId, rewrite: AttrRewrite<'_>) -> String {
        let mut out = String::new();
        serialize::write_node(self, id, &mut out, Some(rewrite));
        out
    }

    /// Value of one declaration in the inline `style` attribute
    pub fn style_property(&self, id: NodeId, property: &str) -> Option<String> {
        let style = self.attr(id, "style")?;
        parse_style(style)
            .into_iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value)
    }

    /// Set one declaration in the inline `style` attribute, keeping the others in order
    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str) {
        let mut declarations = self.attr(id, "style").map(parse_style).unwrap_or_default();
        match declarations.iter_mut().find(|(name, _)| name == property) {
            Some(slot) => slot.1 = value.to_string(),
            None => declarations.push((property.to_string(), value.to_string())),
        }
        self.set_attr(id, "style", format_style(&declarations));
    }

    pub fn remove_style_property(&mut self, id: NodeId, property: &str) {
        let Some(style) = self.attr(id, "style") else {
            return;
        };
        let declarations: Vec<_> = parse_style(style)
            .into_iter()
            .filter(|(name, _)| name != property)
            .collect();
        if declarations.is_empty() {
            self.remove_attr(id, "style");
        } else {
            self.set_attr(id, "style", format_style(&declarations));
        }
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

fn format_style(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(name, value)| format!("{}: {};", name, value))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_serialize() {
        let mut dom = Dom::new();
        let div = dom.create_element_with("div", &[("class", "note")]);
        let text = dom.create_text("a < b");
        dom.append_child(div, text);
        dom.append_child(dom.root(), div);

        assert_eq!(dom.outer_html(div), r#"<div class="note">a &lt; b</div>"#);
        assert_eq!(dom.text_content(div), "a < b");
    }

    #[test]
    fn test_replace_with_keeps_position() {
        let mut dom = Dom::new();
        let root = dom.root();
        dom.append_html(root, "<p>one</p><pre>two</pre><p>three</p>");
        let pre = dom.select_first(root, |e| e.is("pre")).unwrap();
        let replacement = dom.create_element_with("div", &[("class", "diagram")]);
        dom.replace_with(pre, replacement);

        assert_eq!(
            dom.inner_html(root),
            r#"<p>one</p><div class="diagram"></div><p>three</p>"#
        );
        assert!(!dom.is_attached(pre));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let mut dom = Dom::new();
        let root = dom.root();
        dom.append_html(root, "<h1>A</h1><div><h2>B</h2></div><h2>C</h2>");
        let headings = dom.select(root, |e| e.tag.len() == 2 && e.tag.starts_with('h'));
        let texts: Vec<_> = headings.iter().map(|h| dom.text_content(*h)).collect();
        assert_eq!(texts, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_style_properties_round_trip() {
        let mut dom = Dom::new();
        let div = dom.create_element_with("div", &[("style", "height: 100vh; overflow-y: auto;")]);
        dom.set_style_property(div, "overflow-y", "visible");
        dom.set_style_property(div, "color", "red");

        assert_eq!(dom.style_property(div, "height").as_deref(), Some("100vh"));
        assert_eq!(
            dom.attr(div, "style"),
            Some("height: 100vh; overflow-y: visible; color: red;")
        );

        dom.remove_style_property(div, "height");
        dom.remove_style_property(div, "overflow-y");
        dom.remove_style_property(div, "color");
        assert_eq!(dom.attr(div, "style"), None);
    }

    #[test]
    fn test_deep_clone_is_detached_copy() {
        let mut dom = Dom::new();
        let root = dom.root();
        dom.append_html(root, "<p>Hello <em>world</em></p>");
        let p = dom.children(root)[0];
        let copy = dom.deep_clone(p);

        assert!(!dom.is_attached(copy));
        assert_eq!(dom.outer_html(copy), dom.outer_html(p));
        assert_ne!(dom.children(copy)[1], dom.children(p)[1]);
    }

    #[test]
    fn test_add_class_is_idempotent() {
        let mut dom = Dom::new();
        let span = dom.create_element_with("span", &[("class", "math-inline")]);
        dom.add_class(span, "math-rendered");
        dom.add_class(span, "math-rendered");
        assert_eq!(dom.attr(span, "class"), Some("math-inline math-rendered"));
    }

    #[test]
    fn test_removed_slots_are_reused() {
        let mut dom = Dom::new();
        let root = dom.root();
        dom.append_html(root, "<div><p>a</p><p>b</p></div>");
        let div = dom.children(root)[0];
        let before = dom.capacity();

        dom.remove(div);
        dom.remove(div);
        assert_eq!(dom.live_count(), 1);
        assert!(dom.children(root).is_empty());

        dom.append_html(root, "<div><p>c</p><p>d</p></div>");
        assert_eq!(dom.capacity(), before);
        assert_eq!(dom.inner_html(root), "<div><p>c</p><p>d</p></div>");
    }

    #[test]
    fn test_set_inner_html_frees_old_children() {
        let mut dom = Dom::new();
        let root = dom.root();
        let div = dom.create_element("div");
        dom.append_child(root, div);
        for _ in 0..20 {
            dom.set_inner_html(div, "<p>one <em>two</em></p>");
        }
        assert_eq!(dom.live_count(), 6);
        assert_eq!(dom.capacity(), 6);
    }

    #[test]
    fn test_get_element_by_id_ignores_detached() {
        let mut dom = Dom::new();
        let root = dom.root();
        dom.append_html(root, r#"<style id="pdf-theme-override"></style>"#);
        let style = dom.get_element_by_id("pdf-theme-override").unwrap();
        dom.detach(style);
        assert!(dom.get_element_by_id("pdf-theme-override").is_none());
    }
}
