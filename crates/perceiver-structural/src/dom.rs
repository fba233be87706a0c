//! Owned node arena for a parsed page.
//!
//! HTML is parsed once with `scraper` and copied into a flat arena in document
//! (preorder) order. A node's descendants therefore occupy the contiguous index
//! range `id + 1 .. end`, which keeps ancestor checks and subtree walks cheap and
//! makes the whole document `Send + Sync`.

use std::collections::HashMap;
use std::fmt;

use scraper::Html;
use serde::{Deserialize, Serialize};

/// Index into a [`DomArena`]. Only meaningful for the document generation it
/// was read from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|candidate| candidate == class)
    }

    /// Lowercased `type` attribute of form controls. Inputs default to `text`.
    pub fn input_type(&self) -> Option<String> {
        match self.tag.as_str() {
            "input" => Some(
                self.attr("type")
                    .map(|ty| ty.trim().to_ascii_lowercase())
                    .filter(|ty| !ty.is_empty())
                    .unwrap_or_else(|| "text".to_string()),
            ),
            "button" => Some(
                self.attr("type")
                    .map(|ty| ty.trim().to_ascii_lowercase())
                    .unwrap_or_else(|| "submit".to_string()),
            ),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    end: usize,
}

#[derive(Clone, Debug)]
pub struct DomArena {
    nodes: Vec<Node>,
}

impl DomArena {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut nodes: Vec<Node> = Vec::new();
        let mut index = HashMap::new();

        for source in document.tree.root().descendants() {
            let kind = match source.value() {
                scraper::Node::Document | scraper::Node::Fragment => NodeKind::Document,
                scraper::Node::Element(element) => NodeKind::Element(ElementData {
                    tag: element.name().to_ascii_lowercase(),
                    attrs: element
                        .attrs()
                        .map(|(key, value)| (key.to_ascii_lowercase(), value.to_string()))
                        .collect(),
                }),
                scraper::Node::Text(text) => NodeKind::Text(String::from(&**text)),
                _ => continue,
            };
            let parent = source
                .parent()
                .and_then(|parent| index.get(&parent.id()).copied());
            if parent.is_none() && !nodes.is_empty() {
                continue;
            }
            let id = NodeId(nodes.len());
            index.insert(source.id(), id);
            if let Some(parent) = parent {
                nodes[parent.0].children.push(id);
            }
            nodes.push(Node {
                kind,
                parent,
                children: Vec::new(),
                end: id.0 + 1,
            });
        }

        if nodes.is_empty() {
            nodes.push(Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
                end: 1,
            });
        }

        for position in (0..nodes.len()).rev() {
            if let Some(last) = nodes[position].children.last().copied() {
                nodes[position].end = nodes[last.0].end;
            }
        }

        Self { nodes }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.nodes.get(id.0).map(|node| &node.kind) {
            Some(NodeKind::Element(data)) => Some(data),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|data| data.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|parent| self.element(*parent).is_some())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| self.element(*child).is_some())
    }

    /// Exclusive end of the subtree rooted at `id`.
    pub fn subtree_end(&self, id: NodeId) -> usize {
        self.nodes.get(id.0).map(|node| node.end).unwrap_or(id.0)
    }

    /// True when `descendant` is `ancestor` itself or lies inside its subtree.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        ancestor.0 <= descendant.0 && descendant.0 < self.subtree_end(ancestor)
    }

    /// Every node below `id`, in document order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        let end = self.subtree_end(id);
        (id.0 + 1..end.max(id.0 + 1)).map(NodeId)
    }

    pub fn descendant_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(id)
            .filter(move |node| self.element(*node).is_some())
    }

    /// All element nodes in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendant_elements(self.root())
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    pub fn first_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.elements().find(|id| self.tag(*id) == Some(tag))
    }

    /// Concatenated text of every text node in the subtree, skipping the
    /// contents of `script`, `style` and `template`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(NodeKind::Text(text)) = self.nodes.get(id.0).map(|node| &node.kind) {
            out.push_str(text);
            return out;
        }
        let mut cursor = id.0 + 1;
        let end = self.subtree_end(id);
        while cursor < end {
            match &self.nodes[cursor].kind {
                NodeKind::Element(data)
                    if matches!(data.tag.as_str(), "script" | "style" | "template") =>
                {
                    cursor = self.nodes[cursor].end;
                    continue;
                }
                NodeKind::Text(text) => out.push_str(text),
                _ => {}
            }
            cursor += 1;
        }
        out
    }

    pub fn prev_sibling_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        self.element_children(parent)
            .take_while(|sibling| *sibling != id)
            .last()
    }

    pub fn next_sibling_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        self.element_children(parent)
            .skip_while(|sibling| *sibling != id)
            .nth(1)
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_builds_preorder_arena() {
        let arena = DomArena::parse("<html><body><div id='a'><p>one</p><p>two</p></div></body></html>");
        let div = arena
            .elements()
            .find(|id| arena.element(*id).and_then(|el| el.id()) == Some("a"))
            .expect("div");
        let paragraphs: Vec<NodeId> = arena
            .descendant_elements(div)
            .filter(|id| arena.tag(*id) == Some("p"))
            .collect();
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0] < paragraphs[1]);
        assert!(arena.is_inclusive_ancestor(div, paragraphs[1]));
        assert!(!arena.is_inclusive_ancestor(paragraphs[0], paragraphs[1]));
        assert_eq!(normalize_whitespace(&arena.text_content(div)), "onetwo");
    }

    #[test]
    fn text_content_skips_scripts() {
        let arena = DomArena::parse("<body><p>visible<script>var x = 1;</script></p></body>");
        let p = arena.first_by_tag("p").expect("p");
        assert_eq!(arena.text_content(p), "visible");
    }

    #[test]
    fn sibling_elements_skip_text() {
        let arena = DomArena::parse("<ul> <li>a</li> text <li>b</li></ul>");
        let items: Vec<NodeId> = arena
            .elements()
            .filter(|id| arena.tag(*id) == Some("li"))
            .collect();
        assert_eq!(arena.next_sibling_element(items[0]), Some(items[1]));
        assert_eq!(arena.prev_sibling_element(items[1]), Some(items[0]));
        assert_eq!(arena.prev_sibling_element(items[0]), None);
        assert_eq!(arena.next_sibling_element(items[1]), None);
    }

    #[test]
    fn input_type_defaults() {
        let arena = DomArena::parse("<input name=q><button>Go</button>");
        let input = arena.first_by_tag("input").expect("input");
        let button = arena.first_by_tag("button").expect("button");
        assert_eq!(arena.element(input).and_then(|el| el.input_type()).as_deref(), Some("text"));
        assert_eq!(arena.element(button).and_then(|el| el.input_type()).as_deref(), Some("submit"));
    }
}
