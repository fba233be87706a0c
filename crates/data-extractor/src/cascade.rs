//! Ordered selector cascades.
//!
//! A cascade is tried top to bottom and the first selector that matches at
//! least one element wins, even when a later selector would be more precise
//! for a given page family.

use perceiver_structural::{LiveDocument, NodeId, SelectorList};
use tracing::{debug, warn};

pub struct Cascade {
    name: &'static str,
    selectors: Vec<SelectorList>,
}

impl Cascade {
    pub fn new(name: &'static str, sources: &[&str]) -> Self {
        let selectors = sources
            .iter()
            .filter_map(|source| match SelectorList::parse(source) {
                Ok(selector) => Some(selector),
                Err(err) => {
                    warn!(cascade = name, error = %err, "dropping unparsable cascade selector");
                    None
                }
            })
            .collect();
        Self { name, selectors }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// First selector with a match below `scope`, with all of its matches.
    pub fn first_match(&self, doc: &LiveDocument, scope: NodeId) -> Option<(&str, Vec<NodeId>)> {
        for selector in &self.selectors {
            let nodes = doc.select_within(scope, selector);
            if !nodes.is_empty() {
                debug!(
                    cascade = self.name,
                    selector = selector.as_str(),
                    matches = nodes.len(),
                    "cascade selector matched"
                );
                return Some((selector.as_str(), nodes));
            }
        }
        debug!(cascade = self.name, "cascade exhausted");
        None
    }

    /// First element matched by the first productive selector.
    pub fn first_node(&self, doc: &LiveDocument, scope: NodeId) -> Option<NodeId> {
        self.selectors
            .iter()
            .find_map(|selector| doc.select_first_within(scope, selector))
    }

    /// Text of the first productive selector's first element with non-empty
    /// text. `content` and `datetime` attributes are used for `meta`/`time`.
    pub fn first_text(&self, doc: &LiveDocument, scope: NodeId) -> Option<String> {
        self.selectors.iter().find_map(|selector| {
            doc.select_within(scope, selector)
                .into_iter()
                .find_map(|node| node_text(doc, node))
        })
    }
}

/// Visible-ish text for a node, preferring machine-readable attributes.
pub fn node_text(doc: &LiveDocument, node: NodeId) -> Option<String> {
    let value = match doc.tag(node) {
        Some("meta") => doc.attr(node, "content").map(str::to_string),
        Some("time") => doc
            .attr(node, "datetime")
            .map(str::to_string)
            .or_else(|| Some(doc.text(node))),
        _ => doc
            .attr(node, "content")
            .filter(|_| doc.text(node).is_empty())
            .map(str::to_string)
            .or_else(|| Some(doc.text(node))),
    };
    value
        .map(|text| perceiver_structural::normalize_whitespace(&text))
        .filter(|text| !text.is_empty())
}
