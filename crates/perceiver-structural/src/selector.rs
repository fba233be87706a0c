//! CSS selectors over the node arena.
//!
//! Parsing reuses `scraper`'s selector implementation ([`Simple`]) through the
//! `selectors` crate, so queries, stylesheet rules and extractor cascades all
//! accept the same grammar `scraper::Selector` does, plus `:has()`, `:is()`
//! and `:where()`. Matching runs directly on [`DomArena`] nodes through an
//! [`Element`] implementation.

use std::fmt;

use scraper::selector::{CssLocalName, CssString, NonTSPseudoClass, PseudoElement, Simple};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::matching::{
    self, ElementSelectorFlags, IgnoreNthChildForInvalidation, MatchingContext, MatchingMode,
    NeedsSelectorFlags, QuirksMode,
};
use selectors::parser::{self, ParseRelative, SelectorParseErrorKind};
use selectors::{Element, NthIndexCache, OpaqueElement, SelectorImpl};
use thiserror::Error;

use crate::dom::{DomArena, ElementData, NodeId};

type Namespace = <Simple as SelectorImpl>::NamespaceUrl;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid selector `{selector}`: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

#[derive(Clone, Copy, Debug)]
struct Dialect;

impl<'i> parser::Parser<'i> for Dialect {
    type Impl = Simple;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_has(&self) -> bool {
        true
    }

    fn parse_is_and_where(&self) -> bool {
        true
    }
}

/// A parsed, comma-separated selector list.
#[derive(Clone, Debug)]
pub struct SelectorList {
    source: String,
    selectors: parser::SelectorList<Simple>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let source = input.trim();
        let mut parser_input = cssparser::ParserInput::new(source);
        let mut css = cssparser::Parser::new(&mut parser_input);
        let selectors = parser::SelectorList::parse(&Dialect, &mut css, ParseRelative::No)
            .map_err(|err| SelectorError {
                selector: source.to_string(),
                reason: scraper::error::SelectorErrorKind::from(err).to_string(),
            })?;
        Ok(Self {
            source: source.to_string(),
            selectors,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, arena: &DomArena, node: NodeId) -> bool {
        let Some(element) = ArenaElement::new(arena, node) else {
            return false;
        };
        let mut cache = NthIndexCache::default();
        let mut context = matching_context(&mut cache);
        self.matches_element(&element, &mut context)
    }

    /// Matching elements strictly below `scope`, in document order.
    pub fn select(&self, arena: &DomArena, scope: NodeId) -> Vec<NodeId> {
        let mut cache = NthIndexCache::default();
        let mut context = matching_context(&mut cache);
        arena
            .descendant_elements(scope)
            .filter(|node| {
                ArenaElement::new(arena, *node)
                    .map_or(false, |element| self.matches_element(&element, &mut context))
            })
            .collect()
    }

    pub fn select_first(&self, arena: &DomArena, scope: NodeId) -> Option<NodeId> {
        let mut cache = NthIndexCache::default();
        let mut context = matching_context(&mut cache);
        arena.descendant_elements(scope).find(|node| {
            ArenaElement::new(arena, *node)
                .map_or(false, |element| self.matches_element(&element, &mut context))
        })
    }

    fn matches_element(
        &self,
        element: &ArenaElement<'_>,
        context: &mut MatchingContext<'_, Simple>,
    ) -> bool {
        self.selectors
            .0
            .iter()
            .any(|selector| matching::matches_selector(selector, 0, None, element, context))
    }
}

fn matching_context(cache: &mut NthIndexCache) -> MatchingContext<'_, Simple> {
    MatchingContext::new(
        MatchingMode::Normal,
        None,
        cache,
        QuirksMode::NoQuirks,
        NeedsSelectorFlags::No,
        IgnoreNthChildForInvalidation::No,
    )
}

/// Serialize `value` as a CSS identifier so it re-parses to the same string.
pub fn escape_ident(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    if cssparser::serialize_identifier(value, &mut out).is_err() {
        out.clear();
        out.push_str(value);
    }
    out
}

/// An element node of a [`DomArena`], as seen by the selector matcher.
/// Live form state is not consulted; attribute selectors see the parsed
/// markup.
#[derive(Clone, Copy)]
struct ArenaElement<'a> {
    arena: &'a DomArena,
    id: NodeId,
    data: &'a ElementData,
}

impl<'a> ArenaElement<'a> {
    fn new(arena: &'a DomArena, id: NodeId) -> Option<Self> {
        arena
            .element(id)
            .map(|data| ArenaElement { arena, id, data })
    }
}

impl fmt::Debug for ArenaElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> {}", self.data.tag, self.id)
    }
}

impl<'a> Element for ArenaElement<'a> {
    type Impl = Simple;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.data)
    }

    fn parent_element(&self) -> Option<Self> {
        self.arena
            .parent_element(self.id)
            .and_then(|parent| ArenaElement::new(self.arena, parent))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.arena
            .prev_sibling_element(self.id)
            .and_then(|sibling| ArenaElement::new(self.arena, sibling))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.arena
            .next_sibling_element(self.id)
            .and_then(|sibling| ArenaElement::new(self.arena, sibling))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.arena
            .element_children(self.id)
            .next()
            .and_then(|child| ArenaElement::new(self.arena, child))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, local_name: &CssLocalName) -> bool {
        self.data.tag.as_str() == &*local_name.0
    }

    fn has_namespace(&self, ns: &Namespace) -> bool {
        &**ns == HTML_NAMESPACE
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.data.tag == other.data.tag
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&Namespace>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        if let NamespaceConstraint::Specific(url) = ns {
            if !url.is_empty() {
                return false;
            }
        }
        self.data
            .attrs
            .iter()
            .any(|(name, value)| name.as_str() == &*local_name.0 && operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        _pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Simple>,
    ) -> bool {
        false
    }

    fn match_pseudo_element(
        &self,
        _pe: &PseudoElement,
        _context: &mut MatchingContext<'_, Simple>,
    ) -> bool {
        false
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        matches!(self.data.tag.as_str(), "a" | "area" | "link") && self.data.has_attr("href")
    }

    fn is_html_slot_element(&self) -> bool {
        self.data.tag == "slot"
    }

    fn has_id(&self, id: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.data
            .id()
            .map_or(false, |own| case_sensitivity.eq(own.as_bytes(), id.0.as_bytes()))
    }

    fn has_class(&self, name: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.data
            .classes()
            .any(|class| case_sensitivity.eq(class.as_bytes(), name.0.as_bytes()))
    }

    fn imported_part(&self, _name: &CssLocalName) -> Option<CssLocalName> {
        None
    }

    fn is_part(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.arena.children(self.id).iter().all(|child| {
            self.arena.element(*child).is_none() && self.arena.text_content(*child).is_empty()
        })
    }

    fn is_root(&self) -> bool {
        self.arena
            .parent(self.id)
            .map_or(false, |parent| self.arena.element(parent).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> DomArena {
        DomArena::parse(
            r#"<html><body>
                <div id="main" class="content wide">
                  <ul class="menu"><li class="item first">A</li><li class="item">B</li><li>C</li></ul>
                  <a href="https://example.com/docs" lang="en-US">Docs</a>
                  <input type="text" data-role="Search Box">
                </div>
                <h2>Title</h2><p class="lead">first</p><p class="x">second</p><p class="y">third</p>
                <p class="note">outside</p>
            </body></html>"#,
        )
    }

    fn select(arena: &DomArena, selector: &str) -> Vec<NodeId> {
        SelectorList::parse(selector)
            .expect("selector parses")
            .select(arena, arena.root())
    }

    fn texts(arena: &DomArena, selector: &str) -> Vec<String> {
        select(arena, selector)
            .into_iter()
            .map(|id| arena.text_content(id))
            .collect()
    }

    #[test]
    fn matches_simple_and_compound_selectors() {
        let arena = arena();
        assert_eq!(select(&arena, "li").len(), 3);
        assert_eq!(select(&arena, "li.item").len(), 2);
        assert_eq!(select(&arena, "#main").len(), 1);
        assert_eq!(select(&arena, ".content.wide").len(), 1);
        assert_eq!(select(&arena, "*.note").len(), 1);
    }

    #[test]
    fn matches_combinators_and_lists() {
        let arena = arena();
        assert_eq!(select(&arena, "#main li").len(), 3);
        assert_eq!(select(&arena, "div > li").len(), 0);
        assert_eq!(select(&arena, "div > ul > li").len(), 3);
        assert_eq!(select(&arena, "p.note, ul.menu").len(), 2);
    }

    #[test]
    fn matches_sibling_combinators_and_nth_child() {
        let arena = arena();
        assert_eq!(texts(&arena, "li:nth-child(2)"), ["B"]);
        assert_eq!(texts(&arena, "h2 + p"), ["first"]);
        assert_eq!(texts(&arena, "h2 ~ p").len(), 4);
        assert_eq!(texts(&arena, "h2 ~ p:not(.x, .y, .note)"), ["first"]);
        assert_eq!(texts(&arena, "li:last-child"), ["C"]);
    }

    #[test]
    fn matches_relational_pseudo_classes() {
        let arena = arena();
        assert_eq!(select(&arena, "div:has(> a)").len(), 1);
        assert_eq!(select(&arena, "ul:has(> p)").len(), 0);
        assert_eq!(texts(&arena, "p:is(.x, .y)"), ["second", "third"]);
    }

    #[test]
    fn matches_attribute_operators() {
        let arena = arena();
        assert_eq!(select(&arena, "a[href]").len(), 1);
        assert_eq!(select(&arena, "a[href^='https://']").len(), 1);
        assert_eq!(select(&arena, "a[href$=\"/docs\"]").len(), 1);
        assert_eq!(select(&arena, "a[href*=example]").len(), 1);
        assert_eq!(select(&arena, "a[lang|=en]").len(), 1);
        assert_eq!(select(&arena, "li[class~=first]").len(), 1);
        assert_eq!(select(&arena, "input[data-role='search box' i]").len(), 1);
        assert_eq!(select(&arena, "input[data-role='search box']").len(), 0);
    }

    #[test]
    fn rejects_malformed_selectors() {
        assert!(SelectorList::parse("").is_err());
        assert!(SelectorList::parse("div[").is_err());
        assert!(SelectorList::parse("div >").is_err());
        assert!(SelectorList::parse("p::before").is_err());
        let err = SelectorList::parse("a:hover").unwrap_err();
        assert_eq!(err.selector, "a:hover");
    }

    #[test]
    fn escaped_identifiers_round_trip() {
        let arena = DomArena::parse(r#"<div id="1st:item">x</div>"#);
        let selector = format!("#{}", escape_ident("1st:item"));
        assert_eq!(select(&arena, &selector).len(), 1);
    }

    #[test]
    fn root_and_empty_follow_the_tree() {
        let arena = DomArena::parse("<html><body><p></p><p>text</p></body></html>");
        assert_eq!(select(&arena, ":root").len(), 1);
        assert_eq!(arena.tag(select(&arena, ":root")[0]), Some("html"));
        assert_eq!(select(&arena, "p:empty").len(), 1);
    }
}
