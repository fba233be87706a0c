//! One extractor per content type. Specific extractors return `None` when
//! the page yields nothing for them; the caller then falls back to
//! [`generic`].

pub mod article;
pub mod generic;
pub mod headings;
pub mod links;
pub mod list;
pub mod product;
pub mod search;
pub mod table;

use perceiver_structural::SelectorList;

/// Parse a selector that is known at compile time.
pub(crate) fn fixed(source: &str) -> SelectorList {
    SelectorList::parse(source).expect("valid built-in selector")
}
