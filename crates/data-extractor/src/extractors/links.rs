use std::collections::HashSet;

use once_cell::sync::Lazy;
use perceiver_structural::{LiveDocument, SelectorList};

use super::fixed;
use crate::model::{Link, LinksData};
use crate::urls;

static ANCHORS: Lazy<SelectorList> = Lazy::new(|| fixed("a[href], area[href]"));

/// Every http(s) link on the page, first occurrence of each URL wins.
pub fn extract(doc: &LiveDocument) -> Option<LinksData> {
    let mut seen = HashSet::new();
    let links: Vec<Link> = doc
        .select_within(doc.arena().root(), &ANCHORS)
        .into_iter()
        .filter_map(|node| {
            let url = urls::absolutize(doc.url(), doc.attr(node, "href")?)?;
            if !seen.insert(url.clone()) {
                return None;
            }
            let text = Some(doc.text(node))
                .filter(|text| !text.is_empty())
                .or_else(|| doc.attr(node, "aria-label").map(str::to_string))
                .or_else(|| doc.attr(node, "title").map(str::to_string))
                .unwrap_or_default();
            Some(Link { text, url })
        })
        .collect();
    (!links.is_empty()).then_some(LinksData { links })
}
