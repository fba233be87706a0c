use std::collections::HashSet;

use once_cell::sync::Lazy;
use perceiver_structural::{LiveDocument, NodeId, SelectorList};
use tracing::debug;

use super::fixed;
use crate::cascade::Cascade;
use crate::model::{SearchDebug, SearchResult, SearchResults};
use crate::urls;

/// Label recorded in the debug block when no container selector matched.
pub const HEADING_SCAN: &str = "a h3 (heading scan)";

static CONTAINERS: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(
        "search.containers",
        &[
            "div.g",
            "div.MjjYud",
            "li.b_algo",
            r#"article[data-testid="result"]"#,
            "div.result",
            "div.search-result",
            "li.result",
            "[data-result]",
        ],
    )
});

static TITLE: Lazy<SelectorList> = Lazy::new(|| fixed("h3, h2, [role=heading]"));
static LINK: Lazy<SelectorList> = Lazy::new(|| fixed("a[href]"));
static SNIPPET: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(
        "search.snippet",
        &[
            "div.VwiC3b, [data-sncf]",
            ".b_caption p",
            ".result__snippet",
            ".snippet, .search-snippet, .st",
            "p",
        ],
    )
});
static HEADING: Lazy<SelectorList> = Lazy::new(|| fixed("h3"));

struct Candidate {
    title: String,
    href: Option<String>,
    snippet: String,
}

/// Organic results in page order. Engine navigation, cached copies and
/// account links are filtered, redirects unwrapped and duplicate URLs
/// dropped before ranks are assigned.
pub fn extract(doc: &LiveDocument) -> SearchResults {
    let body = doc.body();
    let mut debug_info = SearchDebug {
        url: doc.url().to_string(),
        ..SearchDebug::default()
    };

    let candidates: Vec<Candidate> = match CONTAINERS.first_match(doc, body) {
        Some((selector, containers)) => {
            debug_info.selector_used = Some(selector.to_string());
            let outermost = outermost(doc, &containers);
            debug_info.containers_seen = outermost.len();
            outermost
                .into_iter()
                .map(|container| from_container(doc, container))
                .collect()
        }
        None => {
            debug_info.selector_used = Some(HEADING_SCAN.to_string());
            let scanned = heading_scan(doc, body);
            debug_info.containers_seen = scanned.len();
            scanned
        }
    };

    let mut seen = HashSet::new();
    let mut results = Vec::new();
    for candidate in candidates {
        let Some(url) = candidate
            .href
            .as_deref()
            .and_then(|href| urls::absolutize(doc.url(), href))
            .map(|url| urls::unwrap_redirect(&url))
        else {
            debug_info.missing_link += 1;
            continue;
        };
        if urls::is_internal_link(&url, doc.url()) {
            debug_info.links_filtered += 1;
            continue;
        }
        if candidate.title.is_empty() {
            debug_info.missing_link += 1;
            continue;
        }
        if !seen.insert(url.clone()) {
            debug_info.duplicates_dropped += 1;
            continue;
        }
        results.push(SearchResult {
            rank: results.len() + 1,
            title: candidate.title,
            url,
            snippet: candidate.snippet,
        });
    }

    debug!(
        target: "extractor.events",
        selector = debug_info.selector_used.as_deref().unwrap_or_default(),
        containers = debug_info.containers_seen,
        filtered = debug_info.links_filtered,
        duplicates = debug_info.duplicates_dropped,
        results = results.len(),
        "extractor.search.completed"
    );
    SearchResults {
        results,
        debug: debug_info,
    }
}

/// Containers not nested inside another matched container.
fn outermost(doc: &LiveDocument, containers: &[NodeId]) -> Vec<NodeId> {
    let mut kept: Vec<NodeId> = Vec::with_capacity(containers.len());
    for container in containers {
        let nested = kept
            .iter()
            .any(|outer| doc.arena().is_inclusive_ancestor(*outer, *container));
        if !nested {
            kept.push(*container);
        }
    }
    kept
}

fn from_container(doc: &LiveDocument, container: NodeId) -> Candidate {
    let title_node = doc.select_first_within(container, &TITLE);
    let link = title_node
        .and_then(|title| enclosing_link(doc, title, container))
        .or_else(|| doc.select_first_within(container, &LINK));
    let title = title_node
        .map(|node| doc.text(node))
        .filter(|text| !text.is_empty())
        .or_else(|| link.map(|node| doc.text(node)))
        .unwrap_or_default();
    let snippet = SNIPPET
        .first_text(doc, container)
        .filter(|snippet| *snippet != title)
        .unwrap_or_default();
    Candidate {
        title,
        href: link.and_then(|node| doc.attr(node, "href")).map(str::to_string),
        snippet,
    }
}

fn enclosing_link(doc: &LiveDocument, node: NodeId, limit: NodeId) -> Option<NodeId> {
    doc.arena()
        .ancestors(node)
        .take_while(|ancestor| *ancestor != limit)
        .find(|ancestor| doc.matches(*ancestor, &LINK))
        .or_else(|| doc.select_first_within(node, &LINK))
}

/// Fallback for unknown layouts: every `h3` that sits inside a link.
fn heading_scan(doc: &LiveDocument, body: NodeId) -> Vec<Candidate> {
    doc.select_within(body, &HEADING)
        .into_iter()
        .filter_map(|heading| {
            let link = doc
                .arena()
                .ancestors(heading)
                .find(|ancestor| doc.matches(*ancestor, &LINK))?;
            Some(Candidate {
                title: doc.text(heading),
                href: doc.attr(link, "href").map(str::to_string),
                snippet: String::new(),
            })
        })
        .collect()
}
