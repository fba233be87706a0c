use once_cell::sync::Lazy;
use perceiver_structural::{LiveDocument, NodeId, SelectorList};

use super::{fixed, list, table};
use crate::cascade::node_text;
use crate::model::{GenericContent, Heading, ListBlock, PageMetadata};
use crate::urls;

pub const HEADING_MAX_CHARS: usize = 300;
pub const MAX_TABLES: usize = 5;
pub const PARAGRAPH_MIN_CHARS: usize = 50;
pub const PARAGRAPH_MAX_CHARS: usize = 1000;
pub const MAX_PARAGRAPHS: usize = 20;

static HEADINGS: Lazy<SelectorList> = Lazy::new(|| fixed("h1, h2, h3, h4, h5, h6"));
static LISTS: Lazy<SelectorList> = Lazy::new(|| fixed("ul, ol"));
static TABLES: Lazy<SelectorList> = Lazy::new(|| fixed("table"));
static PARAGRAPHS: Lazy<SelectorList> = Lazy::new(|| fixed("p"));
static DESCRIPTION: Lazy<SelectorList> = Lazy::new(|| {
    fixed(r#"meta[name="description" i], meta[property="og:description"]"#)
});
static CANONICAL: Lazy<SelectorList> = Lazy::new(|| fixed(r#"link[rel="canonical" i]"#));
static HTML: Lazy<SelectorList> = Lazy::new(|| fixed("html"));

/// Everything broadly useful on the page. Reads only, so repeated calls on
/// an unchanged document return equal values.
pub fn extract(doc: &LiveDocument) -> GenericContent {
    let body = doc.body();
    GenericContent {
        headings: headings(doc, body),
        lists: lists(doc, body),
        tables: doc
            .select_within(body, &TABLES)
            .into_iter()
            .take(MAX_TABLES)
            .map(|node| table::table_at(doc, node))
            .collect(),
        main_text: main_text(doc, body),
        metadata: metadata(doc),
        fallback_from: None,
    }
}

pub fn headings(doc: &LiveDocument, scope: NodeId) -> Vec<Heading> {
    doc.select_within(scope, &HEADINGS)
        .into_iter()
        .filter_map(|node| {
            let level = doc.tag(node)?.strip_prefix('h')?.parse::<u8>().ok()?;
            let text = doc.text(node);
            let length = text.chars().count();
            (1..=HEADING_MAX_CHARS)
                .contains(&length)
                .then_some(Heading { level, text })
        })
        .collect()
}

pub fn lists(doc: &LiveDocument, scope: NodeId) -> Vec<ListBlock> {
    doc.select_within(scope, &LISTS)
        .into_iter()
        .filter_map(|node| list::list_at(doc, node))
        .collect()
}

fn main_text(doc: &LiveDocument, scope: NodeId) -> String {
    doc.select_within(scope, &PARAGRAPHS)
        .into_iter()
        .map(|node| doc.text(node))
        .filter(|text| {
            let length = text.chars().count();
            (PARAGRAPH_MIN_CHARS..=PARAGRAPH_MAX_CHARS).contains(&length)
        })
        .take(MAX_PARAGRAPHS)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn metadata(doc: &LiveDocument) -> PageMetadata {
    let root = doc.arena().root();
    let title = Some(doc.title()).filter(|title| !title.is_empty());
    let description = doc
        .select_within(root, &DESCRIPTION)
        .into_iter()
        .find_map(|node| node_text(doc, node));
    let canonical_url = doc
        .select_first_within(root, &CANONICAL)
        .and_then(|node| doc.attr(node, "href"))
        .and_then(|href| urls::absolutize(doc.url(), href));
    let language = doc
        .select_first_within(root, &HTML)
        .and_then(|node| doc.attr(node, "lang"))
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty());
    PageMetadata {
        url: doc.url().to_string(),
        title,
        description,
        canonical_url,
        language,
    }
}
