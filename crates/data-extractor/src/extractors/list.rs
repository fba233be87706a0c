use once_cell::sync::Lazy;
use perceiver_structural::{LiveDocument, NodeId, SelectorList};

use super::fixed;
use crate::cascade::Cascade;
use crate::model::{ListBlock, ListData};

pub const MAX_LIST_ITEMS: usize = 100;
pub const KEPT_ITEMS: usize = 20;

static LISTS: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(
        "list",
        &[
            "main ul, main ol",
            "article ul, article ol",
            "[role=main] ul, [role=main] ol",
            "ul, ol",
            "[role=list]",
        ],
    )
});

static ITEM: Lazy<SelectorList> = Lazy::new(|| fixed("li, [role=listitem]"));

pub fn extract(doc: &LiveDocument) -> Option<ListData> {
    let (_, nodes) = LISTS.first_match(doc, doc.body())?;
    let lists: Vec<ListBlock> = nodes
        .into_iter()
        .filter_map(|node| list_at(doc, node))
        .collect();
    (!lists.is_empty()).then_some(ListData { lists })
}

/// Direct items of one list. Lists with no items or more than
/// [`MAX_LIST_ITEMS`] are skipped; kept lists are cut to [`KEPT_ITEMS`].
pub fn list_at(doc: &LiveDocument, node: NodeId) -> Option<ListBlock> {
    let items: Vec<String> = doc
        .arena()
        .element_children(node)
        .filter(|child| doc.matches(*child, &ITEM))
        .map(|child| doc.text(child))
        .filter(|text| !text.is_empty())
        .collect();
    if items.is_empty() || items.len() > MAX_LIST_ITEMS {
        return None;
    }
    let total_items = items.len();
    Some(ListBlock {
        ordered: doc.tag(node) == Some("ol"),
        items: items.into_iter().take(KEPT_ITEMS).collect(),
        total_items,
    })
}
