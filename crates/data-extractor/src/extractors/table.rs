use once_cell::sync::Lazy;
use perceiver_structural::{LiveDocument, NodeId, SelectorList};

use super::fixed;
use crate::cascade::Cascade;
use crate::model::{Table, TableData};

pub const KEPT_ROWS: usize = 20;
pub const MAX_TABLES: usize = 10;

static TABLES: Lazy<Cascade> =
    Lazy::new(|| Cascade::new("table", &["table", "[role=table]", "[role=grid]"]));

static ROW: Lazy<SelectorList> = Lazy::new(|| fixed("tr, [role=row]"));
static CELL: Lazy<SelectorList> =
    Lazy::new(|| fixed("td, th, [role=cell], [role=gridcell], [role=columnheader]"));
static HEADER_CELL: Lazy<SelectorList> = Lazy::new(|| fixed("th, [role=columnheader]"));
static CAPTION: Lazy<SelectorList> = Lazy::new(|| fixed("caption"));

pub fn extract(doc: &LiveDocument) -> Option<TableData> {
    let (_, nodes) = TABLES.first_match(doc, doc.body())?;
    let tables: Vec<Table> = nodes
        .into_iter()
        .take(MAX_TABLES)
        .map(|node| table_at(doc, node))
        .filter(|table| !table.headers.is_empty() || !table.rows.is_empty())
        .collect();
    (!tables.is_empty()).then_some(TableData { tables })
}

/// Headers come from the first row made only of header cells; every other
/// row is data.
pub fn table_at(doc: &LiveDocument, node: NodeId) -> Table {
    let mut headers = Vec::new();
    let mut rows = Vec::new();
    for row in doc.select_within(node, &ROW) {
        let cells: Vec<NodeId> = doc
            .arena()
            .element_children(row)
            .filter(|cell| doc.matches(*cell, &CELL))
            .collect();
        if cells.is_empty() {
            continue;
        }
        let texts: Vec<String> = cells.iter().map(|cell| doc.text(*cell)).collect();
        let header_row = cells.iter().all(|cell| doc.matches(*cell, &HEADER_CELL));
        if header_row && headers.is_empty() && rows.is_empty() {
            headers = texts;
        } else {
            rows.push(texts);
        }
    }
    let total_rows = rows.len();
    rows.truncate(KEPT_ROWS);
    Table {
        caption: doc
            .select_first_within(node, &CAPTION)
            .map(|caption| doc.text(caption))
            .filter(|caption| !caption.is_empty()),
        headers,
        rows,
        total_rows,
    }
}
