use serde::{Deserialize, Serialize};

use crate::content_type::ContentType;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ExtractionResult {
    SearchResults(SearchResults),
    Table(TableData),
    List(ListData),
    Article(Article),
    Product(Product),
    Headings(HeadingsData),
    Links(LinksData),
    Generic(GenericContent),
}

impl ExtractionResult {
    pub fn content_type(&self) -> ContentType {
        match self {
            ExtractionResult::SearchResults(_) => ContentType::SearchResults,
            ExtractionResult::Table(_) => ContentType::Table,
            ExtractionResult::List(_) => ContentType::List,
            ExtractionResult::Article(_) => ContentType::Article,
            ExtractionResult::Product(_) => ContentType::Product,
            ExtractionResult::Headings(_) => ContentType::Headings,
            ExtractionResult::Links(_) => ContentType::Links,
            ExtractionResult::Generic(_) => ContentType::Generic,
        }
    }

    pub fn as_generic(&self) -> Option<&GenericContent> {
        match self {
            ExtractionResult::Generic(content) => Some(content),
            _ => None,
        }
    }

    pub fn as_search_results(&self) -> Option<&SearchResults> {
        match self {
            ExtractionResult::SearchResults(results) => Some(results),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub rank: usize,
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Diagnostics for one search-results extraction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDebug {
    pub url: String,
    pub selector_used: Option<String>,
    pub containers_seen: usize,
    pub links_filtered: usize,
    pub duplicates_dropped: usize,
    pub missing_link: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub results: Vec<SearchResult>,
    pub debug: SearchDebug,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Rows present before truncation.
    pub total_rows: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    pub tables: Vec<Table>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBlock {
    pub ordered: bool,
    pub items: Vec<String>,
    /// Items present before truncation.
    pub total_items: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListData {
    pub lists: Vec<ListBlock>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: Option<String>,
    pub byline: Option<String>,
    pub published: Option<String>,
    pub paragraphs: Vec<String>,
    pub content: String,
    pub word_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: Option<String>,
    pub price: Option<String>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub rating: Option<String>,
    pub availability: Option<String>,
    pub images: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingsData {
    pub headings: Vec<Heading>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinksData {
    pub links: Vec<Link>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub canonical_url: Option<String>,
    pub language: Option<String>,
}

/// Universal fallback: everything broadly useful on a page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericContent {
    pub headings: Vec<Heading>,
    pub lists: Vec<ListBlock>,
    pub tables: Vec<Table>,
    pub main_text: String,
    pub metadata: PageMetadata,
    /// Set when this content replaces an empty specific extraction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_from: Option<ContentType>,
}
