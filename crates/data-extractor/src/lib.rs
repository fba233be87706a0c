//! Structured data extraction over a [`LiveDocument`].
//!
//! Extraction is a pure read of the document: every extractor walks an
//! ordered selector cascade and the first selector with a match wins.
//!
//! [`LiveDocument`]: perceiver_structural::LiveDocument

pub mod cascade;
pub mod content_type;
pub mod errors;
pub mod extract;
pub mod extractors;
pub mod login;
pub mod model;
pub mod urls;

pub use content_type::{ContentType, DataRequest};
pub use errors::ExtractError;
pub use extract::{extract, extract_as};
pub use login::{detect_login_required, LoginCheck, LoginSignal};
pub use model::{
    Article, ExtractionResult, GenericContent, Heading, HeadingsData, Link, LinksData, ListBlock,
    ListData, PageMetadata, Product, SearchDebug, SearchResult, SearchResults, Table, TableData,
};

/// Search results for the tab-local `EXTRACT_SEARCH_RESULTS` request. Unlike
/// [`extract`] this never falls back, so callers always see the debug block.
pub fn extract_search_results(doc: &perceiver_structural::LiveDocument) -> SearchResults {
    extractors::search::extract(doc)
}
