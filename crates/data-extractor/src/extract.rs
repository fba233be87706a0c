use perceiver_structural::LiveDocument;
use tracing::{debug, info, instrument};

use crate::content_type::{ContentType, DataRequest};
use crate::errors::ExtractError;
use crate::extractors::{article, generic, headings, links, list, product, search, table};
use crate::model::ExtractionResult;

/// Extract structured data of the requested kind from `doc`.
///
/// An unrecognised content-type name is an error. A recognised type that
/// finds nothing on the page degrades to generic content tagged with the
/// type that came back empty.
#[instrument(skip_all, fields(url = %doc.url()))]
pub fn extract(doc: &LiveDocument, request: &DataRequest) -> Result<ExtractionResult, ExtractError> {
    let content_type = request.resolve(doc.url())?;
    debug!(content_type = %content_type, "content type resolved");
    Ok(extract_as(doc, content_type))
}

pub fn extract_as(doc: &LiveDocument, content_type: ContentType) -> ExtractionResult {
    let specific = match content_type {
        ContentType::SearchResults => Some(search::extract(doc))
            .filter(|found| !found.results.is_empty())
            .map(ExtractionResult::SearchResults),
        ContentType::Table => table::extract(doc).map(ExtractionResult::Table),
        ContentType::List => list::extract(doc).map(ExtractionResult::List),
        ContentType::Article => article::extract(doc).map(ExtractionResult::Article),
        ContentType::Product => product::extract(doc).map(ExtractionResult::Product),
        ContentType::Headings => headings::extract(doc).map(ExtractionResult::Headings),
        ContentType::Links => links::extract(doc).map(ExtractionResult::Links),
        ContentType::Generic => return ExtractionResult::Generic(generic::extract(doc)),
    };
    specific.unwrap_or_else(|| {
        info!(
            content_type = %content_type,
            url = doc.url(),
            "specific extraction empty; using generic content"
        );
        let mut content = generic::extract(doc);
        content.fallback_from = Some(content_type);
        ExtractionResult::Generic(content)
    })
}
