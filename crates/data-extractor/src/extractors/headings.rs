use perceiver_structural::LiveDocument;

use super::generic;
use crate::model::HeadingsData;

pub fn extract(doc: &LiveDocument) -> Option<HeadingsData> {
    let headings = generic::headings(doc, doc.body());
    (!headings.is_empty()).then_some(HeadingsData { headings })
}
