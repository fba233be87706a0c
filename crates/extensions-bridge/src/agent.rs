//! Tab-local agent: the acting context's side of the tab channel.

use async_trait::async_trait;
use data_extractor::{detect_login_required, extract, extract_search_results, DataRequest};
use perceiver_structural::SharedDocument;
use tracing::{debug, instrument};

use crate::messages::{TabReply, TabRequest};

/// Anything that can answer tab-local requests.
#[async_trait]
pub trait TabEndpoint: Send + Sync {
    async fn handle(&self, request: TabRequest) -> TabReply;
}

/// Serves extraction and login checks against one tab's live document.
pub struct TabAgent {
    document: SharedDocument,
}

impl TabAgent {
    pub fn new(document: SharedDocument) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn answer(&self, request: &TabRequest) -> TabReply {
        let doc = self.document.read();
        match request {
            TabRequest::ExtractData { data_type } => {
                let wanted = DataRequest::from_option(data_type.as_deref());
                match extract(&doc, &wanted) {
                    Ok(data) => TabReply::Data {
                        success: true,
                        data,
                        url: doc.url().to_string(),
                        title: doc.title(),
                    },
                    Err(err) => TabReply::failure(err),
                }
            }
            TabRequest::ExtractSearchResults => {
                let found = extract_search_results(&doc);
                TabReply::SearchResults {
                    success: true,
                    results: found.results,
                    debug: found.debug,
                }
            }
            TabRequest::CheckLoginRequired => TabReply::Login {
                success: true,
                check: detect_login_required(&doc),
            },
        }
    }
}

#[async_trait]
impl TabEndpoint for TabAgent {
    #[instrument(skip_all, fields(kind = request.kind()))]
    async fn handle(&self, request: TabRequest) -> TabReply {
        let reply = self.answer(&request);
        debug!(success = reply.is_success(), "tab request answered");
        reply
    }
}
