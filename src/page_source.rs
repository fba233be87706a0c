//! Page sources for the in-memory browser: live HTTP, or a fixture
//! directory described by a `pages.yaml` manifest.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, warn};
use window_orchestrator::{PageSource, StaticPages};

use crate::config::HttpSection;
use crate::errors::PagePilotError;

pub struct HttpPageSource {
    client: reqwest::Client,
}

impl HttpPageSource {
    pub fn new(http: &HttpSection) -> Result<Self, PagePilotError> {
        let client = reqwest::Client::builder()
            .user_agent(http.user_agent.clone())
            .timeout(http.timeout)
            .build()
            .map_err(|err| PagePilotError::source_error(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(url, error = %err, "page request failed");
                return None;
            }
        };
        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "page request returned an error status");
            return None;
        }
        match response.text().await {
            Ok(body) => {
                debug!(url, bytes = body.len(), "page fetched");
                Some(body)
            }
            Err(err) => {
                warn!(url, error = %err, "page body could not be read");
                None
            }
        }
    }
}

/// Load `dir/pages.yaml`, a map from URL to an HTML file relative to `dir`.
pub async fn load_fixture_pages(dir: &Path) -> Result<StaticPages, PagePilotError> {
    let manifest_path = dir.join("pages.yaml");
    let manifest = tokio::fs::read_to_string(&manifest_path).await.map_err(|err| {
        PagePilotError::source_error(format!("failed to read {}: {err}", manifest_path.display()))
    })?;
    let entries: BTreeMap<String, String> = serde_yaml::from_str(&manifest)
        .map_err(|err| PagePilotError::source_error(format!("invalid pages.yaml: {err}")))?;

    let mut pages = StaticPages::new();
    for (url, file) in entries {
        let html = tokio::fs::read_to_string(dir.join(&file)).await.map_err(|err| {
            PagePilotError::source_error(format!("failed to read fixture {file}: {err}"))
        })?;
        pages.insert(url, html);
    }
    Ok(pages)
}
