//! Single-page commands: build one document and look at it.

use anyhow::{anyhow, bail, Context, Result};
use data_extractor::{detect_login_required, extract, DataRequest};
use perceiver_structural::{DomStateEngine, ElementDescriptor, LiveDocument};
use tracing::debug;
use url::Url;
use window_orchestrator::PageSource;

use crate::cli::output::{emit, pretty, OutputFormat};
use crate::cli::SourceArgs;
use crate::config::Config;
use crate::page_source::HttpPageSource;

pub async fn load_document(source: &SourceArgs, config: &Config) -> Result<LiveDocument> {
    if let Some(path) = &source.file {
        let html = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let url = std::fs::canonicalize(path)
            .ok()
            .and_then(|absolute| Url::from_file_path(absolute).ok())
            .map(|url| url.to_string())
            .unwrap_or_else(|| "about:blank".to_string());
        debug!(%url, bytes = html.len(), "loaded local page");
        return Ok(LiveDocument::parse(url, &html));
    }
    let url = source
        .url
        .as_deref()
        .ok_or_else(|| anyhow!("either --file or --url is required"))?;
    let client = HttpPageSource::new(&config.http)?;
    let html = client
        .fetch(url)
        .await
        .ok_or_else(|| anyhow!("could not fetch {url}"))?;
    Ok(LiveDocument::parse(url, &html))
}

pub async fn cmd_extract(
    source: SourceArgs,
    data_type: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let document = load_document(&source, config).await?;
    let request = DataRequest::from_option(data_type.as_deref());
    let result = extract(&document, &request)?;
    emit(format, &result, pretty)
}

pub async fn cmd_elements(source: SourceArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let document = load_document(&source, config).await?;
    let engine = DomStateEngine::with_options(document.into_shared(), config.engine_options());
    let elements = engine.list_interactive_elements(None);
    emit(format, &elements, |elements| {
        elements.iter().map(element_line).collect::<Vec<_>>().join("\n")
    })
}

pub async fn cmd_resolve(
    source: SourceArgs,
    description: String,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let document = load_document(&source, config).await?;
    let engine = DomStateEngine::with_options(document.into_shared(), config.engine_options());
    let Some(resolution) = engine.resolve_detailed(&description).await else {
        bail!("no element matches `{description}`");
    };
    emit(format, &resolution, |resolution| {
        format!(
            "{}  ({} of {} candidates)",
            element_line(&resolution.descriptor),
            resolution.strategy.as_str(),
            resolution.candidate_count
        )
    })
}

pub async fn cmd_login_check(
    source: SourceArgs,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let document = load_document(&source, config).await?;
    let check = detect_login_required(&document);
    emit(format, &check, |check| {
        if check.login_required {
            let reason = check
                .reason
                .map(|reason| format!("{reason:?}"))
                .unwrap_or_default();
            format!("login required ({reason}) at {}", check.current_url)
        } else {
            format!("no login wall at {}", check.current_url)
        }
    })
}

fn element_line(element: &ElementDescriptor) -> String {
    let mut flags = Vec::new();
    if !element.state.is_visible {
        flags.push("hidden");
    }
    if element.state.is_disabled {
        flags.push("disabled");
    }
    if !element.state.is_in_viewport {
        flags.push("offscreen");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };
    format!(
        "{:<40} <{}> {}{}",
        element.selector, element.tag_name, element.text, flags
    )
}
