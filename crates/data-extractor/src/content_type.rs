use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ExtractError;

/// Closed set of extraction targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    SearchResults,
    Table,
    List,
    Article,
    Product,
    Headings,
    Links,
    Generic,
}

impl ContentType {
    pub const ALL: [ContentType; 8] = [
        ContentType::SearchResults,
        ContentType::Table,
        ContentType::List,
        ContentType::Article,
        ContentType::Product,
        ContentType::Headings,
        ContentType::Links,
        ContentType::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::SearchResults => "search-results",
            ContentType::Table => "table",
            ContentType::List => "list",
            ContentType::Article => "article",
            ContentType::Product => "product",
            ContentType::Headings => "headings",
            ContentType::Links => "links",
            ContentType::Generic => "generic",
        }
    }

    /// Exact names and aliases, then substring heuristics. A string that
    /// matches neither is an error rather than a silent generic extraction.
    pub fn classify(name: &str) -> Result<Self, ExtractError> {
        if let Ok(exact) = name.parse() {
            return Ok(exact);
        }
        let lower = name.trim().to_ascii_lowercase();
        HEURISTICS
            .iter()
            .find(|(needles, _)| needles.iter().any(|needle| lower.contains(needle)))
            .map(|(_, content_type)| *content_type)
            .ok_or_else(|| ExtractError::UnknownContentType(name.to_string()))
    }

    /// Infer the target from the page URL; anything unrecognised is generic.
    pub fn infer_from_url(url: &str) -> Self {
        let Ok(parsed) = Url::parse(url) else {
            return ContentType::Generic;
        };
        let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
        let path = parsed.path().to_ascii_lowercase();
        let host_path = format!("{host}{path}");
        let has_query = parsed
            .query_pairs()
            .any(|(key, _)| matches!(key.as_ref(), "q" | "query" | "wd" | "p" | "text"));
        let engine_results = SEARCH_HOST.is_match(&host)
            && (has_query || ["/search", "/html", "/s"].iter().any(|p| path.starts_with(p)));
        if engine_results || (has_query && path.contains("search")) {
            ContentType::SearchResults
        } else if PRODUCT_URL.is_match(&host_path) {
            ContentType::Product
        } else if ARTICLE_URL.is_match(&host_path) {
            ContentType::Article
        } else {
            ContentType::Generic
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ExtractError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        let content_type = match normalized.as_str() {
            "search-results" | "searchresults" | "search-result" | "search" | "serp" => {
                ContentType::SearchResults
            }
            "table" | "tables" => ContentType::Table,
            "list" | "lists" => ContentType::List,
            "article" | "articles" | "post" | "blog-post" => ContentType::Article,
            "product" | "products" | "product-info" => ContentType::Product,
            "headings" | "heading" | "headers" | "outline" => ContentType::Headings,
            "links" | "link" | "urls" | "hrefs" => ContentType::Links,
            "generic" | "auto" | "page" | "all" | "content" => ContentType::Generic,
            _ => return Err(ExtractError::UnknownContentType(value.to_string())),
        };
        Ok(content_type)
    }
}

const HEURISTICS: &[(&[&str], ContentType)] = &[
    (&["search", "result", "serp"], ContentType::SearchResults),
    (&["table", "grid", "spreadsheet", "tabular"], ContentType::Table),
    (&["list", "bullet", "enumerat"], ContentType::List),
    (
        &["article", "blog", "news", "story", "post", "essay"],
        ContentType::Article,
    ),
    (
        &["product", "price", "shop", "item", "listing-detail"],
        ContentType::Product,
    ),
    (&["heading", "header", "title", "outline"], ContentType::Headings),
    (&["link", "url", "href", "anchor"], ContentType::Links),
    (&["text", "content", "page", "everything"], ContentType::Generic),
];

static SEARCH_HOST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|\.)(google|bing|duckduckgo|yahoo|baidu|yandex|ecosia|startpage)\.")
        .expect("valid search host regex")
});

static PRODUCT_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(/dp/|/gp/product/|/product[s]?/|/item/|/itm/|/p/[a-z0-9-]+$)")
        .expect("valid product url regex")
});

static ARTICLE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(medium\.com/|wikipedia\.org/wiki/|/news/|/blog/|/article[s]?/|/posts?/|/\d{4}/\d{2}/)")
        .expect("valid article url regex")
});

/// What the caller asked for: a known type, a free-form name, or nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataRequest {
    Known(ContentType),
    Named(String),
    Unspecified,
}

impl DataRequest {
    pub fn from_option(name: Option<&str>) -> Self {
        match name.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => match name.parse() {
                Ok(known) => DataRequest::Known(known),
                Err(_) => DataRequest::Named(name.to_string()),
            },
            None => DataRequest::Unspecified,
        }
    }

    pub fn resolve(&self, url: &str) -> Result<ContentType, ExtractError> {
        match self {
            DataRequest::Known(content_type) => Ok(*content_type),
            DataRequest::Named(name) => ContentType::classify(name),
            DataRequest::Unspecified => Ok(ContentType::infer_from_url(url)),
        }
    }
}

impl From<ContentType> for DataRequest {
    fn from(value: ContentType) -> Self {
        DataRequest::Known(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_names_and_aliases_parse() {
        assert_eq!("search_results".parse::<ContentType>().unwrap(), ContentType::SearchResults);
        assert_eq!("Tables".parse::<ContentType>().unwrap(), ContentType::Table);
        assert_eq!("blog post".parse::<ContentType>().unwrap(), ContentType::Article);
        for content_type in ContentType::ALL {
            assert_eq!(content_type.as_str().parse::<ContentType>().unwrap(), content_type);
        }
    }

    #[test]
    fn heuristics_cover_free_form_names() {
        assert_eq!(ContentType::classify("organic results").unwrap(), ContentType::SearchResults);
        assert_eq!(ContentType::classify("pricing table").unwrap(), ContentType::Table);
        assert_eq!(ContentType::classify("product details").unwrap(), ContentType::Product);
        assert_eq!(ContentType::classify("all the links").unwrap(), ContentType::Links);
    }

    #[test]
    fn unmatched_names_are_hard_errors() {
        assert_eq!(
            ContentType::classify("weather forecast"),
            Err(ExtractError::UnknownContentType("weather forecast".into()))
        );
    }

    #[test]
    fn url_inference() {
        assert_eq!(
            ContentType::infer_from_url("https://www.google.com/search?q=rust"),
            ContentType::SearchResults
        );
        assert_eq!(
            ContentType::infer_from_url("https://www.bing.com/search?q=rust"),
            ContentType::SearchResults
        );
        assert_eq!(
            ContentType::infer_from_url("https://www.amazon.com/Widget/dp/B000123"),
            ContentType::Product
        );
        assert_eq!(
            ContentType::infer_from_url("https://en.wikipedia.org/wiki/Rust"),
            ContentType::Article
        );
        assert_eq!(
            ContentType::infer_from_url("https://example.com/about"),
            ContentType::Generic
        );
        assert_eq!(ContentType::infer_from_url("not a url"), ContentType::Generic);
    }

    #[test]
    fn requests_resolve_by_kind() {
        assert_eq!(
            DataRequest::from_option(Some("links")).resolve("https://a.test/").unwrap(),
            ContentType::Links
        );
        assert_eq!(
            DataRequest::from_option(None).resolve("https://duckduckgo.com/html?q=x").unwrap(),
            ContentType::SearchResults
        );
        assert!(DataRequest::from_option(Some("zzz")).resolve("https://a.test/").is_err());
    }
}
