use url::Url;

/// Resolve `href` against the document URL. Only http(s) results are kept.
pub fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = match Url::parse(base) {
        Ok(base) => base.join(href).ok()?,
        Err(_) => Url::parse(href).ok()?,
    };
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Unwrap search-engine redirect links (`/url?q=...`, `/l/?uddg=...`,
/// `?url=...`) to their target.
pub fn unwrap_redirect(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let path = parsed.path();
    if !(path == "/url" || path == "/l/" || path == "/link" || path.starts_with("/ck/")) {
        return url.to_string();
    }
    parsed
        .query_pairs()
        .find(|(key, _)| matches!(key.as_ref(), "q" | "url" | "uddg" | "u"))
        .map(|(_, target)| target.into_owned())
        .filter(|target| target.starts_with("http://") || target.starts_with("https://"))
        .unwrap_or_else(|| url.to_string())
}

const CACHE_HOSTS: &[&str] = &["webcache.googleusercontent.com", "cc.bingj.com"];

/// Labels that mark a host as belonging to a search engine
/// (`www.google.co.uk`, `accounts.google.com`, `html.duckduckgo.com`).
const ENGINE_LABELS: &[&str] = &[
    "google",
    "bing",
    "duckduckgo",
    "yahoo",
    "yandex",
    "baidu",
    "ecosia",
    "startpage",
];

const CHROME_HOST_PREFIXES: &[&str] = &[
    "accounts.",
    "support.",
    "policies.",
    "myaccount.",
    "login.",
    "signin.",
    "maps.",
    "translate.",
];

const CHROME_PATHS: &[&str] = &[
    "/preferences",
    "/setprefs",
    "/imgres",
    "/advanced_search",
    "/webhp",
    "/intl/",
];

fn is_engine_host(host: &str) -> bool {
    host.split('.').any(|label| ENGINE_LABELS.contains(&label))
}

/// True for links that belong to the search engine's own navigation rather
/// than organic content. Path and host-prefix rules only apply to the results
/// page's own host and to known engine hosts.
pub fn is_internal_link(url: &str, page_url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return true;
    };
    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    if CACHE_HOSTS.contains(&host.as_str()) {
        return true;
    }
    let page_host = Url::parse(page_url)
        .ok()
        .and_then(|page| page.host_str().map(str::to_ascii_lowercase));
    let same_host = page_host.as_deref() == Some(host.as_str());
    if !same_host && !is_engine_host(&host) {
        return false;
    }

    let path = parsed.path().to_ascii_lowercase();
    if same_host && (path.starts_with("/search") || path == "/url" || path == "/") {
        return true;
    }
    if path.split('/').any(|segment| segment == "cache") {
        return true;
    }
    if CHROME_HOST_PREFIXES
        .iter()
        .any(|prefix| host.starts_with(prefix))
    {
        return true;
    }
    CHROME_PATHS.iter().any(|chrome| path.starts_with(chrome))
}
