use crate::error::{HostError, Result};
use percent_encoding::percent_decode_str;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

const TITLE_SUFFIX: &str = " - Wikipedia";

// Relative targets are resolved against this when no page URL is known
const PLACEHOLDER_BASE: &str = "http://localhost/";

/// Pulls the article title out of a loaded page.
///
/// Prefers the `#firstHeading` element and falls back to `<title>` with the
/// site suffix removed.
pub fn extract_page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let heading_selector = Selector::parse("#firstHeading").ok()?;
    if let Some(heading) = document.select(&heading_selector).next() {
        let text = heading.text().collect::<String>();
        let text = text.trim();
        if !text.is_empty() {
            return Some(text.to_string());
        }
    }

    let title_selector = Selector::parse("title").ok()?;
    let title = document.select(&title_selector).next()?;
    let text = title.text().collect::<String>();
    let text = text.trim();
    let text = text.strip_suffix(TITLE_SUFFIX).unwrap_or(text).trim();
    if text.is_empty() {
        debug!("Page has neither a heading nor a title");
        None
    } else {
        Some(text.to_string())
    }
}

/// Resolves a link found on `page_url` to an absolute URL without fragment.
///
/// Returns `None` for links that never navigate to another page.
pub fn resolve_link(page_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let base_url = Url::parse(page_url).ok()?;
    let mut resolved = base_url.join(href).ok()?;
    resolved.set_fragment(None);

    Some(resolved.to_string())
}

/// Key a navigation is correlated under: path and query, without host or
/// fragment. The absolute and site-relative forms of one link share a key,
/// with or without an anchor.
pub fn navigation_key(url: &str) -> String {
    let url = url.trim();
    match parse_lenient(url) {
        Some(parsed) => match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        },
        None => url.split('#').next().unwrap_or(url).to_string(),
    }
}

/// Host name of an absolute URL.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

pub fn is_same_site(url: &str, base_domain: &str) -> bool {
    if let Ok(parsed) = Url::parse(url)
        && let Some(host) = parsed.host_str()
    {
        return host == base_domain || host.ends_with(&format!(".{}", base_domain));
    }
    false
}

/// True for links into the article namespace.
pub fn is_article_link(url: &str) -> bool {
    parse_lenient(url)
        .map(|u| u.path().contains("/wiki/"))
        .unwrap_or(false)
}

/// Best-effort title for a URL when the page itself is unavailable:
/// the last path segment, percent-decoded, with underscores as spaces.
pub fn title_from_url(url: &str) -> Result<String> {
    let parsed = parse_lenient(url).ok_or_else(|| HostError::InvalidUrl(url.to_string()))?;
    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .ok_or_else(|| HostError::InvalidUrl(format!("{} has no page path", url)))?;

    let decoded = percent_decode_str(segment)
        .decode_utf8()
        .map_err(|e| HostError::InvalidUrl(format!("{}: {}", url, e)))?;
    let title = decoded.replace('_', " ").trim().to_string();
    if title.is_empty() {
        return Err(HostError::InvalidUrl(format!("{} has no page path", url)));
    }
    Ok(title)
}

fn parse_lenient(url: &str) -> Option<Url> {
    match Url::parse(url) {
        Ok(parsed) => Some(parsed),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(PLACEHOLDER_BASE).ok()?.join(url).ok()
        }
        Err(_) => None,
    }
}
