//! HTML metadata extraction for the generic scraping strategy.
//!
//! Deliberately regex based: only the OpenGraph title/description and the
//! `<title>` element are looked at.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ResolveError;

/// Upper bound on how much of a response body is inspected.
pub const MAX_BODY_BYTES: usize = 512 * 1024;

// The value is captured up to its own closing quote, so `"Don't"` survives.
static OG_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s+property=["']og:title["']\s+content=(?:"([^"]*)"|'([^']*)')"#)
        .unwrap()
});

static OG_DESCRIPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s+property=["']og:description["']\s+content=(?:"([^"]*)"|'([^']*)')"#)
        .unwrap()
});

static META_DESCRIPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s+name=["']description["']\s+content=(?:"([^"]*)"|'([^']*)')"#)
        .unwrap()
});

static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

/// Title and description pulled out of a page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
}

/// Extract title and description from an HTML document.
///
/// `og:title` wins over `<title>` and `og:description` over the plain
/// `description` meta tag. An empty title after both is an error.
pub fn extract_metadata(html: &str) -> Result<PageMetadata, ResolveError> {
    let title = first_capture(&OG_TITLE_RE, html)
        .filter(|t| !t.is_empty())
        .or_else(|| first_capture(&TITLE_RE, html))
        .unwrap_or_default();

    if title.is_empty() {
        return Err(ResolveError::NoTitle);
    }

    let description = first_capture(&OG_DESCRIPTION_RE, html)
        .filter(|d| !d.is_empty())
        .or_else(|| first_capture(&META_DESCRIPTION_RE, html))
        .unwrap_or_default();

    Ok(PageMetadata { title, description })
}

/// Decode the five common entities and trim surrounding whitespace.
///
/// `&amp;` is decoded last so `&amp;lt;` stays the literal text `&lt;`.
pub fn unescape_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn first_capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| clean_text(m.as_str()))
}

fn clean_text(raw: &str) -> String {
    unescape_entities(raw.trim()).trim().to_string()
}
