use crate::UrlError;
use url::Url;

/// Normalizes a URL according to the crawler's normalization rules
///
/// # Normalization Steps
///
/// 1. Resolve the string against `base` when one is given, otherwise parse it as absolute
/// 2. Reject anything that is not HTTP or HTTPS, or that has no host
/// 3. Normalize path:
///    - Remove dot segments (. and ..) and empty segments
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 4. Remove fragment (everything after #)
/// 5. Remove empty query string (trailing ?)
///
/// The host is lowercased by the `url` crate while parsing.
///
/// # Examples
///
/// ```
/// use site_corpus::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/docs/#intro", None).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// ```
pub fn normalize_url(raw: &str, base: Option<&Url>) -> Result<Url, UrlError> {
    let raw = raw.trim();

    let mut url = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    }
    .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingDomain),
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// Returns the canonical string key of a normalized URL
///
/// The key is the URL text without any trailing slash, so the site root
/// `https://example.com/` is keyed as `https://example.com`. Keys are what the
/// frontier deduplicates on and what job state and corpus records report.
///
/// ```
/// use site_corpus::url::{canonical_key, normalize_url};
///
/// let root = normalize_url("https://example.com/", None).unwrap();
/// assert_eq!(canonical_key(&root), "https://example.com");
/// ```
pub fn canonical_key(url: &Url) -> String {
    let text = url.as_str();
    if url.path() == "/" && url.query().is_none() && url.fragment().is_none() {
        text.trim_end_matches('/').to_string()
    } else {
        text.to_string()
    }
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Skip empty segments (from multiple slashes) and current directory markers
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}
