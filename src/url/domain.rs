use crate::{UrlError, UrlResult};
use url::Url;

/// File extensions that mark a link as a download rather than a page
const DOWNLOAD_EXTENSIONS: &[&str] = &[
    ".pdf", ".zip", ".rar", ".tar", ".gz", ".7z", ".exe", ".msi", ".dmg", ".pkg", ".deb",
    ".rpm", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".mp3", ".mp4", ".avi", ".mov",
    ".jpg", ".jpeg", ".png", ".gif",
];

/// Path words that mark a download area (singular or plural)
const DOWNLOAD_AREAS: &[&str] = &["download", "archive", "attachment", "file", "document"];

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_corpus::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the registrable domain of a host: the host with any leading `www.` removed
pub fn registrable_domain(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Scope containment for one crawl
///
/// A URL is in scope when its host is the seed's registrable domain or that
/// domain's `www.` form. Only an explicit port narrows the scope; a URL on its
/// scheme's default port matches on either http or https.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlScope {
    domain: String,
    port: Option<u16>,
}

impl CrawlScope {
    /// Builds the scope of a crawl seeded at `seed`
    pub fn for_seed(seed: &Url) -> UrlResult<Self> {
        let host = extract_domain(seed).ok_or(UrlError::MissingDomain)?;
        Ok(Self {
            domain: registrable_domain(&host).to_string(),
            port: seed.port(),
        })
    }

    /// The registrable domain this scope is bound to
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns true if `url` lives on this scope's site
    pub fn contains(&self, url: &Url) -> bool {
        let Some(host) = extract_domain(url) else {
            return false;
        };
        registrable_domain(&host) == self.domain && url.port() == self.port
    }

    /// Returns true if `url` is on this site and looks like a page worth fetching
    pub fn admits(&self, url: &Url) -> bool {
        self.contains(url) && !is_download_link(url)
    }
}

/// Returns true if the URL path points at a downloadable file or download area
///
/// ```
/// use url::Url;
/// use site_corpus::url::is_download_link;
///
/// assert!(is_download_link(&Url::parse("https://example.com/report.PDF").unwrap()));
/// assert!(is_download_link(&Url::parse("https://example.com/downloads/tool").unwrap()));
/// assert!(!is_download_link(&Url::parse("https://example.com/profile").unwrap()));
/// ```
pub fn is_download_link(url: &Url) -> bool {
    let path = url.path().to_lowercase();

    if DOWNLOAD_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return true;
    }

    path.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .any(|word| {
            let singular = word.strip_suffix('s').unwrap_or(word);
            DOWNLOAD_AREAS.contains(&word) || DOWNLOAD_AREAS.contains(&singular)
        })
}
