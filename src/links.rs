//! Link extraction: find document links in an HTML page.
//!
//! Every `<a href>` whose raw `href` ends with the target extension is
//! resolved against the base URL (RFC 3986 reference resolution, via
//! [`url::Url::join`]) and returned in document order. Duplicates are kept;
//! hrefs that fail to resolve are logged and skipped.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::fmt;
use tracing::{debug, warn};
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector is valid"));

/// An absolute URL pointing at a downloadable document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentLink {
    url: Url,
}

impl DocumentLink {
    /// Wrap an already-absolute URL.
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Destination filename: everything after the last `/` of the URL text.
    ///
    /// No percent-decoding and no query stripping; two URLs can map to the
    /// same name. Empty when the URL ends in `/`.
    pub fn file_name(&self) -> &str {
        let s = self.url.as_str();
        s.rsplit('/').next().unwrap_or(s)
    }
}

impl fmt::Display for DocumentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Extract every anchor whose href ends with `extension`, resolved against `base`.
pub fn extract_links(html: &str, base: &Url, extension: &str) -> Vec<DocumentLink> {
    let doc = Html::parse_document(html);

    let links: Vec<DocumentLink> = doc
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.ends_with(extension))
        .filter_map(|href| match base.join(href) {
            Ok(url) => Some(DocumentLink::new(url)),
            Err(e) => {
                warn!("Error parsing URL {}: {}", href, e);
                None
            }
        })
        .collect();

    debug!("Link extractor found {} '{}' links", links.len(), extension);
    links
}
