//! MediaFire landing page resolver.

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use super::HostResolver;
use crate::error::{Error, Result};
use crate::http::HttpClient;

const DOWNLOAD_ANCHOR_SELECTOR: &str = "a#downloadButton";

/// Resolves `www.mediafire.com` share pages to the direct file URL behind
/// the download button.
pub struct MediaFireResolver {
    host: String,
}

impl MediaFireResolver {
    pub fn new() -> Self {
        Self::with_host("www.mediafire.com")
    }

    /// Points the resolver at a different authority, for tests against a
    /// local server.
    pub fn with_host(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl Default for MediaFireResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostResolver for MediaFireResolver {
    fn name(&self) -> &'static str {
        "MediaFire"
    }

    fn matches_url(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => parsed.authority().eq_ignore_ascii_case(&self.host),
            Err(_) => false,
        }
    }

    #[tracing::instrument(skip(self, http))]
    async fn resolve_direct_url(&self, http: &HttpClient, page_url: &str) -> Result<String> {
        let html = http.get_text(page_url).await?;
        extract_download_anchor(&html, page_url)
    }
}

/// Finds the download button anchor. A missing anchor means the site layout
/// changed and is a hard failure; no URL is ever guessed.
fn extract_download_anchor(html: &str, page_url: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(DOWNLOAD_ANCHOR_SELECTOR).expect("valid anchor selector");

    document
        .select(&selector)
        .next()
        .and_then(|anchor| anchor.value().attr("href"))
        .map(|href| href.to_string())
        .ok_or_else(|| Error::SelectorNotFound {
            url: page_url.to_string(),
            selector: DOWNLOAD_ANCHOR_SELECTOR.to_string(),
        })
}
