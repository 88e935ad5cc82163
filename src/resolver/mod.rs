//! Per-host translators from a share/landing page URL to a direct file URL.
//!
//! Resolvers are consulted only for candidate links that no registered site
//! handler claims. Each one is independent: it knows a single host, how to
//! find the real file behind that host's landing page, and what to call the
//! downloaded file.

mod dropbox;
mod mediafire;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::http::HttpClient;
use crate::parse::file_name_from_url;

pub use dropbox::DropboxResolver;
pub use mediafire::MediaFireResolver;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HostResolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Case-insensitive authority match. Malformed URLs are not a match.
    fn matches_url(&self, url: &str) -> bool;

    /// Turns a landing page URL into the URL that actually serves bytes.
    /// When the expected markup is missing the resolver fails with
    /// [`Error::SelectorNotFound`](crate::error::Error::SelectorNotFound)
    /// instead of guessing.
    async fn resolve_direct_url(&self, http: &HttpClient, page_url: &str) -> Result<String>;

    /// Destination file name for a resolved URL: the final path segment with
    /// any query string truncated.
    fn suggest_file_name(&self, url: &str) -> String {
        file_name_from_url(url)
    }
}

/// Ordered set of host resolvers, first match wins.
pub struct ResolverSet {
    resolvers: Vec<Arc<dyn HostResolver>>,
}

impl ResolverSet {
    pub fn new(resolvers: Vec<Arc<dyn HostResolver>>) -> Self {
        Self { resolvers }
    }

    /// The resolvers every deployment carries.
    pub fn default_set() -> Self {
        Self::new(vec![
            Arc::new(MediaFireResolver::new()),
            Arc::new(DropboxResolver::new()),
        ])
    }

    pub fn find(&self, url: &str) -> Option<Arc<dyn HostResolver>> {
        self.resolvers
            .iter()
            .find(|resolver| resolver.matches_url(url))
            .cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}
